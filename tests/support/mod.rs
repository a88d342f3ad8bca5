#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use session_runner::{
    lock_unpoisoned, BoxError, Conversation, ConversationEvent, ConversationHandle,
    ConversationId, ConversationStore, ConversationSummary, RunnerMessage, RunnerRegistry,
    SessionState, StoreRunnerFactory, Visualizer,
};
use time::{Duration as TimeDuration, OffsetDateTime};

pub struct MemoryConversation {
    id: ConversationId,
    created_at: OffsetDateTime,
    events: Mutex<Vec<ConversationEvent>>,
}

impl MemoryConversation {
    pub fn push(&self, event: ConversationEvent) {
        lock_unpoisoned(&self.events).push(event);
    }
}

impl Conversation for MemoryConversation {
    fn id(&self) -> &ConversationId {
        &self.id
    }

    fn events(&self) -> Vec<ConversationEvent> {
        lock_unpoisoned(&self.events).clone()
    }

    fn append(&self, event: ConversationEvent) -> Result<(), BoxError> {
        self.push(event);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    conversations: Mutex<Vec<Arc<MemoryConversation>>>,
    pub list_calls: AtomicUsize,
    pub list_limits: Mutex<Vec<usize>>,
    pub load_calls: AtomicUsize,
}

impl MemoryStore {
    /// Adds a conversation created `created_secs` after the epoch.
    pub fn insert(
        &self,
        id: &str,
        created_secs: i64,
        events: Vec<ConversationEvent>,
    ) -> Arc<MemoryConversation> {
        let conversation = Arc::new(MemoryConversation {
            id: ConversationId::parse(id).expect("fixture id should be valid"),
            created_at: OffsetDateTime::UNIX_EPOCH + TimeDuration::seconds(created_secs),
            events: Mutex::new(events),
        });
        lock_unpoisoned(&self.conversations).push(Arc::clone(&conversation));
        conversation
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }
}

impl ConversationStore for MemoryStore {
    fn list(&self, limit: usize) -> Result<Vec<ConversationSummary>, BoxError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        lock_unpoisoned(&self.list_limits).push(limit);

        let mut summaries = lock_unpoisoned(&self.conversations)
            .iter()
            .map(|conversation| ConversationSummary {
                id: conversation.id.clone(),
                created_at: conversation.created_at,
            })
            .collect::<Vec<_>>();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries.truncate(limit);
        Ok(summaries)
    }

    fn load(&self, id: &ConversationId) -> Result<ConversationHandle, BoxError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);

        let conversation = lock_unpoisoned(&self.conversations)
            .iter()
            .find(|conversation| &conversation.id == id)
            .cloned()
            .ok_or_else(|| format!("conversation {id} not found"))?;
        Ok(conversation)
    }

    fn create(&self, id: &ConversationId) -> Result<ConversationHandle, BoxError> {
        Ok(self.insert(id.as_str(), 0, Vec::new()))
    }
}

/// Store whose listing always fails.
pub struct BrokenStore;

impl ConversationStore for BrokenStore {
    fn list(&self, _limit: usize) -> Result<Vec<ConversationSummary>, BoxError> {
        Err("store offline".into())
    }

    fn load(&self, _id: &ConversationId) -> Result<ConversationHandle, BoxError> {
        Err("store offline".into())
    }

    fn create(&self, _id: &ConversationId) -> Result<ConversationHandle, BoxError> {
        Err("store offline".into())
    }
}

#[derive(Default)]
pub struct RecordingVisualizer {
    pub calls: Mutex<Vec<Vec<ConversationEvent>>>,
    pub delay: Option<Duration>,
}

impl RecordingVisualizer {
    pub fn slow(delay: Duration) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            delay: Some(delay),
        }
    }

    pub fn call_count(&self) -> usize {
        lock_unpoisoned(&self.calls).len()
    }
}

impl Visualizer for RecordingVisualizer {
    fn replay_events(&self, events: &[ConversationEvent]) -> Result<(), BoxError> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        lock_unpoisoned(&self.calls).push(events.to_vec());
        Ok(())
    }
}

pub type StoreRegistry = RunnerRegistry<StoreRunnerFactory<MemoryStore>>;

pub fn store_registry(
    store: &Arc<MemoryStore>,
    visualizer: Arc<dyn Visualizer>,
) -> (StoreRegistry, mpsc::Receiver<RunnerMessage>) {
    let (sender, receiver) = mpsc::channel();
    let registry = RunnerRegistry::new(
        StoreRunnerFactory::new(Arc::clone(store), visualizer),
        Arc::new(Mutex::new(SessionState::default())),
        sender,
        Arc::new(|_| {}),
    );
    (registry, receiver)
}

pub fn history(texts: &[&str]) -> Vec<ConversationEvent> {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| {
            if index % 2 == 0 {
                ConversationEvent::user_text(*text)
            } else {
                ConversationEvent::assistant_text(*text)
            }
        })
        .collect()
}
