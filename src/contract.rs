//! Collaborator contracts consumed by runners and the registry.
//!
//! Persistence, rendering and host messaging are all reached through the traits
//! and channel types in this module; nothing here knows about files or terminals.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::error::BoxError;
use crate::types::{ConversationEvent, ConversationId, ConversationSummary};

/// Live view of one persisted conversation.
pub trait Conversation: Send + Sync {
    fn id(&self) -> &ConversationId;

    /// Returns the ordered event history as of this call.
    fn events(&self) -> Vec<ConversationEvent>;

    /// Persists `event` and makes it visible to later [`Conversation::events`] calls.
    fn append(&self, event: ConversationEvent) -> Result<(), BoxError>;
}

/// Shared handle to a loaded conversation.
pub type ConversationHandle = Arc<dyn Conversation>;

/// Persistent conversation storage.
pub trait ConversationStore: Send + Sync {
    /// Returns at most `limit` summaries, most recent first.
    fn list(&self, limit: usize) -> Result<Vec<ConversationSummary>, BoxError>;

    fn load(&self, id: &ConversationId) -> Result<ConversationHandle, BoxError>;

    fn create(&self, id: &ConversationId) -> Result<ConversationHandle, BoxError>;
}

/// Observer that rebuilds its display from a conversation's backlog.
pub trait Visualizer: Send + Sync {
    /// Receives the entire ordered backlog in a single call.
    fn replay_events(&self, events: &[ConversationEvent]) -> Result<(), BoxError>;
}

/// Mutable session state shared between the host and every runner.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub active_conversation: Option<ConversationId>,
    pub replayed_events: usize,
}

pub type SharedState = Arc<Mutex<SessionState>>;

/// Message posted from a runner to the host loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerMessage {
    HistoryReplayed {
        conversation_id: ConversationId,
        count: usize,
    },
    EventAppended {
        conversation_id: ConversationId,
        event: ConversationEvent,
    },
}

/// Inbound channel of the host loop.
pub type MessagePump = Sender<RunnerMessage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

/// User-facing notification raised by a runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }
}

pub type NotificationCallback = Arc<dyn Fn(Notification) + Send + Sync>;
