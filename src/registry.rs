use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info};

use crate::contract::{MessagePump, NotificationCallback, SharedState};
use crate::error::{BoxError, SessionError};
use crate::types::ConversationId;
use crate::{lock_unpoisoned, read_unpoisoned, write_unpoisoned};

/// Runner-side half of the registry contract.
pub trait ReplayHistory: Send + Sync + 'static {
    fn conversation_id(&self) -> &ConversationId;

    /// Replays the conversation backlog; returns the number of events delivered.
    fn replay_historical_events(&self) -> Result<usize, SessionError>;
}

/// Builds a fresh runner bound to one conversation.
pub trait RunnerFactory: Send + Sync {
    type Runner: ReplayHistory;

    fn create(
        &self,
        id: &ConversationId,
        state: SharedState,
        message_pump: MessagePump,
        notifications: NotificationCallback,
    ) -> Result<Self::Runner, BoxError>;
}

/// Process-lifetime map from conversation id to its single runner.
///
/// [`RunnerRegistry::get_or_create`] is the only way runners come into existence.
/// Creation is serialized per conversation id: factory call, insertion and history
/// replay for one id all happen while holding that id's creation slot, so racing
/// callers for the same id observe one construction and one replay. Different ids
/// never wait on each other, and a visualizer may create runners for other ids
/// while it is replaying. It must not call `get_or_create` for the id it is
/// replaying; that call waits on the slot its own thread holds.
///
/// Lookups through [`RunnerRegistry::get`] take no slot and see a runner as soon
/// as it is inserted, including while its replay is still in progress.
///
/// Entries are never evicted.
pub struct RunnerRegistry<F: RunnerFactory> {
    factory: F,
    state: SharedState,
    message_pump: MessagePump,
    notifications: NotificationCallback,
    runners: RwLock<HashMap<ConversationId, Arc<F::Runner>>>,
    creating: Mutex<HashMap<ConversationId, CreationSlot>>,
}

/// Held by whichever caller is currently building a runner for one id.
type CreationSlot = Arc<Mutex<()>>;

impl<F: RunnerFactory> RunnerRegistry<F> {
    pub fn new(
        factory: F,
        state: SharedState,
        message_pump: MessagePump,
        notifications: NotificationCallback,
    ) -> Self {
        Self {
            factory,
            state,
            message_pump,
            notifications,
            runners: RwLock::new(HashMap::new()),
            creating: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the runner for `id`, creating and replaying it on first use.
    ///
    /// Every call for the same id returns the same `Arc`. On first use the
    /// factory is invoked, the runner is inserted, and then its history is
    /// replayed before this call returns. Callers arriving while that happens
    /// wait until the replay is over.
    ///
    /// A factory failure leaves no runner behind; the next caller retries the
    /// factory. A replay failure is returned to the caller, but the runner stays
    /// registered and is never replayed again.
    pub fn get_or_create(&self, id: &ConversationId) -> Result<Arc<F::Runner>, SessionError> {
        let slot = {
            let mut creating = lock_unpoisoned(&self.creating);
            match creating.get(id) {
                Some(slot) => Arc::clone(slot),
                None => {
                    if let Some(runner) = self.get(id) {
                        return Ok(runner);
                    }
                    let slot = CreationSlot::default();
                    creating.insert(id.clone(), Arc::clone(&slot));
                    slot
                }
            }
        };

        let _slot = lock_unpoisoned(&slot);
        if let Some(runner) = self.get(id) {
            debug!(conversation_id = %id, "runner created by concurrent caller");
            return Ok(runner);
        }

        let runner = self
            .factory
            .create(
                id,
                Arc::clone(&self.state),
                self.message_pump.clone(),
                Arc::clone(&self.notifications),
            )
            .map(Arc::new)
            .map_err(|source| SessionError::construction(id, source))?;

        write_unpoisoned(&self.runners).insert(id.clone(), Arc::clone(&runner));
        info!(conversation_id = %id, "runner created");

        let replayed = runner.replay_historical_events();
        lock_unpoisoned(&self.creating).remove(id);
        replayed?;

        Ok(runner)
    }

    /// Returns the registered runner for `id` without creating one.
    #[must_use]
    pub fn get(&self, id: &ConversationId) -> Option<Arc<F::Runner>> {
        read_unpoisoned(&self.runners).get(id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &ConversationId) -> bool {
        read_unpoisoned(&self.runners).contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        read_unpoisoned(&self.runners).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn state(&self) -> &SharedState {
        &self.state
    }
}
