use std::sync::Arc;

use tracing::debug;

use crate::contract::{
    ConversationStore, MessagePump, NotificationCallback, SharedState, Visualizer,
};
use crate::error::BoxError;
use crate::registry::RunnerFactory;
use crate::runner::ConversationRunner;
use crate::types::ConversationId;

/// Builds [`ConversationRunner`]s over conversations loaded from a store.
pub struct StoreRunnerFactory<S: ConversationStore + ?Sized> {
    store: Arc<S>,
    visualizer: Arc<dyn Visualizer>,
}

impl<S: ConversationStore + ?Sized> StoreRunnerFactory<S> {
    pub fn new(store: Arc<S>, visualizer: Arc<dyn Visualizer>) -> Self {
        Self { store, visualizer }
    }
}

impl<S: ConversationStore + ?Sized> RunnerFactory for StoreRunnerFactory<S> {
    type Runner = ConversationRunner;

    fn create(
        &self,
        id: &ConversationId,
        state: SharedState,
        message_pump: MessagePump,
        notifications: NotificationCallback,
    ) -> Result<ConversationRunner, BoxError> {
        let conversation = self.store.load(id)?;
        debug!(conversation_id = %id, "loaded conversation for runner");

        Ok(ConversationRunner::new(
            id.clone(),
            conversation,
            Arc::clone(&self.visualizer),
            state,
            message_pump,
            notifications,
        ))
    }
}
