use std::sync::Arc;

use crate::error::SessionError;
use crate::lock_unpoisoned;
use crate::registry::{RunnerFactory, RunnerRegistry};
use crate::types::ConversationId;

/// Host-facing entry point that owns the registry and tracks the active conversation.
pub struct ConversationManager<F: RunnerFactory> {
    runners: RunnerRegistry<F>,
}

impl<F: RunnerFactory> ConversationManager<F> {
    pub fn new(runners: RunnerRegistry<F>) -> Self {
        Self { runners }
    }

    /// Makes sure a runner exists for `id`. Safe to call repeatedly.
    pub fn ensure_runner(&self, id: &ConversationId) -> Result<Arc<F::Runner>, SessionError> {
        self.runners.get_or_create(id)
    }

    /// Ensures the runner for `id` and marks it as the active conversation.
    pub fn attach(&self, id: &ConversationId) -> Result<Arc<F::Runner>, SessionError> {
        let runner = self.ensure_runner(id)?;
        lock_unpoisoned(self.runners.state()).active_conversation = Some(id.clone());
        Ok(runner)
    }

    #[must_use]
    pub fn active_conversation(&self) -> Option<ConversationId> {
        lock_unpoisoned(self.runners.state())
            .active_conversation
            .clone()
    }

    #[must_use]
    pub fn runners(&self) -> &RunnerRegistry<F> {
        &self.runners
    }
}
