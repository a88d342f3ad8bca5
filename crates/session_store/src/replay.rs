use session_runner::ConversationEvent;

use crate::store::SessionStore;

impl SessionStore {
    /// Returns the stored events in file order.
    #[must_use]
    pub fn replay_events(&self) -> Vec<ConversationEvent> {
        self.entries
            .iter()
            .map(|entry| entry.event.clone())
            .collect()
    }
}
