use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::contract::{
    ConversationHandle, MessagePump, Notification, NotificationCallback, RunnerMessage, Severity,
    SharedState, Visualizer,
};
use crate::error::SessionError;
use crate::lock_unpoisoned;
use crate::registry::ReplayHistory;
use crate::types::{ConversationEvent, ConversationId};

/// Replay progress of a runner. `NotReplayed -> Replayed` happens once and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    NotReplayed,
    Replayed,
}

/// Live session bound to one conversation.
///
/// Runners are created by a [`crate::RunnerFactory`] and handed out as `Arc`s by
/// [`crate::RunnerRegistry`]; all methods take `&self`.
pub struct ConversationRunner {
    conversation_id: ConversationId,
    conversation: ConversationHandle,
    visualizer: Arc<dyn Visualizer>,
    state: SharedState,
    message_pump: MessagePump,
    notifications: NotificationCallback,
    replay: Mutex<ReplayState>,
}

impl ConversationRunner {
    pub fn new(
        conversation_id: ConversationId,
        conversation: ConversationHandle,
        visualizer: Arc<dyn Visualizer>,
        state: SharedState,
        message_pump: MessagePump,
        notifications: NotificationCallback,
    ) -> Self {
        Self {
            conversation_id,
            conversation,
            visualizer,
            state,
            message_pump,
            notifications,
            replay: Mutex::new(ReplayState::NotReplayed),
        }
    }

    #[must_use]
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    #[must_use]
    pub fn conversation(&self) -> &ConversationHandle {
        &self.conversation
    }

    #[must_use]
    pub fn replay_state(&self) -> ReplayState {
        *lock_unpoisoned(&self.replay)
    }

    /// Delivers the conversation backlog to the visualizer, once.
    ///
    /// The first call reads the history as it is at call time and hands the whole
    /// ordered sequence to [`Visualizer::replay_events`] in one call; an empty
    /// history skips the visualizer. Every later call returns `0` without touching
    /// the visualizer, even when the conversation has grown since.
    ///
    /// The state flips to [`ReplayState::Replayed`] before delivery, so a failed
    /// delivery is reported as [`SessionError::ReplayFailed`] and never retried.
    /// The visualizer must not call back into this method.
    pub fn replay_historical_events(&self) -> Result<usize, SessionError> {
        let mut replay = lock_unpoisoned(&self.replay);
        if *replay == ReplayState::Replayed {
            debug!(conversation_id = %self.conversation_id, "history already replayed");
            return Ok(0);
        }
        *replay = ReplayState::Replayed;

        let events = self.conversation.events();
        if events.is_empty() {
            debug!(conversation_id = %self.conversation_id, "no history to replay");
            return Ok(0);
        }

        self.visualizer
            .replay_events(&events)
            .map_err(|source| SessionError::replay(&self.conversation_id, source))?;

        let count = events.len();
        lock_unpoisoned(&self.state).replayed_events += count;
        self.post(RunnerMessage::HistoryReplayed {
            conversation_id: self.conversation_id.clone(),
            count,
        });
        info!(conversation_id = %self.conversation_id, count, "replayed conversation history");

        Ok(count)
    }

    /// Appends a user message to the conversation and announces it to the host.
    pub fn submit_user_text(&self, text: impl Into<String>) -> Result<(), SessionError> {
        let event = ConversationEvent::user_text(text);

        if let Err(source) = self.conversation.append(event.clone()) {
            let error = SessionError::append(&self.conversation_id, source);
            (self.notifications)(Notification::new(
                "Message not saved",
                error.to_string(),
                Severity::Error,
            ));
            return Err(error);
        }

        self.post(RunnerMessage::EventAppended {
            conversation_id: self.conversation_id.clone(),
            event,
        });
        Ok(())
    }

    fn post(&self, message: RunnerMessage) {
        if self.message_pump.send(message).is_err() {
            warn!(
                conversation_id = %self.conversation_id,
                "message pump disconnected; dropping runner message"
            );
        }
    }
}

impl ReplayHistory for ConversationRunner {
    fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    fn replay_historical_events(&self) -> Result<usize, SessionError> {
        ConversationRunner::replay_historical_events(self)
    }
}
