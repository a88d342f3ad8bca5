//! Resume-argument resolution.
//!
//! A session may attach to a previous conversation either by explicit id or by the
//! case-insensitive shorthand `last`, which is interchangeable with the boolean
//! "most recent" flag. [`ResumeRequest::decision`] normalizes the raw arguments
//! without side effects; [`ResumeResolver::resolve`] additionally settles
//! [`ResumeDecision::ResumeLast`] against the store.

use tracing::{info, warn};

use crate::contract::ConversationStore;
use crate::error::SessionError;
use crate::types::ConversationId;

/// Literal resume token that stands for "most recent conversation".
pub const LAST_TOKEN: &str = "last";

/// Raw resume arguments as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeRequest {
    pub token: Option<String>,
    pub last: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeDecision {
    NewConversation,
    ResumeById(ConversationId),
    ResumeLast,
}

impl ResumeDecision {
    #[must_use]
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        match self {
            Self::ResumeById(id) => Some(id),
            Self::NewConversation | Self::ResumeLast => None,
        }
    }
}

impl ResumeRequest {
    #[must_use]
    pub fn new(token: Option<String>, last: bool) -> Self {
        Self { token, last }
    }

    /// Returns true when the request asks for the most recent conversation,
    /// either through the flag or through the `last` token.
    #[must_use]
    pub fn implies_last(&self) -> bool {
        self.last || self.token.as_deref().is_some_and(is_last_token)
    }

    /// Normalizes the request without touching any store.
    ///
    /// Explicit tokens are validated but otherwise passed through unchanged.
    pub fn decision(&self) -> Result<ResumeDecision, SessionError> {
        if self.implies_last() {
            if let Some(token) = self.token.as_deref().filter(|token| !is_last_token(token)) {
                warn!(token, "explicit resume id ignored in favor of the most recent conversation");
            }
            return Ok(ResumeDecision::ResumeLast);
        }

        match self.token.as_deref() {
            None => Ok(ResumeDecision::NewConversation),
            Some(token) => ConversationId::parse(token).map(ResumeDecision::ResumeById),
        }
    }
}

fn is_last_token(token: &str) -> bool {
    token.eq_ignore_ascii_case(LAST_TOKEN)
}

/// Resolves resume requests against a conversation store.
pub struct ResumeResolver<'a, S: ConversationStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ConversationStore + ?Sized> ResumeResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolves `request` to either a concrete conversation or a new one.
    ///
    /// The store is listed at most once, and only on the `last` path. The result
    /// is never [`ResumeDecision::ResumeLast`].
    pub fn resolve(&self, request: &ResumeRequest) -> Result<ResumeDecision, SessionError> {
        let decision = match request.decision()? {
            ResumeDecision::ResumeLast => self.most_recent()?,
            decision => decision,
        };

        info!(?decision, "resolved resume request");
        Ok(decision)
    }

    fn most_recent(&self) -> Result<ResumeDecision, SessionError> {
        let summaries = self.store.list(1).map_err(SessionError::store_list)?;

        match summaries.into_iter().next() {
            Some(summary) => Ok(ResumeDecision::ResumeById(summary.id)),
            None => {
                info!("no previous conversation to resume; starting a new one");
                Ok(ResumeDecision::NewConversation)
            }
        }
    }
}
