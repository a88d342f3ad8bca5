use thiserror::Error;

use crate::types::ConversationId;

/// Boxed failure raised by an external collaborator (store, factory, visualizer).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid resume token '{token}': {reason}")]
    InvalidResumeToken { token: String, reason: &'static str },

    #[error("failed to list conversations: {source}")]
    StoreList {
        #[source]
        source: BoxError,
    },

    #[error("failed to load conversation {id}: {source}")]
    StoreLoad {
        id: ConversationId,
        #[source]
        source: BoxError,
    },

    #[error("failed to construct runner for conversation {id}: {source}")]
    RunnerConstructionFailed {
        id: ConversationId,
        #[source]
        source: BoxError,
    },

    #[error("history replay failed for conversation {id}: {source}")]
    ReplayFailed {
        id: ConversationId,
        #[source]
        source: BoxError,
    },

    #[error("failed to append event to conversation {id}: {source}")]
    AppendFailed {
        id: ConversationId,
        #[source]
        source: BoxError,
    },
}

impl SessionError {
    #[must_use]
    pub fn invalid_token(token: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidResumeToken {
            token: token.into(),
            reason,
        }
    }

    #[must_use]
    pub fn store_list(source: impl Into<BoxError>) -> Self {
        Self::StoreList {
            source: source.into(),
        }
    }

    #[must_use]
    pub fn store_load(id: &ConversationId, source: impl Into<BoxError>) -> Self {
        Self::StoreLoad {
            id: id.clone(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn construction(id: &ConversationId, source: impl Into<BoxError>) -> Self {
        Self::RunnerConstructionFailed {
            id: id.clone(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn replay(id: &ConversationId, source: impl Into<BoxError>) -> Self {
        Self::ReplayFailed {
            id: id.clone(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn append(id: &ConversationId, source: impl Into<BoxError>) -> Self {
        Self::AppendFailed {
            id: id.clone(),
            source: source.into(),
        }
    }
}
