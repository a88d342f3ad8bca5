use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::SessionError;

/// Stable identifier of one persisted conversation.
///
/// Ids are opaque: they are compared byte-for-byte and never case-normalized.
/// Accepted shape is non-empty ASCII alphanumerics plus `-` and `_`, which keeps
/// every id safe to embed in a file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    /// Generates a fresh UUID-shaped id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validates `raw` as an id without altering it.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        if raw.is_empty() {
            return Err(SessionError::invalid_token(raw, "conversation id is empty"));
        }

        if !raw
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
        {
            return Err(SessionError::invalid_token(
                raw,
                "conversation id may only contain ASCII letters, digits, '-' and '_'",
            ));
        }

        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Listing metadata for one stored conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub created_at: OffsetDateTime,
}

/// One historical interaction event of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ConversationEvent {
    UserText {
        text: String,
    },
    AssistantText {
        text: String,
    },
    ToolCall {
        call_id: String,
        tool_name: String,
        arguments: Value,
    },
    ToolResult {
        call_id: String,
        tool_name: String,
        content: Value,
        is_error: bool,
    },
}

impl ConversationEvent {
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::UserText { text: text.into() }
    }

    #[must_use]
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::AssistantText { text: text.into() }
    }
}
