use serde::{Deserialize, Serialize};
use session_runner::ConversationEvent;

/// Only on-disk format this crate reads or writes.
pub const SESSION_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRecordType {
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryRecordType {
    Entry,
}

/// First line of every conversation file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionHeader {
    #[serde(rename = "type")]
    pub record_type: SessionRecordType,
    pub version: u32,
    pub session_id: String,
    /// RFC3339; also the sort key for listings.
    pub created_at: String,
    /// Absolute working directory the conversation was started from.
    pub cwd: String,
}

impl SessionHeader {
    #[must_use]
    pub fn v1(
        session_id: impl Into<String>,
        created_at: impl Into<String>,
        cwd: impl Into<String>,
    ) -> Self {
        Self {
            record_type: SessionRecordType::Session,
            version: SESSION_FORMAT_VERSION,
            session_id: session_id.into(),
            created_at: created_at.into(),
            cwd: cwd.into(),
        }
    }
}

/// One persisted conversation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionEntry {
    #[serde(rename = "type")]
    pub record_type: EntryRecordType,
    pub id: String,
    pub ts: String,
    pub event: ConversationEvent,
}

impl SessionEntry {
    #[must_use]
    pub fn new(id: impl Into<String>, ts: impl Into<String>, event: ConversationEvent) -> Self {
        Self {
            record_type: EntryRecordType::Entry,
            id: id.into(),
            ts: ts.into(),
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JsonLine {
    Session(SessionHeader),
    Entry(SessionEntry),
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use session_runner::ConversationEvent;

    use super::{SessionEntry, SessionHeader};

    #[test]
    fn header_wire_shape() {
        let header = SessionHeader::v1("abc-123", "2026-02-14T00:00:00Z", "/work");

        assert_eq!(
            serde_json::to_value(&header).expect("header should serialize"),
            json!({
                "type": "session",
                "version": 1,
                "session_id": "abc-123",
                "created_at": "2026-02-14T00:00:00Z",
                "cwd": "/work",
            })
        );
    }

    #[test]
    fn entry_nests_event_under_its_own_key() {
        let entry = SessionEntry::new(
            "entry-1",
            "2026-02-14T00:00:01Z",
            ConversationEvent::user_text("hello"),
        );

        assert_eq!(
            serde_json::to_value(&entry).expect("entry should serialize"),
            json!({
                "type": "entry",
                "id": "entry-1",
                "ts": "2026-02-14T00:00:01Z",
                "event": { "kind": "user_text", "text": "hello" },
            })
        );
    }
}
