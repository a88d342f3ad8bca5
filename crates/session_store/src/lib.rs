//! JSONL-backed conversation store.
//!
//! Each conversation lives in `<cwd>/.agent/sessions/<created_at>_<id>.jsonl`. The
//! first line is a `session` header; every further line is an `entry` carrying one
//! [`session_runner::ConversationEvent`].

mod error;
mod local;
mod paths;
mod replay;
mod schema;
mod store;

pub use error::SessionStoreError;
pub use local::{LocalConversationStore, StoredConversation};
pub use paths::{session_file_name, session_id_from_path, session_root};
pub use schema::{
    EntryRecordType, SessionEntry, SessionHeader, SessionRecordType, SESSION_FORMAT_VERSION,
};
pub use store::SessionStore;
