//! Line-oriented terminal front end for resumable agent sessions.
//!
//! `agent-session` resolves `--resume <ID|last>` / `--last`, attaches a runner to
//! the chosen conversation, prints its history once, then submits each stdin line
//! as user text.

pub mod args;
pub mod session;
pub mod transcript;

pub use args::Args;
pub use session::{list_conversations, open_store, run_session, SessionOutcome};
pub use transcript::{render_event, TranscriptPrinter};
