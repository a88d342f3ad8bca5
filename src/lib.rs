//! Per-conversation runner lifecycle for interactive agent sessions.
//!
//! ## Runners
//!
//! Every conversation gets at most one [`ConversationRunner`] per process. Runners
//! are obtained exclusively through [`RunnerRegistry::get_or_create`], which builds
//! the runner through a [`RunnerFactory`] on first use and replays the
//! conversation's backlog into the [`Visualizer`] exactly once.
//!
//! ## Resume
//!
//! [`ResumeResolver`] turns `--resume <ID|last>` / `--last` style arguments into a
//! [`ResumeDecision`]. The `last` token is case-insensitive and behaves exactly like
//! the flag.
//!
//! ## Environment
//!
//! - `AGENT_SESSION_DIR` overrides the conversation store directory.
//! - `AGENT_SESSION_LOG` sets the tracing filter directive.
//! - `AGENT_SESSION_DEBUG=1` raises the default log level to `debug`.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod config;
pub mod contract;
pub mod error;
pub mod factory;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod resume;
pub mod runner;
pub mod types;

pub use config::SessionConfig;
pub use contract::{
    Conversation, ConversationHandle, ConversationStore, MessagePump, Notification,
    NotificationCallback, RunnerMessage, SessionState, Severity, SharedState, Visualizer,
};
pub use error::{BoxError, SessionError};
pub use factory::StoreRunnerFactory;
pub use manager::ConversationManager;
pub use registry::{ReplayHistory, RunnerFactory, RunnerRegistry};
pub use resume::{ResumeDecision, ResumeRequest, ResumeResolver, LAST_TOKEN};
pub use runner::{ConversationRunner, ReplayState};
pub use types::{ConversationEvent, ConversationId, ConversationSummary};

/// Locks `mutex`, recovering the guard if a previous holder panicked.
pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub(crate) fn read_unpoisoned<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub(crate) fn write_unpoisoned<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
