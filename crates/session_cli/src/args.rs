use std::path::PathBuf;

use clap::Parser;
use session_runner::{ResumeRequest, SessionConfig};

/// Number of conversations printed by a bare `--list`.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Resume or start an agent conversation
#[derive(Parser, Debug)]
#[command(name = "agent-session")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Resume a conversation by ID, or `last` for the most recent one
    #[arg(long, value_name = "ID|last")]
    pub resume: Option<String>,

    /// Resume the most recent conversation
    #[arg(long)]
    pub last: bool,

    /// Conversation store directory (also: AGENT_SESSION_DIR)
    #[arg(long, value_name = "DIR")]
    pub sessions_dir: Option<PathBuf>,

    /// Enable debug logging (also: AGENT_SESSION_DEBUG=1)
    #[arg(short, long)]
    pub debug: bool,

    /// Tracing filter directive (also: AGENT_SESSION_LOG)
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Print the most recent conversations and exit
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "10"
    )]
    pub list: Option<usize>,
}

impl Args {
    /// Layers CLI flags over environment configuration.
    pub fn apply_to(&self, config: &mut SessionConfig) {
        if let Some(dir) = &self.sessions_dir {
            config.sessions_dir = Some(dir.clone());
        }
        if self.debug {
            config.debug = true;
        }
        if let Some(level) = &self.log_level {
            config.log_filter = Some(level.clone());
        }
    }

    #[must_use]
    pub fn resume_request(&self) -> ResumeRequest {
        ResumeRequest::new(self.resume.clone(), self.last)
    }
}
