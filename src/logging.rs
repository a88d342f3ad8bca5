//! Tracing subscriber setup.
//!
//! Logs go to stderr so they never interleave with the transcript on stdout.

use tracing_subscriber::EnvFilter;

use crate::config::SessionConfig;
use crate::error::BoxError;

/// Installs the global subscriber. Fails if the directive does not parse or a
/// subscriber is already installed.
pub fn init(config: &SessionConfig) -> Result<(), BoxError> {
    let filter = EnvFilter::try_new(config.log_directive())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}
