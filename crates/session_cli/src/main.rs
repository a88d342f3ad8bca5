use std::io;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use session_cli::{list_conversations, open_store, run_session, Args};
use session_runner::{logging, SessionConfig};
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = SessionConfig::from_env();
    args.apply_to(&mut config);
    logging::init(&config).map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    let cwd = std::env::current_dir().context("reading current directory")?;
    let store = Arc::new(open_store(&config, &cwd));
    info!(root = %store.root().display(), "conversation store");

    if let Some(limit) = args.list {
        return list_conversations(&store, limit, &mut io::stdout().lock());
    }

    let request = args.resume_request();
    let outcome = run_session(store, &request, io::stdin().lock(), io::stdout())?;
    info!(
        conversation_id = %outcome.conversation_id,
        resumed = outcome.resumed,
        last = request.implies_last(),
        submitted = outcome.submitted,
        "session finished"
    );

    Ok(())
}
