use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::{mpsc, Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use session_runner::{
    Conversation, ConversationId, ConversationManager, ConversationStore, Notification,
    NotificationCallback, ResumeDecision, ResumeRequest, ResumeResolver, RunnerMessage,
    RunnerRegistry, SessionConfig, SessionState, Severity, StoreRunnerFactory, Visualizer,
};
use session_store::LocalConversationStore;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, info, warn};

use crate::transcript::TranscriptPrinter;

/// What a finished interactive session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub conversation_id: ConversationId,
    pub resumed: bool,
    pub submitted: usize,
}

/// Store under the configured directory, or under `<cwd>/.agent/sessions`.
#[must_use]
pub fn open_store(config: &SessionConfig, cwd: &Path) -> LocalConversationStore {
    match &config.sessions_dir {
        Some(dir) => LocalConversationStore::new(dir, cwd),
        None => LocalConversationStore::for_cwd(cwd),
    }
}

/// Prints `<created_at>  <id>` for the `limit` most recent conversations.
pub fn list_conversations<W: Write>(
    store: &LocalConversationStore,
    limit: usize,
    out: &mut W,
) -> Result<()> {
    let summaries = store
        .list_sessions(limit)
        .context("listing conversations")?;
    if summaries.is_empty() {
        writeln!(out, "no conversations in {}", store.root().display())?;
        return Ok(());
    }

    for summary in summaries {
        let created_at = summary
            .created_at
            .format(&Rfc3339)
            .context("formatting conversation timestamp")?;
        writeln!(out, "{created_at}  {}", summary.id)?;
    }
    Ok(())
}

/// Resolves `request`, attaches a runner and submits every non-blank input line.
///
/// History is printed once on attach; each persisted line is echoed back through
/// the transcript.
pub fn run_session<R, W>(
    store: Arc<LocalConversationStore>,
    request: &ResumeRequest,
    input: R,
    output: W,
) -> Result<SessionOutcome>
where
    R: BufRead,
    W: Write + Send + 'static,
{
    let decision = ResumeResolver::new(store.as_ref()).resolve(request)?;
    let (conversation_id, resumed) = target_conversation(store.as_ref(), decision)?;

    let printer = Arc::new(TranscriptPrinter::new(output));
    let visualizer: Arc<dyn Visualizer> = printer.clone();
    let (message_pump, messages) = mpsc::channel();
    let registry = RunnerRegistry::new(
        StoreRunnerFactory::new(Arc::clone(&store), visualizer),
        Arc::new(Mutex::new(SessionState::default())),
        message_pump,
        log_notifications(),
    );
    let manager = ConversationManager::new(registry);

    let runner = manager.attach(&conversation_id)?;
    drain_messages(&messages, &printer)?;

    let mut submitted = 0;
    for line in input.lines() {
        let line = line.context("reading input")?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        runner.submit_user_text(text)?;
        submitted += 1;
        drain_messages(&messages, &printer)?;
    }

    Ok(SessionOutcome {
        conversation_id,
        resumed,
        submitted,
    })
}

/// Maps a resolved decision onto the conversation to attach, creating it when new.
///
/// `ResumeLast` must already have been settled against the store; receiving it
/// here is an error rather than a reason to start a fresh conversation.
fn target_conversation<S>(store: &S, decision: ResumeDecision) -> Result<(ConversationId, bool)>
where
    S: ConversationStore + ?Sized,
{
    match decision {
        ResumeDecision::ResumeById(id) => Ok((id, true)),
        ResumeDecision::NewConversation => {
            let id = ConversationId::generate();
            let conversation = store
                .create(&id)
                .map_err(|source| anyhow!("creating conversation {id}: {source}"))?;
            info!(conversation_id = %conversation.id(), "started new conversation");
            Ok((id, false))
        }
        ResumeDecision::ResumeLast => {
            bail!("most recent conversation was not resolved against the store")
        }
    }
}

fn drain_messages<W: Write>(
    messages: &Receiver<RunnerMessage>,
    printer: &TranscriptPrinter<W>,
) -> io::Result<()> {
    while let Ok(message) = messages.try_recv() {
        match message {
            RunnerMessage::HistoryReplayed {
                conversation_id,
                count,
            } => debug!(%conversation_id, count, "history shown"),
            RunnerMessage::EventAppended { event, .. } => printer.print_event(&event)?,
        }
    }
    Ok(())
}

fn log_notifications() -> NotificationCallback {
    Arc::new(|notification: Notification| match notification.severity {
        Severity::Information => info!(title = %notification.title, "{}", notification.message),
        Severity::Warning => warn!(title = %notification.title, "{}", notification.message),
        Severity::Error => error!(title = %notification.title, "{}", notification.message),
    })
}
