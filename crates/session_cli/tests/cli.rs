use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use session_cli::transcript::HISTORY_FOOTER;
use session_cli::{list_conversations, open_store, run_session};
use session_runner::{Conversation, ConversationEvent, ConversationId, ResumeRequest, SessionConfig};
use session_store::LocalConversationStore;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().expect("buffer lock").clone()).expect("utf8 output")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn store_in(dir: &tempfile::TempDir) -> Arc<LocalConversationStore> {
    Arc::new(LocalConversationStore::for_cwd(dir.path()))
}

fn request(token: Option<&str>, last: bool) -> ResumeRequest {
    ResumeRequest::new(token.map(str::to_string), last)
}

#[test]
fn fresh_session_persists_input_lines() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let store = store_in(&temp);
    let output = SharedBuffer::default();

    let outcome = run_session(
        Arc::clone(&store),
        &request(None, false),
        Cursor::new("hello\n\n   \nsecond line\n"),
        output.clone(),
    )
    .expect("session should run");

    assert!(!outcome.resumed);
    assert_eq!(outcome.submitted, 2);
    assert_eq!(output.contents(), "you: hello\nyou: second line\n");

    let stored = store
        .open_session(&outcome.conversation_id)
        .expect("session should be persisted");
    assert_eq!(
        stored.events(),
        vec![
            ConversationEvent::user_text("hello"),
            ConversationEvent::user_text("second line"),
        ]
    );
}

#[test]
fn resume_last_prints_history_once_before_new_input() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let store = store_in(&temp);
    let first = run_session(
        Arc::clone(&store),
        &request(None, false),
        Cursor::new("remember this\n"),
        SharedBuffer::default(),
    )
    .expect("first session should run");

    let output = SharedBuffer::default();
    let second = run_session(
        Arc::clone(&store),
        &request(None, true),
        Cursor::new("and this\n"),
        output.clone(),
    )
    .expect("resumed session should run");

    assert!(second.resumed);
    assert_eq!(second.conversation_id, first.conversation_id);
    assert_eq!(
        output.contents(),
        format!("you: remember this\n{HISTORY_FOOTER}\nyou: and this\n")
    );
}

#[test]
fn resume_by_id_picks_that_conversation() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let store = store_in(&temp);
    let target = ConversationId::parse("chosen-1").expect("valid id");
    store
        .create_session(&target)
        .expect("create should work")
        .append(ConversationEvent::assistant_text("earlier answer"))
        .expect("append should work");
    store
        .create_session(&ConversationId::parse("other-2").expect("valid id"))
        .expect("create should work");

    let output = SharedBuffer::default();
    let outcome = run_session(
        Arc::clone(&store),
        &request(Some("chosen-1"), false),
        Cursor::new(""),
        output.clone(),
    )
    .expect("session should run");

    assert_eq!(outcome.conversation_id, target);
    assert_eq!(outcome.submitted, 0);
    assert_eq!(
        output.contents(),
        format!("assistant: earlier answer\n{HISTORY_FOOTER}\n")
    );
}

#[test]
fn resume_of_unknown_id_fails() {
    let temp = tempfile::tempdir().expect("tempdir should be created");

    let error = run_session(
        store_in(&temp),
        &request(Some("missing-1"), false),
        Cursor::new("ignored\n"),
        SharedBuffer::default(),
    )
    .expect_err("unknown conversation must fail");

    assert!(error.to_string().contains("missing-1"));
}

#[test]
fn malformed_resume_token_fails_before_touching_store() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let store = store_in(&temp);

    let error = run_session(
        Arc::clone(&store),
        &request(Some("../etc/passwd"), false),
        Cursor::new(""),
        SharedBuffer::default(),
    )
    .expect_err("malformed token must fail");

    assert!(error.to_string().contains("invalid resume token"));
    assert!(!store.root().exists());
}

#[test]
fn list_prints_newest_first_or_empty_notice() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let config = SessionConfig {
        sessions_dir: Some(temp.path().join("custom")),
        ..SessionConfig::default()
    };
    let store = open_store(&config, temp.path());
    assert_eq!(store.root(), temp.path().join("custom"));

    let mut out = Vec::new();
    list_conversations(&store, 5, &mut out).expect("empty listing should work");
    assert_eq!(
        String::from_utf8(out).expect("utf8 output"),
        format!("no conversations in {}\n", store.root().display())
    );

    store
        .create_session(&ConversationId::parse("only-1").expect("valid id"))
        .expect("create should work");
    let mut out = Vec::new();
    list_conversations(&store, 5, &mut out).expect("listing should work");
    let listing = String::from_utf8(out).expect("utf8 output");
    assert!(listing.trim_end().ends_with("  only-1"), "{listing}");
    assert_eq!(listing.lines().count(), 1);
}
