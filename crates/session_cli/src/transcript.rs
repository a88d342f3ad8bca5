use std::io::{self, Write};
use std::sync::Mutex;

use serde_json::Value;
use session_runner::{lock_unpoisoned, BoxError, ConversationEvent, Visualizer};

/// Printed after a replayed backlog so live output is visually separated.
pub const HISTORY_FOOTER: &str = "-- end of history --";

/// Writes conversation events as role-prefixed lines.
pub struct TranscriptPrinter<W: Write> {
    out: Mutex<W>,
}

impl<W: Write> TranscriptPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn print_event(&self, event: &ConversationEvent) -> io::Result<()> {
        let mut out = lock_unpoisoned(&self.out);
        writeln!(out, "{}", render_event(event))?;
        out.flush()
    }
}

impl<W: Write + Send> Visualizer for TranscriptPrinter<W> {
    fn replay_events(&self, events: &[ConversationEvent]) -> Result<(), BoxError> {
        let mut out = lock_unpoisoned(&self.out);
        for event in events {
            writeln!(out, "{}", render_event(event))?;
        }
        writeln!(out, "{HISTORY_FOOTER}")?;
        out.flush()?;
        Ok(())
    }
}

#[must_use]
pub fn render_event(event: &ConversationEvent) -> String {
    match event {
        ConversationEvent::UserText { text } => format!("you: {text}"),
        ConversationEvent::AssistantText { text } => format!("assistant: {text}"),
        ConversationEvent::ToolCall {
            call_id,
            tool_name,
            arguments,
        } => format!("tool {tool_name} [{call_id}] {arguments}"),
        ConversationEvent::ToolResult {
            call_id,
            tool_name,
            content,
            is_error,
        } => {
            let status = if *is_error { "failed" } else { "ok" };
            format!(
                "tool {tool_name} [{call_id}] {status}: {}",
                render_content(content)
            )
        }
    }
}

fn render_content(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
