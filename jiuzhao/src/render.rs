//! Plain-text console transcript for interactive sessions.

use std::io::Write;

use tracing::debug;

use crate::agent::AgentObserver;
use crate::core::arguments::ArgumentBag;
use crate::io::prompt::AGENT_NAME;

/// Tool output longer than this many characters is cut for display.
pub const DISPLAY_LIMIT_CHARS: usize = 500;

/// Cut `text` to `limit` characters, appending `...` when anything was dropped.
pub fn truncate_for_display(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Observer that writes the session transcript to `W`.
pub struct ConsoleObserver<W: Write> {
    out: W,
}

impl ConsoleObserver<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn header(&mut self) {
        self.line(&format!("{AGENT_NAME}: Automated Formalization Agent"));
        self.line("Powered by LLMs & Lean 4");
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            debug!(%err, "console write failed");
        }
    }
}

impl<W: Write> AgentObserver for ConsoleObserver<W> {
    fn on_thinking(&mut self, turn: u32, max: u32) {
        self.line(&format!("{AGENT_NAME} is thinking ({turn}/{max})..."));
    }

    fn on_assistant_message(&mut self, text: &str) {
        self.line("--- Agent ---");
        self.line(text.trim_end());
        self.line("-------------");
    }

    fn on_tool_call(&mut self, name: &str, args: &ArgumentBag) {
        self.line(&format!("Tool Call: {name}({args})"));
    }

    fn on_tool_result(&mut self, _name: &str, text: &str) {
        self.line(&format!(
            "   Result: {}",
            truncate_for_display(text, DISPLAY_LIMIT_CHARS)
        ));
    }

    fn on_error(&mut self, text: &str) {
        self.line(&format!("[error] {text}"));
    }

    fn on_success(&mut self, text: &str) {
        self.line(&format!("[success] {text}"));
    }

    fn on_completed(&mut self, _text: &str) {
        self.line("[done] The agent reports the goal as verified.");
    }
}
