//! Test-only helpers: scripted model replies, an event-recording observer and
//! a throwaway workspace directory.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::agent::AgentObserver;
use crate::core::arguments::ArgumentBag;
use crate::core::types::Turn;
use crate::io::model::ModelClient;

/// Model that replays queued replies and records every history it was sent.
///
/// Once the queue is empty every request fails like a transport error.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<Vec<Turn>>>,
}

impl ScriptedModel {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().map(Into::into).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Histories received so far, one per request.
    pub fn requests(&self) -> Vec<Vec<Turn>> {
        self.requests.borrow().clone()
    }
}

impl ModelClient for ScriptedModel {
    fn chat(&self, history: &[Turn]) -> Result<String> {
        self.requests.borrow_mut().push(history.to_vec());
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted model has no replies left"))
    }
}

/// One observer callback, flattened for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Thinking { turn: u32, max: u32 },
    AssistantMessage(String),
    ToolCall { name: String, args: String },
    ToolResult { name: String, text: String },
    Error(String),
    Success(String),
    Completed(String),
}

/// Observer that keeps every event in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: Vec<Event>,
}

impl RecordingObserver {
    pub fn tool_results(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::ToolResult { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl AgentObserver for RecordingObserver {
    fn on_thinking(&mut self, turn: u32, max: u32) {
        self.events.push(Event::Thinking { turn, max });
    }

    fn on_assistant_message(&mut self, text: &str) {
        self.events.push(Event::AssistantMessage(text.to_string()));
    }

    fn on_tool_call(&mut self, name: &str, args: &ArgumentBag) {
        self.events.push(Event::ToolCall {
            name: name.to_string(),
            args: args.to_string(),
        });
    }

    fn on_tool_result(&mut self, name: &str, text: &str) {
        self.events.push(Event::ToolResult {
            name: name.to_string(),
            text: text.to_string(),
        });
    }

    fn on_error(&mut self, text: &str) {
        self.events.push(Event::Error(text.to_string()));
    }

    fn on_success(&mut self, text: &str) {
        self.events.push(Event::Success(text.to_string()));
    }

    fn on_completed(&mut self, text: &str) {
        self.events.push(Event::Completed(text.to_string()));
    }
}

/// Temporary workspace directory, removed on drop.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp workspace")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        let path = self.path().join(rel);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }
}
