//! Shared deterministic types for the agent core.
//!
//! These types define stable contracts between the parser, the tool registry
//! and the orchestration loop. The model only ever reads text, so every
//! structured value here has a canonical rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Substring that marks a tool result as goal completion.
pub const SUCCESS_MARKER: &str = "SUCCESS";

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A tool invocation extracted from one assistant turn.
///
/// `raw_arguments` is still undecoded; see [`crate::core::arguments`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub tool_name: String,
    pub raw_arguments: String,
}

/// Classification of a recoverable tool failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing or malformed arguments for the selected tool.
    InvalidArguments,
    /// Path rejected by the workspace policy.
    AccessDenied,
    /// Referenced file or directory is absent.
    NotFound,
    /// Filesystem error while reading, writing, or listing.
    Io,
    /// External process exceeded its time budget.
    Timeout,
    /// External executable could not be spawned because it does not exist.
    CommandNotFound,
    /// Single-file verifier exited non-zero.
    CompilerError,
    /// Whole-project build exited non-zero.
    BuildError,
    /// No tool registered under the requested name.
    UnknownTool,
    /// The tool itself failed (error return or panic), caught at the registry.
    Execution,
}

/// Result of a tool invocation.
///
/// Internally typed; rendered to marker-bearing text at the model boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Success(String),
    Failure { kind: FailureKind, message: String },
}

impl ToolOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success(text.into())
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Text shown to the model.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ToolOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(text) => f.write_str(text),
            Self::Failure { kind, message } => match kind {
                FailureKind::CompilerError => write!(f, "COMPILER ERROR:\n{message}"),
                FailureKind::BuildError => write!(f, "BUILD ERROR:\n{message}"),
                // `message` is "<tool>: <cause>".
                FailureKind::Execution => write!(f, "Error executing {message}"),
                // Already carries its own prefix (e.g. "Read failed: ...").
                FailureKind::Io => f.write_str(message),
                _ => write!(f, "Error: {message}"),
            },
        }
    }
}

/// Whether rendered tool output carries the goal-completion marker.
pub fn signals_success(rendered: &str) -> bool {
    rendered.contains(SUCCESS_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_renders_verbatim() {
        let outcome = ToolOutcome::success("SUCCESS: Proof Verified (No output from compiler).");
        assert_eq!(
            outcome.render(),
            "SUCCESS: Proof Verified (No output from compiler)."
        );
        assert!(signals_success(&outcome.render()));
    }

    #[test]
    fn failures_render_kind_specific_prefix() {
        let compiler = ToolOutcome::failure(FailureKind::CompilerError, "A.lean:1:0: error");
        assert_eq!(compiler.render(), "COMPILER ERROR:\nA.lean:1:0: error");

        let build = ToolOutcome::failure(FailureKind::BuildError, "lake failed");
        assert_eq!(build.render(), "BUILD ERROR:\nlake failed");

        let denied = ToolOutcome::failure(FailureKind::AccessDenied, "Access denied.");
        assert_eq!(denied.render(), "Error: Access denied.");

        let io = ToolOutcome::failure(FailureKind::Io, "Read failed: is a directory");
        assert_eq!(io.render(), "Read failed: is a directory");
    }

    #[test]
    fn write_confirmation_is_not_a_success_signal() {
        let outcome = ToolOutcome::success("Successfully wrote to A.lean.");
        assert!(!signals_success(&outcome.render()));
    }

    #[test]
    fn role_serializes_lowercase() {
        let turn = Turn::assistant("hi");
        let json = serde_json::to_string(&turn).expect("serialize");
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
