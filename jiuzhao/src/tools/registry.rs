//! Name-keyed tool registry with total dispatch.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::core::arguments::ArgumentBag;
use crate::core::types::{FailureKind, ToolOutcome};
use crate::io::config::AgentConfig;
use crate::tools::Tool;
use crate::tools::file_system::FileSystemTool;
use crate::tools::lean::LeanTool;
use crate::tools::search::ProjectSearchTool;

/// Separator line between catalog entries.
pub const CATALOG_SEPARATOR: &str = "\n---\n";

/// Registered tools in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `file_system`, `lean_tool` and `project_search` rooted at `workspace`.
    pub fn with_defaults(workspace: &Path, cfg: &AgentConfig) -> Self {
        let mut registry = Self::new();
        registry.register(FileSystemTool::new(workspace));
        registry.register(LeanTool::new(workspace, &cfg.verifier));
        registry.register(ProjectSearchTool::new(workspace, &cfg.search));
        registry
    }

    /// Add `tool`; a tool with the same name is replaced in place.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let tool: Box<dyn Tool> = Box::new(tool);
        match self
            .tools
            .iter()
            .position(|existing| existing.name() == tool.name())
        {
            Some(idx) => {
                debug!(tool = tool.name(), "replacing registered tool");
                self.tools[idx] = tool;
            }
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(|tool| tool.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Catalog of every tool definition, in registration order.
    pub fn definitions(&self) -> String {
        self.tools
            .iter()
            .map(|tool| tool.definition())
            .collect::<Vec<_>>()
            .join(CATALOG_SEPARATOR)
    }

    /// Run tool `name`. Never fails: unknown names, errors and panics become
    /// failure outcomes.
    #[instrument(skip(self, args), fields(arg_count = args.len()))]
    pub fn dispatch(&self, name: &str, args: &ArgumentBag) -> ToolOutcome {
        let Some(tool) = self.get(name) else {
            warn!("unknown tool requested");
            return ToolOutcome::failure(
                FailureKind::UnknownTool,
                format!("Tool '{name}' not found."),
            );
        };

        match catch_unwind(AssertUnwindSafe(|| tool.execute(args))) {
            Ok(Ok(outcome)) => {
                debug!(failure = ?outcome.failure_kind(), "tool finished");
                outcome
            }
            Ok(Err(err)) => {
                warn!(err = %format!("{err:#}"), "tool returned error");
                ToolOutcome::failure(FailureKind::Execution, format!("{name}: {err:#}"))
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(%reason, "tool panicked");
                ToolOutcome::failure(FailureKind::Execution, format!("{name}: {reason}"))
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "tool panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};

    struct EchoTool {
        name: &'static str,
        reply: &'static str,
    }

    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echo a fixed reply."
        }

        fn usage(&self) -> &str {
            "<TOOL name=\"echo\">\n{}\n</TOOL>"
        }

        fn execute(&self, _args: &ArgumentBag) -> Result<ToolOutcome> {
            Ok(ToolOutcome::success(self.reply))
        }
    }

    struct FailingTool;

    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "Always errors."
        }

        fn usage(&self) -> &str {
            ""
        }

        fn execute(&self, _args: &ArgumentBag) -> Result<ToolOutcome> {
            Err(anyhow!("disk on fire"))
        }
    }

    struct PanickingTool;

    impl Tool for PanickingTool {
        fn name(&self) -> &str {
            "panicking"
        }

        fn description(&self) -> &str {
            "Always panics."
        }

        fn usage(&self) -> &str {
            ""
        }

        fn execute(&self, _args: &ArgumentBag) -> Result<ToolOutcome> {
            panic!("index out of bounds")
        }
    }

    #[test]
    fn dispatch_runs_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool {
            name: "echo",
            reply: "hi",
        });

        let outcome = registry.dispatch("echo", &ArgumentBag::default());
        assert_eq!(outcome, ToolOutcome::success("hi"));
    }

    #[test]
    fn unknown_tool_is_failure_text() {
        let registry = ToolRegistry::new();
        let outcome = registry.dispatch("nope", &ArgumentBag::default());
        assert_eq!(outcome.failure_kind(), Some(FailureKind::UnknownTool));
        assert_eq!(outcome.render(), "Error: Tool 'nope' not found.");
    }

    #[test]
    fn tool_error_is_caught() {
        let mut registry = ToolRegistry::new();
        registry.register(FailingTool);
        let outcome = registry.dispatch("failing", &ArgumentBag::default());
        assert_eq!(outcome.render(), "Error executing failing: disk on fire");
    }

    #[test]
    fn tool_panic_is_caught() {
        let mut registry = ToolRegistry::new();
        registry.register(PanickingTool);
        let outcome = registry.dispatch("panicking", &ArgumentBag::default());
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Execution));
        assert!(outcome.render().contains("index out of bounds"));
    }

    #[test]
    fn last_registration_wins_and_keeps_position() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool {
            name: "a",
            reply: "first",
        });
        registry.register(EchoTool {
            name: "b",
            reply: "b",
        });
        registry.register(EchoTool {
            name: "a",
            reply: "second",
        });

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(
            registry.dispatch("a", &ArgumentBag::default()),
            ToolOutcome::success("second")
        );
    }

    #[test]
    fn definitions_join_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool {
            name: "first",
            reply: "",
        });
        registry.register(EchoTool {
            name: "second",
            reply: "",
        });

        let catalog = registry.definitions();
        let entries: Vec<&str> = catalog.split(CATALOG_SEPARATOR).collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].starts_with("Name: first\nDescription: Echo a fixed reply.\nUsage:\n"));
        assert!(entries[1].starts_with("Name: second\n"));
    }

    #[test]
    fn defaults_register_three_tools() {
        let temp = tempfile::tempdir().expect("tempdir");
        let registry = ToolRegistry::with_defaults(temp.path(), &AgentConfig::default());
        assert_eq!(
            registry.names(),
            vec!["file_system", "lean_tool", "project_search"]
        );
    }
}
