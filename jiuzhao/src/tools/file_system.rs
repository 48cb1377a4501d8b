//! Workspace file access: read, write and list under a root directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::core::arguments::ArgumentBag;
use crate::core::path::workspace_relative;
use crate::core::types::{FailureKind, ToolOutcome};
use crate::tools::Tool;

const USAGE: &str = r#"<TOOL name="file_system">
{
  "action": "read" | "write" | "list",
  "path": "path/to/file_or_dir",
  "content": "content to write (only for write action)"
}
</TOOL>"#;

const ACCESS_DENIED: &str = "Access denied. Please use relative paths within the project.";

/// Read, write, or list files relative to the workspace root.
#[derive(Debug, Clone)]
pub struct FileSystemTool {
    root: PathBuf,
}

impl FileSystemTool {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn read(&self, display: &str, path: &Path) -> ToolOutcome {
        let full = self.root.join(path);
        if !full.exists() {
            return ToolOutcome::failure(
                FailureKind::NotFound,
                format!("File {display} does not exist."),
            );
        }
        match fs::read_to_string(&full) {
            Ok(contents) => ToolOutcome::success(contents),
            Err(err) => ToolOutcome::failure(FailureKind::Io, format!("Read failed: {err}")),
        }
    }

    fn write(&self, display: &str, path: &Path, content: &str) -> ToolOutcome {
        let full = self.root.join(path);
        if let Some(parent) = full.parent()
            && let Err(err) = fs::create_dir_all(parent)
        {
            return ToolOutcome::failure(FailureKind::Io, format!("Write failed: {err}"));
        }
        match fs::write(&full, content) {
            Ok(()) => {
                debug!(path = %full.display(), bytes = content.len(), "wrote file");
                ToolOutcome::success(format!("Successfully wrote to {display}."))
            }
            Err(err) => ToolOutcome::failure(FailureKind::Io, format!("Write failed: {err}")),
        }
    }

    fn list(&self, display: &str, path: &Path) -> ToolOutcome {
        let full = self.root.join(path);
        if !full.exists() {
            return ToolOutcome::failure(
                FailureKind::NotFound,
                format!("Directory {display} does not exist."),
            );
        }
        match list_visible_entries(&full) {
            Ok(entries) if entries.is_empty() => ToolOutcome::success("(Empty Directory)"),
            Ok(entries) => ToolOutcome::success(entries.join("\n")),
            Err(err) => ToolOutcome::failure(FailureKind::Io, format!("List failed: {err}")),
        }
    }
}

impl Tool for FileSystemTool {
    fn name(&self) -> &str {
        "file_system"
    }

    fn description(&self) -> &str {
        "Read, write, or list files in the project directory."
    }

    fn usage(&self) -> &str {
        USAGE
    }

    fn execute(&self, args: &ArgumentBag) -> Result<ToolOutcome> {
        let raw_path = args.get_str_or("path", ".");
        let Some(path) = workspace_relative(&raw_path) else {
            debug!(path = %raw_path, "rejected path outside workspace");
            return Ok(ToolOutcome::failure(
                FailureKind::AccessDenied,
                ACCESS_DENIED,
            ));
        };

        let outcome = match args.get_str("action").as_deref() {
            Some("read") => self.read(&raw_path, path),
            Some("write") => {
                let content = args.get_str_or("content", "");
                self.write(&raw_path, path, &content)
            }
            Some("list") => self.list(&raw_path, path),
            _ => ToolOutcome::failure(
                FailureKind::InvalidArguments,
                "Invalid action. Use 'read', 'write', or 'list'.",
            ),
        };
        Ok(outcome)
    }
}

/// Immediate children of `dir` as `[DIR] name` / `[FILE] name`, sorted by name,
/// skipping dot-files.
fn list_visible_entries(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let kind = if entry.path().is_dir() { "DIR" } else { "FILE" };
        entries.push((name, kind));
    }
    entries.sort();
    Ok(entries
        .into_iter()
        .map(|(name, kind)| format!("[{kind}] {name}"))
        .collect())
}
