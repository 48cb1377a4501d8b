//! Literal substring search across the workspace's source files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

use crate::core::arguments::ArgumentBag;
use crate::core::types::{FailureKind, ToolOutcome};
use crate::io::config::SearchConfig;
use crate::tools::Tool;

const USAGE: &str = r#"<TOOL name="project_search">
{
  "query": "theorem_name_or_keyword"
}
</TOOL>"#;

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Path relative to the workspace root.
    pub path: PathBuf,
    /// 1-indexed line number.
    pub line_number: usize,
    /// Trimmed line, cut to the configured character budget.
    pub excerpt: String,
}

impl std::fmt::Display for SearchHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.path.display(),
            self.line_number,
            self.excerpt
        )
    }
}

/// Case-sensitive, non-regex search over files with the configured extension.
#[derive(Debug, Clone)]
pub struct ProjectSearchTool {
    root: PathBuf,
    description: String,
    cfg: SearchConfig,
}

impl ProjectSearchTool {
    pub fn new(root: &Path, cfg: &SearchConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            description: format!(
                "Search for a string or keyword in all .{} files in the project.",
                cfg.extension
            ),
            cfg: cfg.clone(),
        }
    }

    /// Up to `max_results` hits in directory traversal order.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| !self.is_excluded_dir(entry))
            // Unreadable directories are skipped like unreadable files.
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && self.has_target_extension(entry.path()));

        for entry in walker {
            // Non-UTF-8 or unreadable files are skipped silently.
            let Ok(contents) = fs::read_to_string(entry.path()) else {
                debug!(path = %entry.path().display(), "skipping unreadable file");
                continue;
            };
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_path_buf();
            for (idx, line) in contents.lines().enumerate() {
                if !line.contains(query) {
                    continue;
                }
                hits.push(SearchHit {
                    path: relative.clone(),
                    line_number: idx + 1,
                    excerpt: line.trim().chars().take(self.cfg.line_budget_chars).collect(),
                });
                if hits.len() >= self.cfg.max_results {
                    return hits;
                }
            }
        }
        hits
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self
                .cfg
                .excluded_dirs
                .iter()
                .any(|name| entry.file_name() == name.as_str())
    }

    fn has_target_extension(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == self.cfg.extension.as_str())
    }
}

impl Tool for ProjectSearchTool {
    fn name(&self) -> &str {
        "project_search"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn usage(&self) -> &str {
        USAGE
    }

    fn execute(&self, args: &ArgumentBag) -> Result<ToolOutcome> {
        let Some(query) = args.get_str("query").filter(|query| !query.is_empty()) else {
            return Ok(ToolOutcome::failure(
                FailureKind::InvalidArguments,
                "'query' argument is required.",
            ));
        };

        let hits = self.search(&query);
        if hits.is_empty() {
            return Ok(ToolOutcome::success(format!(
                "No results found for '{query}'."
            )));
        }
        let lines: Vec<String> = hits.iter().map(ToString::to_string).collect();
        Ok(ToolOutcome::success(format!(
            "Search Results:\n{}",
            lines.join("\n")
        )))
    }
}
