//! External verifier: `lean <file>` for single files, `lake build` for the project.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::core::arguments::ArgumentBag;
use crate::core::path::workspace_relative;
use crate::core::types::{FailureKind, ToolOutcome};
use crate::io::config::VerifierConfig;
use crate::io::process::{CommandOutput, is_command_not_found, run_command_with_timeout};
use crate::tools::Tool;

const USAGE: &str = r#"<TOOL name="lean_tool">
{
  "command": "check_file" | "lake_build",
  "path": "filename.lean" (required for check_file)
}
</TOOL>"#;

/// One configured external command.
#[derive(Debug, Clone)]
pub struct VerifierCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl VerifierCommand {
    fn from_argv(argv: &[String], timeout: Duration) -> Self {
        let (program, args) = argv.split_first().map_or_else(
            || (String::new(), Vec::new()),
            |(program, args)| (program.clone(), args.to_vec()),
        );
        Self {
            program,
            args,
            timeout,
        }
    }
}

/// Which verifier operation ran; selects the result texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verification {
    CheckFile,
    Build,
}

impl Verification {
    fn success_text(self) -> &'static str {
        match self {
            Verification::CheckFile => "SUCCESS: Proof Verified (No output from compiler).",
            Verification::Build => "SUCCESS: Project built successfully.",
        }
    }

    fn failure_kind(self) -> FailureKind {
        match self {
            Verification::CheckFile => FailureKind::CompilerError,
            Verification::Build => FailureKind::BuildError,
        }
    }

    fn timeout_text(self, timeout: Duration) -> String {
        match self {
            Verification::CheckFile => format!("Compilation timed out ({timeout:?})."),
            Verification::Build => format!("Build timed out ({timeout:?})."),
        }
    }
}

/// Compile Lean 4 files or run Lake builds as bounded-time subprocesses.
#[derive(Debug, Clone)]
pub struct LeanTool {
    root: PathBuf,
    check: VerifierCommand,
    build: VerifierCommand,
    output_limit_bytes: usize,
}

impl LeanTool {
    pub fn new(root: &Path, cfg: &VerifierConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            check: VerifierCommand::from_argv(
                &cfg.check_command,
                Duration::from_secs(cfg.check_timeout_secs),
            ),
            build: VerifierCommand::from_argv(
                &cfg.build_command,
                Duration::from_secs(cfg.build_timeout_secs),
            ),
            output_limit_bytes: cfg.output_limit_bytes,
        }
    }

    /// Replace the configured commands (e.g. with sub-second timeouts in tests).
    pub fn with_commands(mut self, check: VerifierCommand, build: VerifierCommand) -> Self {
        self.check = check;
        self.build = build;
        self
    }

    #[instrument(skip(self))]
    pub fn check_file(&self, path: &str) -> ToolOutcome {
        let Some(relative) = workspace_relative(path) else {
            return ToolOutcome::failure(
                FailureKind::AccessDenied,
                "Access denied. Please use relative paths within the project.",
            );
        };
        if !self.root.join(relative).exists() {
            return ToolOutcome::failure(FailureKind::NotFound, format!("File {path} not found."));
        }
        let mut args = self.check.args.clone();
        args.push(path.to_string());
        self.run(Verification::CheckFile, &self.check, &args)
    }

    #[instrument(skip(self))]
    pub fn build(&self) -> ToolOutcome {
        self.run(Verification::Build, &self.build, &self.build.args)
    }

    fn run(&self, kind: Verification, command: &VerifierCommand, args: &[String]) -> ToolOutcome {
        info!(program = %command.program, ?args, "running verifier");
        match run_command_with_timeout(
            &command.program,
            args,
            &self.root,
            command.timeout,
            self.output_limit_bytes,
        ) {
            Ok(output) => classify(kind, command, &output),
            Err(err) if is_command_not_found(&err) => {
                warn!(program = %command.program, "verifier executable not found");
                ToolOutcome::failure(
                    FailureKind::CommandNotFound,
                    format!("'{}' executable not found.", command.program),
                )
            }
            Err(err) => ToolOutcome::failure(
                FailureKind::Execution,
                format!("{}: {err:#}", command.program),
            ),
        }
    }
}

fn classify(kind: Verification, command: &VerifierCommand, output: &CommandOutput) -> ToolOutcome {
    if output.timed_out {
        return ToolOutcome::failure(FailureKind::Timeout, kind.timeout_text(command.timeout));
    }
    if output.success() {
        return ToolOutcome::success(kind.success_text());
    }
    ToolOutcome::failure(kind.failure_kind(), output.diagnostics(&command.program))
}

impl Tool for LeanTool {
    fn name(&self) -> &str {
        "lean_tool"
    }

    fn description(&self) -> &str {
        "Compile Lean 4 files or run Lake build commands."
    }

    fn usage(&self) -> &str {
        USAGE
    }

    fn execute(&self, args: &ArgumentBag) -> Result<ToolOutcome> {
        let outcome = match args.get_str("command").as_deref() {
            Some("check_file") => match args.get_non_empty("path") {
                Some(path) => self.check_file(&path),
                None => ToolOutcome::failure(
                    FailureKind::InvalidArguments,
                    "'path' is required for check_file.",
                ),
            },
            Some("lake_build") => self.build(),
            _ => ToolOutcome::failure(
                FailureKind::InvalidArguments,
                "Invalid command. Use 'check_file' or 'lake_build'.",
            ),
        };
        Ok(outcome)
    }
}
