//! `jiuzhao` CLI: interactive Lean 4 proving sessions and config management.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use jiuzhao::agent::{Agent, AgentObserver, AgentSettings};
use jiuzhao::exit_codes;
use jiuzhao::io::config::{AgentConfig, default_config_path, load_config, write_config};
use jiuzhao::io::model::{ModelClient, OpenAiChatClient};
use jiuzhao::logging;
use jiuzhao::render::ConsoleObserver;
use jiuzhao::tools::ToolRegistry;

#[derive(Parser)]
#[command(
    name = "jiuzhao",
    version,
    about = "Jiuzhao: Automated Formalization Agent for Lean 4"
)]
struct Cli {
    /// Config file (defaults to ~/.jiuzhao/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Project directory the tools operate in.
    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive proving session.
    Prove {
        /// The mathematical statement or request.
        statement: String,
    },
    /// Show the effective configuration.
    Config {
        /// Write the default configuration file.
        #[arg(long)]
        init: bool,
        /// Overwrite an existing file with `--init`.
        #[arg(short, long, requires = "init")]
        force: bool,
    },
}

/// What one line of user input means for the session.
#[derive(Debug, PartialEq, Eq)]
enum UserLine<'a> {
    Exit,
    Skip,
    Input(&'a str),
}

fn classify_line(line: &str) -> UserLine<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return UserLine::Skip;
    }
    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        return UserLine::Exit;
    }
    UserLine::Input(trimmed)
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    match cli.command {
        Command::Prove { statement } => cmd_prove(&config_path, &cli.workspace, &statement),
        Command::Config { init, force } => cmd_config(&config_path, init, force),
    }
}

fn cmd_prove(config_path: &Path, workspace: &Path, statement: &str) -> Result<()> {
    let mut observer = ConsoleObserver::stdout();
    observer.header();

    let mut agent = build_agent(config_path, workspace)
        .context("failed to initialize agent (run `jiuzhao config` to check your settings)")?;
    agent.run(statement, &mut observer);

    let stdin = std::io::stdin();
    interact(&mut agent, stdin.lock(), &mut observer)?;
    println!("Goodbye!");
    Ok(())
}

fn build_agent(config_path: &Path, workspace: &Path) -> Result<Agent<OpenAiChatClient>> {
    let cfg = load_config(config_path)?;
    if !workspace.is_dir() {
        bail!("workspace {} is not a directory", workspace.display());
    }
    let workspace = fs::canonicalize(workspace)
        .with_context(|| format!("resolve workspace {}", workspace.display()))?;
    info!(workspace = %workspace.display(), model = %cfg.model.name, "starting session");

    let client = OpenAiChatClient::new(&cfg.model, &cfg.generation)?;
    let registry = ToolRegistry::with_defaults(&workspace, &cfg);
    Agent::new(client, registry, AgentSettings::from(&cfg))
}

/// Feed user lines from `input` to the agent until `exit`/`quit` or EOF.
fn interact<M: ModelClient, R: BufRead>(
    agent: &mut Agent<M>,
    input: R,
    observer: &mut impl AgentObserver,
) -> Result<()> {
    let mut lines = input.lines();
    loop {
        print!("\nUser Input (type 'exit' to quit):\n> ");
        std::io::stdout().flush().context("flush stdout")?;
        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line.context("read user input")?;
        match classify_line(&line) {
            UserLine::Exit => return Ok(()),
            UserLine::Skip => {}
            UserLine::Input(text) => {
                agent.run(text, observer);
            }
        }
    }
}

fn cmd_config(config_path: &Path, init: bool, force: bool) -> Result<()> {
    if init {
        if config_path.exists() && !force {
            bail!(
                "config already exists at {} (use --force to overwrite)",
                config_path.display()
            );
        }
        write_config(config_path, &AgentConfig::default())?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(());
    }

    let cfg = load_config(config_path)?;
    let source = if config_path.exists() {
        config_path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", config_path.display())
    };
    println!("# {source}");
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config toml")?);
    Ok(())
}
