//! Agent configuration stored under `~/.jiuzhao/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

/// Environment variable consulted when the config has no API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Key sent to local endpoints that ignore authentication.
pub const FALLBACK_API_KEY: &str = "ollama";

/// Agent configuration (TOML).
///
/// Missing tables and fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AgentConfig {
    pub model: ModelConfig,
    pub generation: GenerationConfig,
    pub verifier: VerifierConfig,
    pub search: SearchConfig,
}

/// Chat-completion endpoint used for every model query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    /// OpenAI-compatible base URL (the client appends `/chat/completions`).
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "rwkv-7-prover-1.5b".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: None,
        }
    }
}

impl ModelConfig {
    /// Config key, then `$OPENAI_API_KEY`, then a placeholder for local servers.
    pub fn resolve_api_key(&self) -> String {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .unwrap_or_else(|| FALLBACK_API_KEY.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_tokens: u32,
    /// Model queries allowed per `Agent::run` invocation.
    pub max_turns: u32,
    /// Per-request timeout for the model endpoint.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 4096,
            max_turns: 10,
            timeout_secs: 60,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// External proof checker commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VerifierConfig {
    /// Single-file check; the file path is appended as the last argument.
    pub check_command: Vec<String>,
    /// Whole-project build, run without extra arguments.
    pub build_command: Vec<String>,
    pub check_timeout_secs: u64,
    pub build_timeout_secs: u64,
    /// Bound on captured stdout/stderr per stream.
    pub output_limit_bytes: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            check_command: vec!["lean".to_string()],
            build_command: vec!["lake".to_string(), "build".to_string()],
            check_timeout_secs: 30,
            build_timeout_secs: 120,
            output_limit_bytes: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// File extension (without dot) scanned by `project_search`.
    pub extension: String,
    /// Directory names never descended into.
    pub excluded_dirs: Vec<String>,
    pub max_results: usize,
    /// Matched lines are cut to this many characters.
    pub line_budget_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            extension: "lean".to_string(),
            excluded_dirs: vec![
                ".git".to_string(),
                ".lake".to_string(),
                "lake-packages".to_string(),
            ],
            max_results: 20,
            line_budget_chars: 100,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.name.trim().is_empty() {
            return Err(anyhow!("model.name must be non-empty"));
        }
        if self.model.base_url.trim().is_empty() {
            return Err(anyhow!("model.base_url must be non-empty"));
        }
        let generation = &self.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(anyhow!("generation.temperature must be within 0.0..=2.0"));
        }
        if generation.max_tokens == 0 {
            return Err(anyhow!("generation.max_tokens must be > 0"));
        }
        if generation.max_turns == 0 {
            return Err(anyhow!("generation.max_turns must be > 0"));
        }
        if generation.timeout_secs == 0 {
            return Err(anyhow!("generation.timeout_secs must be > 0"));
        }
        let verifier = &self.verifier;
        if verifier.check_command.is_empty() || verifier.check_command[0].trim().is_empty() {
            return Err(anyhow!("verifier.check_command must be a non-empty array"));
        }
        if verifier.build_command.is_empty() || verifier.build_command[0].trim().is_empty() {
            return Err(anyhow!("verifier.build_command must be a non-empty array"));
        }
        if verifier.check_timeout_secs == 0 || verifier.build_timeout_secs == 0 {
            return Err(anyhow!("verifier timeouts must be > 0"));
        }
        if verifier.output_limit_bytes == 0 {
            return Err(anyhow!("verifier.output_limit_bytes must be > 0"));
        }
        if self.search.extension.trim().is_empty() {
            return Err(anyhow!("search.extension must be non-empty"));
        }
        if self.search.max_results == 0 {
            return Err(anyhow!("search.max_results must be > 0"));
        }
        if self.search.line_budget_chars == 0 {
            return Err(anyhow!("search.line_budget_chars must be > 0"));
        }
        Ok(())
    }
}

/// `~/.jiuzhao/config.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    let dirs = BaseDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".jiuzhao").join("config.toml"))
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AgentConfig::default()`.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    if !path.exists() {
        let cfg = AgentConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AgentConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &AgentConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
