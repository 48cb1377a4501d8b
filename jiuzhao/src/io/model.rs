//! Chat-completion transport.
//!
//! The [`ModelClient`] trait decouples the agent loop from the model endpoint.
//! Tests use scripted clients that return predetermined replies without
//! touching the network.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::core::types::Turn;
use crate::io::config::{GenerationConfig, ModelConfig};

/// Source of assistant replies.
pub trait ModelClient {
    /// Return the next assistant message for the full ordered `history`.
    fn chat(&self, history: &[Turn]) -> Result<String>;
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl From<&GenerationConfig> for SamplingParams {
    fn from(cfg: &GenerationConfig) -> Self {
        Self {
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints (OpenAI, Ollama, vLLM, ...).
pub struct OpenAiChatClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
    params: SamplingParams,
}

impl OpenAiChatClient {
    pub fn new(model: &ModelConfig, generation: &GenerationConfig) -> Result<Self> {
        Self::with_timeout(model, SamplingParams::from(generation), generation.timeout())
    }

    pub fn with_timeout(
        model: &ModelConfig,
        params: SamplingParams,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            endpoint: chat_endpoint(&model.base_url),
            model: model.name.clone(),
            api_key: model.resolve_api_key(),
            params,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ModelClient for OpenAiChatClient {
    #[instrument(skip_all, fields(model = %self.model, turns = history.len()))]
    fn chat(&self, history: &[Turn]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: history,
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };
        debug!(endpoint = %self.endpoint, "sending chat request");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        let body = response.text().context("read response body")?;
        if !status.is_success() {
            warn!(%status, "model endpoint returned error status");
            return Err(anyhow!("model endpoint returned {status}: {}", body.trim()));
        }
        parse_chat_response(&body)
    }
}

/// `<base_url>/chat/completions`, tolerating a trailing slash.
fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Extract the first choice's content from a chat-completion body.
fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body).context("parse chat response")?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();
    if content.trim().is_empty() {
        return Err(anyhow!("empty response from model"));
    }
    Ok(content)
}
