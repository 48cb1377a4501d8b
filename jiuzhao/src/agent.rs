//! Orchestration loop: query the model, run requested tools, feed results back.
//!
//! One [`Agent`] owns one conversation. Each [`Agent::run`] call appends the
//! caller's input as a user turn and then alternates between model queries and
//! tool dispatch until one of:
//!
//! - the reply carries no action envelope (control returns to the caller),
//! - the reply carries no envelope and announces a verified result,
//! - the per-invocation turn budget runs out.
//!
//! Every failure inside an iteration is written into the transcript and the
//! loop keeps going; nothing here returns an error once the agent is built.

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::arguments::ArgumentBag;
use crate::core::budget::TurnBudget;
use crate::core::envelope::{parse_action_request, signals_completion};
use crate::core::history::ConversationHistory;
use crate::core::types::{ActionRequest, Turn, signals_success};
use crate::io::config::AgentConfig;
use crate::io::model::ModelClient;
use crate::io::prompt::render_system_prompt;
use crate::tools::ToolRegistry;

/// Notice emitted when a tool result carries the success marker.
pub const VERIFIED_NOTICE: &str = "Proof verified by Lean compiler!";

/// Presentation hooks for one agent session.
///
/// All methods default to no-ops so sinks only implement what they show.
pub trait AgentObserver {
    /// About to query the model for turn `turn` of `max`.
    fn on_thinking(&mut self, _turn: u32, _max: u32) {}
    fn on_assistant_message(&mut self, _text: &str) {}
    /// A decoded tool call is about to be dispatched.
    fn on_tool_call(&mut self, _name: &str, _args: &ArgumentBag) {}
    /// Rendered tool result, untruncated.
    fn on_tool_result(&mut self, _name: &str, _text: &str) {}
    fn on_error(&mut self, _text: &str) {}
    fn on_success(&mut self, _text: &str) {}
    /// The model announced a verified result without requesting a tool.
    fn on_completed(&mut self, _text: &str) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AgentObserver for NoopObserver {}

/// Where the agent sits in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    /// Built, no input received yet.
    Seed,
    AwaitingModel,
    /// An action request was extracted and is being decoded or dispatched.
    ActionPending,
    /// Control is back with the caller until the next `run`.
    AwaitingUser,
}

/// Why `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStop {
    /// The model reported a verified result without requesting a tool.
    Completed,
    /// The model replied without an action envelope.
    AwaitingUser,
    /// Every model query in the budget was used.
    BudgetExhausted,
}

/// Summary of one `run` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub model_requests: u32,
    pub stop: LoopStop,
    /// Whether any tool result in this invocation carried the success marker.
    pub verified: bool,
}

/// Loop limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    /// Model queries per `run` invocation.
    pub max_turns: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self { max_turns: 10 }
    }
}

impl From<&AgentConfig> for AgentSettings {
    fn from(cfg: &AgentConfig) -> Self {
        Self {
            max_turns: cfg.generation.max_turns,
        }
    }
}

/// Conversation state plus the model and tools it drives.
pub struct Agent<M: ModelClient> {
    model: M,
    registry: ToolRegistry,
    settings: AgentSettings,
    history: ConversationHistory,
    phase: AgentPhase,
}

impl<M: ModelClient> Agent<M> {
    /// Build an agent whose history starts with the system briefing for `registry`.
    pub fn new(model: M, registry: ToolRegistry, settings: AgentSettings) -> Result<Self> {
        let briefing =
            render_system_prompt(&registry.definitions()).context("render system briefing")?;
        debug!(tools = ?registry.names(), max_turns = settings.max_turns, "agent ready");
        Ok(Self {
            model,
            registry,
            settings,
            history: ConversationHistory::with_system(briefing),
            phase: AgentPhase::Seed,
        })
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    /// Append `input` as a user turn and drive the loop until a stop condition.
    #[instrument(skip_all, fields(max_turns = self.settings.max_turns))]
    pub fn run(&mut self, input: &str, observer: &mut impl AgentObserver) -> RunOutcome {
        self.history.push_user(input);
        let mut budget = TurnBudget::new(self.settings.max_turns);
        let mut verified = false;

        while let Some(turn) = budget.take() {
            self.phase = AgentPhase::AwaitingModel;
            observer.on_thinking(turn, budget.max());
            let reply = self.request_reply();
            self.history.push_assistant(reply.as_str());
            observer.on_assistant_message(&reply);

            let Some(request) = parse_action_request(&reply) else {
                let stop = if signals_completion(&reply) {
                    observer.on_completed(&reply);
                    LoopStop::Completed
                } else {
                    LoopStop::AwaitingUser
                };
                info!(turn, ?stop, "no action requested");
                return self.finish(budget, stop, verified);
            };

            self.phase = AgentPhase::ActionPending;
            if self.handle_action(&request, observer) {
                verified = true;
            }
        }

        info!(used = budget.used(), "turn budget exhausted");
        self.finish(budget, LoopStop::BudgetExhausted, verified)
    }

    fn finish(&mut self, budget: TurnBudget, stop: LoopStop, verified: bool) -> RunOutcome {
        self.phase = AgentPhase::AwaitingUser;
        RunOutcome {
            model_requests: budget.used(),
            stop,
            verified,
        }
    }

    /// Next assistant text; transport failures become the reply itself.
    fn request_reply(&self) -> String {
        match self.model.chat(self.history.turns()) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "model request failed");
                format!("Error: model request failed: {err:#}")
            }
        }
    }

    /// Decode and dispatch one request. Returns whether the result signals success.
    fn handle_action(&mut self, request: &ActionRequest, observer: &mut impl AgentObserver) -> bool {
        let args = match ArgumentBag::decode(&request.raw_arguments) {
            Ok(args) => args,
            Err(err) => {
                let text = format!("Error: {err}");
                debug!(tool = %request.tool_name, %err, "argument decode failed");
                observer.on_error(&text);
                self.history.push(Turn::user(text));
                return false;
            }
        };

        observer.on_tool_call(&request.tool_name, &args);
        let outcome = self.registry.dispatch(&request.tool_name, &args);
        let text = outcome.render();
        observer.on_tool_result(&request.tool_name, &text);
        self.history.push_user(format!(
            "Tool '{}' output:\n{}",
            request.tool_name, text
        ));

        let success = signals_success(&text);
        if success {
            observer.on_success(VERIFIED_NOTICE);
        }
        success
    }
}
