//! System briefing rendered once per agent.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

/// Name the agent introduces itself with.
pub const AGENT_NAME: &str = "Jiuzhao";

/// Render the system turn, embedding the tool catalog verbatim.
pub fn render_system_prompt(tool_catalog: &str) -> Result<String> {
    let mut env = Environment::new();
    // Template name has no extension, so no HTML auto-escaping of `<TOOL ...>`.
    env.add_template("system", SYSTEM_TEMPLATE)
        .context("load system template")?;
    let template = env.get_template("system").context("get system template")?;
    let rendered = template
        .render(context! {
            agent_name => AGENT_NAME,
            tools => tool_catalog.trim(),
        })
        .context("render system template")?;
    Ok(rendered)
}
