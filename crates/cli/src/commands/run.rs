//! `muster run` — run a single agent on a task.

use std::sync::Arc;

use muster_agent::{Agent, unleash};
use muster_providers::OpenAiCompatAdapter;

pub async fn run(
    task: String,
    model: Option<String>,
    base_url: Option<String>,
    output: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = super::require_api_key()?;

    let model = model.unwrap_or_else(|| "gpt-4o-mini".into());
    let base_url = base_url.unwrap_or_else(|| "https://api.openai.com/v1".into());
    let adapter = OpenAiCompatAdapter::new("openai-compat", base_url, api_key, model);

    let mut agent = Agent::new(
        Box::new(adapter),
        "Assistant",
        "A capable general-purpose agent",
    )
    .with_tools(muster_tools::default_registry());
    if let Some(path) = &output {
        agent = agent.with_output_file(path);
    }
    let agent = Arc::new(agent);

    let outcome = unleash(&agent, &task).await?;

    if !outcome.complete {
        tracing::warn!(turns = outcome.turns, "Turn budget exhausted; answer may be incomplete");
    }
    println!("{}", outcome.answer);

    Ok(())
}
