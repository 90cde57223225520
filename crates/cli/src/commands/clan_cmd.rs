//! `muster clan` — assemble a clan from a TOML file and unleash it.

use std::sync::Arc;

use muster_agent::{Agent, Clan};
use muster_config::ClanFile;
use muster_providers::OpenAiCompatAdapter;

pub async fn run(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file = ClanFile::load(config_path)?;
    let api_key = super::require_api_key()?;

    // Every agent gets its own adapter — model state is never shared.
    let mut members = Vec::with_capacity(file.agents.len());
    let mut coordinator = None;
    for section in &file.agents {
        let mut adapter = OpenAiCompatAdapter::new(
            "openai-compat",
            &file.model.base_url,
            &api_key,
            &file.model.model,
        )
        .with_temperature(file.model.temperature);
        if let Some(max_tokens) = file.model.max_tokens {
            adapter = adapter.with_max_tokens(max_tokens);
        }

        let agent = Arc::new(
            Agent::new(Box::new(adapter), &section.identity, &section.description)
                .with_task(&section.task)
                .with_tools(muster_tools::default_registry()),
        );
        if section.manager {
            coordinator = Some(agent.clone());
        }
        members.push(agent);
    }
    let coordinator = coordinator.expect("validated clan file has a manager");

    let mut clan = Clan::new(
        &file.clan.name,
        coordinator,
        members,
        &file.clan.shared_instruction,
        &file.clan.goal,
    )?
    .with_history_dir(&file.clan.history_dir);
    if let Some(path) = &file.clan.output_file {
        clan = clan.with_output_file(path);
    }

    let outcome = clan.unleash().await?;

    if !outcome.complete {
        tracing::warn!(turns = outcome.turns, "Turn budget exhausted; answer may be incomplete");
    }
    println!("{}", outcome.answer);
    if let Some(path) = &file.clan.output_file {
        tracing::info!(path, "Final answer written");
    }

    Ok(())
}
