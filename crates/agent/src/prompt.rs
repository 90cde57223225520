//! System prompt assembly: tool cards and role templates.
//!
//! Tool cards render a registry into human-readable signatures the model
//! can imitate. The templates cover the three roles an agent can play —
//! standalone, clan member, clan coordinator — plus the one-shot planning
//! prompt.

use muster_core::{ToolRegistry, ToolSpec};

use crate::agent::ClanWiring;

/// Render one tool as a signature plus parameter docs.
fn tool_card(spec: &ToolSpec) -> String {
    let mut sig_parts = Vec::with_capacity(spec.params.len());
    for param in &spec.params {
        if param.required {
            sig_parts.push(format!("{}: {}", param.name, param.param_type.tag()));
        } else {
            let default = param
                .default
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "None".into());
            sig_parts.push(format!(
                "{}: {} = {}",
                param.name,
                param.param_type.tag(),
                default
            ));
        }
    }

    let mut card = format!(
        "{}({})\n  {}",
        spec.name,
        sig_parts.join(", "),
        spec.description
    );
    for param in &spec.params {
        let req = if param.required { "required" } else { "optional" };
        card.push_str(&format!(
            "\n  - {} ({}, {}): {}",
            param.name,
            param.param_type.tag(),
            req,
            param.description
        ));
    }
    card
}

/// All registered tools as cards, or a placeholder when there are none.
pub(crate) fn tool_cards(registry: &ToolRegistry) -> String {
    let cards: Vec<String> = registry.specs().iter().map(|s| tool_card(s)).collect();
    if cards.is_empty() {
        "No tools available.".to_string()
    } else {
        cards.join("\n\n")
    }
}

/// Cards for the loop built-ins advertised to clan members. `ask_user`
/// is shown to the coordinator only.
fn builtin_cards(ask_user: bool) -> String {
    let mut cards = String::from(
        "send_message(agent_name: string, message: string, additional_resource: string = None)\n\
         \x20 Send a message to another agent in the clan.\n\
         \x20 - agent_name (string, required): Name of the target agent\n\
         \x20 - message (string, required): Message content\n\
         \x20 - additional_resource (string, optional): Extra context for the recipient\n\n\
         pass_result(result: string)\n\
         \x20 Deliver the final result. Call this when the task is complete.\n\
         \x20 - result (string, required): The final output to deliver",
    );
    if ask_user {
        cards.push_str(
            "\n\nask_user(question: string)\n\
             \x20 Ask the user a clarifying question.\n\
             \x20 - question (string, required): The question to ask",
        );
    }
    cards
}

/// The full tools section: registered tools, plus built-ins when
/// clan-connected.
pub(crate) fn tools_section(registry: &ToolRegistry, wiring: &ClanWiring) -> String {
    let cards = tool_cards(registry);
    if !wiring.clan_connected {
        return cards;
    }
    let builtins = builtin_cards(wiring.ask_user);
    if registry.is_empty() {
        builtins
    } else {
        format!("{cards}\n\n{builtins}")
    }
}

const CALL_RULES: &str = "\
1. Wrap internal reasoning in <think>...</think>. Never show these tags in your final answer.
2. To call a tool, wrap one call in <tool>...</tool>.
   Example: <tool>my_tool(arg1=\"value\", arg2=42)</tool>
3. Strings use double quotes. Numbers are plain. Booleans are True/False.
4. You may call multiple tools per turn (each in its own <tool> block).
5. After tool results come back, use them to continue or answer.
6. Be precise with arguments.";

/// System prompt for a standalone agent.
pub(crate) fn individual_prompt(
    identity: &str,
    description: &str,
    task: &str,
    tools: &str,
) -> String {
    format!(
        "You are {identity}. {description}\n\n\
         Task: {task}\n\n\
         Tools:\n{tools}\n\n\
         Instructions:\n{CALL_RULES}\n\
         7. If no tools are needed, answer directly."
    )
}

/// System prompt for a clan member (non-coordinator).
pub(crate) fn member_prompt(
    identity: &str,
    description: &str,
    task: &str,
    tools: &str,
    wiring: &ClanWiring,
) -> String {
    format!(
        "You are {identity}, an agent in clan \"{clan}\".\n\
         Description: {description}\n\
         Role: {task}\n\
         Mission: {goal}\n\
         Plan: {plan}\n\n\
         Tools:\n{tools}\n\n\
         Instructions:\n{CALL_RULES}\n\n\
         Team communication:\n\
         - Use send_message(agent_name=\"Name\", message=\"...\") to talk to teammates.\n\
         - Use pass_result(result=\"...\") to deliver your final output.\n\
         - Never message yourself.\n\n\
         Team members:\n{roster}\n\
         Shared instructions: {shared}",
        clan = wiring.clan_name,
        goal = wiring.goal,
        plan = wiring.plan.as_deref().unwrap_or(""),
        roster = wiring.roster_text,
        shared = wiring.shared_instruction,
    )
}

/// System prompt for the clan coordinator.
pub(crate) fn manager_prompt(
    identity: &str,
    description: &str,
    task: &str,
    tools: &str,
    wiring: &ClanWiring,
) -> String {
    format!(
        "You are {identity}, the Manager of clan \"{clan}\".\n\
         Description: {description}\n\
         Role: {task}\n\
         Mission: coordinate the team to accomplish \"{goal}\"\n\
         Plan: {plan}\n\n\
         Tools:\n{tools}\n\n\
         Instructions:\n{CALL_RULES}\n\n\
         Team communication:\n\
         - Use send_message(agent_name=\"Name\", message=\"...\") to delegate tasks.\n\
         - Use ask_user(question=\"...\") to ask the user a clarifying question.\n\
         - Use pass_result(result=\"...\") to deliver the final output to the user.\n\
         - Never message yourself.\n\n\
         Team members:\n{roster}\n\
         Shared instructions: {shared}",
        clan = wiring.clan_name,
        goal = wiring.goal,
        plan = wiring.plan.as_deref().unwrap_or(""),
        roster = wiring.roster_text,
        shared = wiring.shared_instruction,
    )
}

/// The one-shot planning prompt for a clan's coordinator.
pub(crate) fn plan_prompt(roster_text: &str, shared_instruction: &str, goal: &str) -> String {
    format!(
        "You are planning the work of an agent team.\n\n\
         Team members:\n{roster_text}\n\
         Shared instructions: {shared_instruction}\n\n\
         Goal: {goal}\n\n\
         Write a short, numbered plan assigning concrete steps to team members\n\
         by name. Plain text only — no markup tags.\n\n\
         Create a plan to accomplish this task:\n{goal}"
    )
}
