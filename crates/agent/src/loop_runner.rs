//! The per-agent turn loop.
//!
//! States: `AwaitingModel → ExecutingTools → (AwaitingModel | Terminated)`.
//! Each turn sends the current input to the model, persists the transcript,
//! extracts tool calls in document order, and dispatches them one by one.
//! The loop terminates when a turn produces no calls (the stripped response
//! is the answer), when `pass_result` fires (its payload is the answer and
//! the turn's remaining calls are skipped), or when the turn budget runs
//! out (the last raw response comes back flagged incomplete).
//!
//! No failure inside parsing or dispatch ever aborts the loop — every
//! failure becomes feedback text so a later turn can self-correct. Only
//! model transport errors propagate.

use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, info, warn};

use muster_callparse::{extract_tool_calls, first_reasoning, strip_reasoning};
use muster_core::Result;
use muster_history::HistoryStore;

use crate::agent::{Agent, Roster};
use crate::dispatch::{DispatchOutcome, dispatch};
use crate::prompt;

/// Model turns before a loop gives up.
pub const TURN_BUDGET: usize = 10;

/// How deep `send_message` delegation chains may nest.
pub const MAX_DELEGATION_DEPTH: usize = 8;

/// The execution context a loop runs in: who else is reachable, and how
/// deep in a delegation chain this frame sits.
#[derive(Clone)]
pub struct LoopContext {
    pub roster: Arc<Roster>,
    pub depth: usize,
    pub max_depth: usize,
}

impl LoopContext {
    /// Context for an agent running outside any clan.
    pub fn standalone() -> Self {
        Self {
            roster: Arc::new(Roster::empty()),
            depth: 0,
            max_depth: MAX_DELEGATION_DEPTH,
        }
    }

    /// Context for a clan run.
    pub fn for_roster(roster: Arc<Roster>) -> Self {
        Self {
            roster,
            depth: 0,
            max_depth: MAX_DELEGATION_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The context one delegation deeper.
    pub fn deeper(&self) -> Self {
        Self {
            roster: self.roster.clone(),
            depth: self.depth + 1,
            max_depth: self.max_depth,
        }
    }
}

/// How a loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    /// The final answer — or the last raw model response when incomplete.
    pub answer: String,
    /// False when the turn budget ran out before a terminal condition.
    pub complete: bool,
    /// Model turns consumed.
    pub turns: usize,
}

/// Run an agent on a task outside any clan.
pub async fn unleash(agent: &Arc<Agent>, task: &str) -> Result<LoopOutcome> {
    unleash_with(agent, task, &LoopContext::standalone()).await
}

/// Run an agent on a task within a delegation context.
///
/// Boxed because delegation recurses: `send_message` drives the target
/// agent's loop on the same call stack.
pub fn unleash_with<'a>(
    agent: &'a Arc<Agent>,
    task: &'a str,
    ctx: &'a LoopContext,
) -> BoxFuture<'a, Result<LoopOutcome>> {
    Box::pin(run_loop(agent, task, ctx))
}

async fn run_loop(agent: &Arc<Agent>, task: &str, ctx: &LoopContext) -> Result<LoopOutcome> {
    let identity = agent.identity().to_string();
    let store = agent.history_store();

    // Prior transcript is best-effort: a read failure starts fresh.
    let prior = match store.load(&identity).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(agent = %identity, error = %e, "Failed to load history, starting fresh");
            Vec::new()
        }
    };

    {
        let mut model = agent.model().lock().await;
        model.reset();
        model.load_transcript(prior);
        let system = {
            let wiring = agent.wiring();
            let tools = prompt::tools_section(agent.tools(), &wiring);
            if wiring.clan_connected {
                if wiring.ask_user {
                    prompt::manager_prompt(
                        &identity,
                        agent.description(),
                        agent.task(),
                        &tools,
                        &wiring,
                    )
                } else {
                    prompt::member_prompt(
                        &identity,
                        agent.description(),
                        agent.task(),
                        &tools,
                        &wiring,
                    )
                }
            } else {
                prompt::individual_prompt(&identity, agent.description(), task, &tools)
            }
        };
        model.set_system_prompt(&system);
    }

    agent.observer().on_task_start(&identity, task);
    info!(agent = %identity, depth = ctx.depth, "Agent loop starting");

    let mut current_input = task.to_string();
    let mut last_response = String::new();

    for turn in 1..=TURN_BUDGET {
        debug!(agent = %identity, turn, "Model turn");

        let response = {
            let mut model = agent.model().lock().await;
            let response = model.run(&current_input, true).await?;
            let snapshot = model.transcript().to_vec();
            drop(model);

            // Persist after every model turn, independent of tool outcomes.
            if let Err(e) = store.save(&identity, &snapshot).await {
                warn!(agent = %identity, error = %e, "Failed to persist history");
            }
            response
        };
        last_response = response.clone();

        if let Some(reasoning) = first_reasoning(&response) {
            agent.observer().on_reasoning(&identity, &reasoning);
        }

        let calls = extract_tool_calls(&response);

        if calls.is_empty() {
            let answer = strip_reasoning(&response);
            finish(agent, &identity, &answer);
            return Ok(LoopOutcome {
                answer,
                complete: true,
                turns: turn,
            });
        }

        let mut outputs = Vec::with_capacity(calls.len());
        for call in &calls {
            match dispatch(agent, call, ctx).await {
                DispatchOutcome::Final(result) => {
                    // pass_result supersedes everything else this turn.
                    finish(agent, &identity, &result);
                    return Ok(LoopOutcome {
                        answer: result,
                        complete: true,
                        turns: turn,
                    });
                }
                DispatchOutcome::Text(result) => {
                    agent.observer().on_tool_call(&identity, call, &result);
                    outputs.push(format!("Tool `{call}` returned:\n{result}"));
                }
            }
        }

        current_input = outputs.join("\n\n");
    }

    warn!(agent = %identity, budget = TURN_BUDGET, "Turn budget exhausted");
    Ok(LoopOutcome {
        answer: last_response,
        complete: false,
        turns: TURN_BUDGET,
    })
}

/// Terminal-success bookkeeping: notify the observer and write the output
/// sink, if one is configured. Sink failures never fail the loop.
fn finish(agent: &Arc<Agent>, identity: &str, answer: &str) {
    agent.observer().on_final_answer(identity, answer);
    if let Some(path) = agent.sink_path() {
        if let Err(e) = std::fs::write(&path, answer) {
            warn!(agent = %identity, path = %path.display(), error = %e, "Failed to write output file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{memory_store, scripted_agent, scripted_agent_with_tools};
    use muster_core::{ParamSpec, ParamType, ToolSpec};
    use serde_json::json;

    #[tokio::test]
    async fn plain_answer_terminates_first_turn() {
        let agent = scripted_agent("Solo", ["<think>easy</think>The answer is 4."]);
        let outcome = unleash(&agent, "What is 2+2?").await.unwrap();

        assert!(outcome.complete);
        assert_eq!(outcome.turns, 1);
        assert_eq!(outcome.answer, "The answer is 4.");
    }

    #[tokio::test]
    async fn tool_turn_then_answer() {
        let mut tools = muster_core::ToolRegistry::new();
        tools
            .register_fn(
                ToolSpec::new("add", "Add two integers")
                    .with_param(ParamSpec::required("a", ParamType::Integer, "First"))
                    .with_param(ParamSpec::required("b", ParamType::Integer, "Second")),
                |args| {
                    let a = args["a"].as_i64().unwrap_or(0);
                    let b = args["b"].as_i64().unwrap_or(0);
                    Ok(json!(a + b))
                },
            )
            .unwrap();

        let agent = scripted_agent_with_tools(
            "Solo",
            ["<tool>add(a=2, b=3)</tool>", "The sum is 5."],
            tools,
        );
        let outcome = unleash(&agent, "Add 2 and 3").await.unwrap();

        assert!(outcome.complete);
        assert_eq!(outcome.turns, 2);
        assert_eq!(outcome.answer, "The sum is 5.");
    }

    #[tokio::test]
    async fn pass_result_short_circuits_remaining_calls() {
        let mut tools = muster_core::ToolRegistry::new();
        tools
            .register_fn(
                ToolSpec::new("add", "Add two integers")
                    .with_param(ParamSpec::required("a", ParamType::Integer, "First"))
                    .with_param(ParamSpec::required("b", ParamType::Integer, "Second")),
                |_| Ok(json!("never surfaced")),
            )
            .unwrap();

        // add runs first, then pass_result fires; a third call would be skipped.
        let agent = scripted_agent_with_tools(
            "Solo",
            [r#"<tool>add(a=1, b=2)</tool><tool>pass_result(result="done")</tool><tool>add(a=9, b=9)</tool>"#],
            tools,
        );
        let outcome = unleash(&agent, "finish up").await.unwrap();

        assert!(outcome.complete);
        assert_eq!(outcome.answer, "done");
        assert_eq!(outcome.turns, 1);
    }

    #[tokio::test]
    async fn turn_budget_exhaustion_flags_incomplete() {
        let agent = scripted_agent_repeating("Churner", "<tool>pass_result()</tool>");
        let outcome = unleash(&agent, "never ends").await.unwrap();

        assert!(!outcome.complete);
        assert_eq!(outcome.turns, TURN_BUDGET);
        // The last raw response comes back untouched.
        assert_eq!(outcome.answer, "<tool>pass_result()</tool>");
    }

    fn scripted_agent_repeating(identity: &str, response: &str) -> Arc<Agent> {
        use muster_providers::ScriptedAdapter;
        Arc::new(
            Agent::new(
                Box::new(ScriptedAdapter::repeating(response)),
                identity,
                "test agent",
            )
            .with_history_store(memory_store())
            .with_observer(Arc::new(crate::observer::NullObserver)),
        )
    }

    #[tokio::test]
    async fn unparsable_call_feeds_error_back() {
        let agent = scripted_agent(
            "Solo",
            ["<tool>this is ((( not a call</tool>", "Recovered."],
        );
        let outcome = unleash(&agent, "try").await.unwrap();

        assert!(outcome.complete);
        assert_eq!(outcome.answer, "Recovered.");
        assert_eq!(outcome.turns, 2);
    }

    #[tokio::test]
    async fn history_is_persisted_every_turn() {
        let store = memory_store();
        let agent = Arc::new(
            Agent::new(
                Box::new(muster_providers::ScriptedAdapter::new([
                    "<tool>bogus()</tool>",
                    "Done.",
                ])),
                "Memo",
                "test agent",
            )
            .with_history_store(store.clone())
            .with_observer(Arc::new(crate::observer::NullObserver)),
        );

        unleash(&agent, "task").await.unwrap();

        let saved = store.load("Memo").await.unwrap();
        // Two turns, two user/assistant pairs.
        assert_eq!(saved.len(), 4);
        assert_eq!(saved[0].content, "task");
    }

    #[tokio::test]
    async fn output_sink_is_overwritten_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answer.txt");
        std::fs::write(&path, "stale").unwrap();

        let agent = Arc::new(
            Agent::new(
                Box::new(muster_providers::ScriptedAdapter::new(["Fresh answer."])),
                "Writer",
                "test agent",
            )
            .with_history_store(memory_store())
            .with_observer(Arc::new(crate::observer::NullObserver))
            .with_output_file(&path),
        );

        unleash(&agent, "write").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Fresh answer.");
    }

    #[tokio::test]
    async fn model_transport_error_propagates() {
        // An exhausted strict script is the stand-in for a dead network.
        let agent = scripted_agent("Solo", Vec::<String>::new());
        assert!(unleash(&agent, "task").await.is_err());
    }
}
