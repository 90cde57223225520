//! Call dispatch: built-ins first, then the caller's registry.
//!
//! Dispatch never lets a failure escape — unparsable syntax, unknown
//! names, validation misses, and execution errors all come back as text
//! the model can read and correct on its next turn. The one special case
//! is `pass_result`, whose outcome tells the loop to terminate.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use muster_callparse::{parse_call, repair};
use muster_core::{ParamSpec, ParamType, ToolCall, ToolError, ToolSpec, bind_arguments};

use crate::agent::Agent;
use crate::loop_runner::{LoopContext, unleash_with};
use crate::resolve::resolve;

/// What a dispatched call means for the running loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Feedback text for the next model turn.
    Text(String),
    /// `pass_result` fired: terminate with this answer, skip the rest of
    /// the turn.
    Final(String),
}

/// Dispatch one raw call string from `sender`'s current turn.
pub(crate) async fn dispatch(
    sender: &Arc<Agent>,
    raw_call: &str,
    ctx: &LoopContext,
) -> DispatchOutcome {
    let repaired = repair(raw_call);
    let call = match parse_call(&repaired) {
        Ok(call) => call,
        Err(e) => {
            debug!(agent = sender.identity(), call = raw_call, error = %e, "Unparsable call");
            return DispatchOutcome::Text("Error: not a valid function call.".into());
        }
    };

    match call.name.as_str() {
        "send_message" => send_message(sender, &call, ctx).await,
        "ask_user" => ask_user(sender, &call),
        "pass_result" => pass_result(&call),
        _ => user_tool(sender, &call).await,
    }
}

// --- Built-in specs -------------------------------------------------------

fn send_message_spec() -> ToolSpec {
    ToolSpec::new("send_message", "Send a message to another agent")
        .with_param(ParamSpec::required(
            "agent_name",
            ParamType::String,
            "Name of the target agent",
        ))
        .with_param(ParamSpec::required(
            "message",
            ParamType::String,
            "Message content",
        ))
        .with_param(ParamSpec::optional_no_default(
            "additional_resource",
            ParamType::String,
            "Extra context for the recipient",
        ))
}

fn ask_user_spec() -> ToolSpec {
    ToolSpec::new("ask_user", "Ask the user a question").with_param(ParamSpec::required(
        "question",
        ParamType::String,
        "The question to ask",
    ))
}

fn pass_result_spec() -> ToolSpec {
    ToolSpec::new("pass_result", "Deliver the final result").with_param(ParamSpec::required(
        "result",
        ParamType::String,
        "The final output",
    ))
}

fn bind_builtin(spec: &ToolSpec, call: &ToolCall) -> Result<serde_json::Map<String, Value>, String> {
    bind_arguments(spec, &call.args, &call.kwargs).map_err(|e| format!("Error: {e}"))
}

// --- Built-ins ------------------------------------------------------------

/// Route a message to a teammate and synchronously run its loop.
async fn send_message(sender: &Arc<Agent>, call: &ToolCall, ctx: &LoopContext) -> DispatchOutcome {
    let bound = match bind_builtin(&send_message_spec(), call) {
        Ok(bound) => bound,
        Err(text) => return DispatchOutcome::Text(text),
    };
    // Types are enforced by binding, so the unwraps cannot fire.
    let target_name = bound["agent_name"].as_str().unwrap_or_default();
    let message = bound["message"].as_str().unwrap_or_default();
    let resource = bound.get("additional_resource").and_then(Value::as_str);

    let roster = &ctx.roster;
    let resolved = resolve(
        target_name,
        &roster.names(),
        roster.coordinator_identity(),
    );
    let Some(target) = roster.find(&resolved) else {
        return DispatchOutcome::Text(format!("Agent '{target_name}' not found in clan."));
    };

    if ctx.depth + 1 > ctx.max_depth {
        return DispatchOutcome::Text(format!(
            "Error: delegation depth limit ({}) reached; finish the task yourself or pass_result.",
            ctx.max_depth
        ));
    }

    let tagged = match resource {
        Some(resource) => {
            format!("FROM: {} | {message}\nRESOURCE: {resource}", sender.identity())
        }
        None => format!("FROM: {} | {message}", sender.identity()),
    };

    debug!(
        from = sender.identity(),
        to = target.identity(),
        depth = ctx.depth + 1,
        "Delivering message"
    );

    match unleash_with(target, &tagged, &ctx.deeper()).await {
        Ok(_) => DispatchOutcome::Text(format!("Message delivered to {}.", target.identity())),
        Err(e) => DispatchOutcome::Text(format!("Error: {e}")),
    }
}

/// Block for one line of external input.
fn ask_user(sender: &Arc<Agent>, call: &ToolCall) -> DispatchOutcome {
    let bound = match bind_builtin(&ask_user_spec(), call) {
        Ok(bound) => bound,
        Err(text) => return DispatchOutcome::Text(text),
    };
    let question = bound["question"].as_str().unwrap_or_default();

    match sender.user_channel().ask(question) {
        Ok(answer) => DispatchOutcome::Text(format!("User answered: {answer}")),
        Err(e) => DispatchOutcome::Text(format!("Error: {e}")),
    }
}

/// Signal the loop to terminate with this payload.
fn pass_result(call: &ToolCall) -> DispatchOutcome {
    let bound = match bind_builtin(&pass_result_spec(), call) {
        Ok(bound) => bound,
        Err(text) => return DispatchOutcome::Text(text),
    };
    DispatchOutcome::Final(bound["result"].as_str().unwrap_or_default().to_string())
}

// --- User tools -----------------------------------------------------------

async fn user_tool(sender: &Arc<Agent>, call: &ToolCall) -> DispatchOutcome {
    match sender.tools().invoke(&call.name, &call.args, &call.kwargs).await {
        Ok(result) => DispatchOutcome::Text(result.render()),
        Err(ToolError::NotFound(name)) => {
            DispatchOutcome::Text(format!("Error: tool '{name}' not found."))
        }
        Err(e) => DispatchOutcome::Text(format!("Error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Roster;
    use crate::test_helpers::{scripted_agent, scripted_agent_with_tools};
    use muster_core::ToolRegistry;
    use serde_json::json;

    fn standalone() -> LoopContext {
        LoopContext::standalone()
    }

    #[tokio::test]
    async fn unparsable_call_yields_fixed_error_string() {
        let agent = scripted_agent("A", ["x"]);
        let outcome = dispatch(&agent, "((( nonsense", &standalone()).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Text("Error: not a valid function call.".into())
        );
    }

    #[tokio::test]
    async fn dispatch_agrees_with_direct_parse() {
        let mut tools = ToolRegistry::new();
        tools
            .register_fn(
                ToolSpec::new("echo", "Echo back")
                    .with_param(ParamSpec::required("text", ParamType::String, "Text")),
                |args| Ok(args["text"].clone()),
            )
            .unwrap();
        let agent = scripted_agent_with_tools("A", ["x"], tools);

        let source = r#"echo(text="hello world")"#;
        let direct = parse_call(source).unwrap();
        assert_eq!(direct.name, "echo");
        assert_eq!(direct.kwargs["text"], json!("hello world"));

        let outcome = dispatch(&agent, source, &standalone()).await;
        assert_eq!(outcome, DispatchOutcome::Text("hello world".into()));
    }

    #[tokio::test]
    async fn pass_result_returns_final() {
        let agent = scripted_agent("A", ["x"]);
        let outcome = dispatch(&agent, r#"pass_result(result="done")"#, &standalone()).await;
        assert_eq!(outcome, DispatchOutcome::Final("done".into()));
    }

    #[tokio::test]
    async fn pass_result_missing_argument_degrades_to_text() {
        let agent = scripted_agent("A", ["x"]);
        let outcome = dispatch(&agent, "pass_result()", &standalone()).await;
        match outcome {
            DispatchOutcome::Text(text) => {
                assert!(text.contains("Missing required parameter: result"));
            }
            DispatchOutcome::Final(_) => panic!("must not terminate"),
        }
    }

    #[tokio::test]
    async fn unknown_tool_reports_not_found() {
        let agent = scripted_agent("A", ["x"]);
        let outcome = dispatch(&agent, "frobnicate(x=1)", &standalone()).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Text("Error: tool 'frobnicate' not found.".into())
        );
    }

    #[tokio::test]
    async fn builtins_shadow_registered_tools() {
        // A user tool named pass_result never runs; the built-in wins.
        let mut tools = ToolRegistry::new();
        tools
            .register_fn(
                ToolSpec::new("pass_result", "Impostor")
                    .with_param(ParamSpec::required("result", ParamType::String, "r")),
                |_| Ok(json!("impostor ran")),
            )
            .unwrap();
        let agent = scripted_agent_with_tools("A", ["x"], tools);

        let outcome = dispatch(&agent, r#"pass_result(result="real")"#, &standalone()).await;
        assert_eq!(outcome, DispatchOutcome::Final("real".into()));
    }

    #[tokio::test]
    async fn ask_user_reads_the_channel() {
        use crate::user_io::ScriptedChannel;
        let agent = Arc::new(
            crate::agent::Agent::new(
                Box::new(muster_providers::ScriptedAdapter::new(["x"])),
                "Boss",
                "coordinator",
            )
            .with_history_store(crate::test_helpers::memory_store())
            .with_observer(Arc::new(crate::observer::NullObserver))
            .with_user_channel(Arc::new(ScriptedChannel::new(["blue"]))),
        );

        let outcome = dispatch(&agent, r#"ask_user(question="Favorite color?")"#, &standalone()).await;
        assert_eq!(outcome, DispatchOutcome::Text("User answered: blue".into()));
    }

    #[tokio::test]
    async fn send_message_unknown_agent_reports_not_found() {
        let sender = scripted_agent("A", ["x"]);
        let other = scripted_agent("Scout", ["irrelevant"]);
        let roster = Arc::new(Roster::new(vec![sender.clone(), other], "A"));
        let ctx = LoopContext::for_roster(roster);

        let outcome = dispatch(
            &sender,
            r#"send_message(agent_name="Zzyx", message="hi")"#,
            &ctx,
        )
        .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Text("Agent 'Zzyx' not found in clan.".into())
        );
    }

    #[tokio::test]
    async fn send_message_delivers_and_confirms() {
        let sender = scripted_agent("Boss", ["x"]);
        let worker = scripted_agent("Scout", ["Understood, done."]);
        let roster = Arc::new(Roster::new(vec![sender.clone(), worker], "Boss"));
        let ctx = LoopContext::for_roster(roster);

        let outcome = dispatch(
            &sender,
            r#"send_message(agent_name="scout", message="go")"#,
            &ctx,
        )
        .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Text("Message delivered to Scout.".into())
        );
    }

    #[tokio::test]
    async fn send_message_past_depth_limit_is_refused() {
        let sender = scripted_agent("Boss", ["x"]);
        let worker = scripted_agent("Scout", ["never called"]);
        let roster = Arc::new(Roster::new(vec![sender.clone(), worker], "Boss"));
        let mut ctx = LoopContext::for_roster(roster);
        ctx.depth = ctx.max_depth;

        let outcome = dispatch(
            &sender,
            r#"send_message(agent_name="Scout", message="go")"#,
            &ctx,
        )
        .await;
        match outcome {
            DispatchOutcome::Text(text) => assert!(text.contains("delegation depth limit")),
            DispatchOutcome::Final(_) => panic!("must not terminate"),
        }
    }

    #[tokio::test]
    async fn standalone_send_message_is_not_found() {
        let agent = scripted_agent("A", ["x"]);
        let outcome = dispatch(
            &agent,
            r#"send_message(agent_name="Scout", message="hi")"#,
            &standalone(),
        )
        .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Text("Agent 'Scout' not found in clan.".into())
        );
    }

    #[tokio::test]
    async fn repaired_call_still_dispatches() {
        let agent = scripted_agent("A", ["x"]);
        // Missing closing paren; repair appends it before parsing.
        let outcome = dispatch(&agent, r#"pass_result(result="fixed""#, &standalone()).await;
        assert_eq!(outcome, DispatchOutcome::Final("fixed".into()));
    }
}
