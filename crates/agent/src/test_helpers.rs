//! Shared helpers for loop, dispatch, and clan tests.

use std::sync::Arc;

use muster_core::ToolRegistry;
use muster_history::MemoryHistoryStore;
use muster_providers::ScriptedAdapter;

use crate::agent::Agent;
use crate::observer::NullObserver;

pub fn memory_store() -> Arc<MemoryHistoryStore> {
    Arc::new(MemoryHistoryStore::new())
}

/// An agent that replays `responses`, with in-memory history and a silent
/// observer.
pub fn scripted_agent<S: Into<String>>(
    identity: &str,
    responses: impl IntoIterator<Item = S>,
) -> Arc<Agent> {
    Arc::new(
        Agent::new(
            Box::new(ScriptedAdapter::new(responses)),
            identity,
            format!("{identity} description"),
        )
        .with_history_store(memory_store())
        .with_observer(Arc::new(NullObserver)),
    )
}

/// Same, with a tool registry bound.
pub fn scripted_agent_with_tools<S: Into<String>>(
    identity: &str,
    responses: impl IntoIterator<Item = S>,
    tools: ToolRegistry,
) -> Arc<Agent> {
    Arc::new(
        Agent::new(
            Box::new(ScriptedAdapter::new(responses)),
            identity,
            format!("{identity} description"),
        )
        .with_tools(tools)
        .with_history_store(memory_store())
        .with_observer(Arc::new(NullObserver)),
    )
}
