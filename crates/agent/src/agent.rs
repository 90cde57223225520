//! The Agent — identity, model state, tools, and clan wiring.
//!
//! An agent exclusively owns its model adapter (and with it the
//! conversation transcript) behind a `Mutex`, locked per operation and
//! never across a delegation. Clan wiring is the mutable state a `Clan`
//! injects at assembly: connection flags, the frozen roster description,
//! the shared instruction, and — once planning has run — the plan text.

use muster_history::{FileHistoryStore, HistoryStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;

use muster_core::{ModelAdapter, ToolRegistry};

use crate::observer::{LoopObserver, TracingObserver};
use crate::user_io::{StdinChannel, UserChannel};

/// State injected by a clan at assembly time, plus the per-run plan.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClanWiring {
    pub clan_connected: bool,
    pub ask_user: bool,
    pub clan_name: String,
    pub goal: String,
    pub shared_instruction: String,
    /// The frozen, full roster description every member sees.
    pub roster_text: String,
    /// Plan text from the clan's planning phase, read-only thereafter.
    pub plan: Option<String>,
}

/// A single agent: one identity, one model, one tool registry.
pub struct Agent {
    identity: String,
    description: String,
    task: String,
    model: Mutex<Box<dyn ModelAdapter>>,
    tools: ToolRegistry,
    history: StdMutex<Arc<dyn HistoryStore>>,
    sink: StdMutex<Option<PathBuf>>,
    observer: Arc<dyn LoopObserver>,
    user_channel: Arc<dyn UserChannel>,
    wiring: StdMutex<ClanWiring>,
}

impl Agent {
    /// Create an agent bound to a model adapter.
    ///
    /// Defaults: no task, no tools, history files in the current directory
    /// (one `<identity>.json` per agent), tracing observer, stdin user
    /// channel.
    pub fn new(
        model: Box<dyn ModelAdapter>,
        identity: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            description: description.into(),
            task: String::new(),
            model: Mutex::new(model),
            tools: ToolRegistry::new(),
            history: StdMutex::new(Arc::new(FileHistoryStore::new("."))),
            sink: StdMutex::new(None),
            observer: Arc::new(TracingObserver),
            user_channel: Arc::new(StdinChannel),
            wiring: StdMutex::new(ClanWiring::default()),
        }
    }

    /// The standing duty this agent carries inside a clan.
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    /// Where the final answer is written on terminal success.
    pub fn with_output_file(self, path: impl Into<PathBuf>) -> Self {
        *self.sink.lock().unwrap() = Some(path.into());
        self
    }

    pub fn with_history_store(self, store: Arc<dyn HistoryStore>) -> Self {
        *self.history.lock().unwrap() = store;
        self
    }

    /// Shorthand for a file store rooted at `dir`.
    pub fn with_history_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.with_history_store(Arc::new(FileHistoryStore::new(dir.into())))
    }

    pub fn with_observer(mut self, observer: Arc<dyn LoopObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_user_channel(mut self, channel: Arc<dyn UserChannel>) -> Self {
        self.user_channel = channel;
        self
    }

    // --- Accessors ---

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Whether this agent may query the end user (coordinator only).
    pub fn can_ask_user(&self) -> bool {
        self.wiring.lock().unwrap().ask_user
    }

    pub(crate) fn model(&self) -> &Mutex<Box<dyn ModelAdapter>> {
        &self.model
    }

    pub(crate) fn history_store(&self) -> Arc<dyn HistoryStore> {
        self.history.lock().unwrap().clone()
    }

    pub(crate) fn set_history_store(&self, store: Arc<dyn HistoryStore>) {
        *self.history.lock().unwrap() = store;
    }

    pub(crate) fn sink_path(&self) -> Option<PathBuf> {
        self.sink.lock().unwrap().clone()
    }

    pub(crate) fn set_sink_path(&self, path: Option<PathBuf>) {
        *self.sink.lock().unwrap() = path;
    }

    pub(crate) fn observer(&self) -> &Arc<dyn LoopObserver> {
        &self.observer
    }

    pub(crate) fn user_channel(&self) -> &Arc<dyn UserChannel> {
        &self.user_channel
    }

    pub(crate) fn wiring(&self) -> std::sync::MutexGuard<'_, ClanWiring> {
        self.wiring.lock().unwrap()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("identity", &self.identity)
            .field("task", &self.task)
            .finish()
    }
}

/// The frozen membership of a clan: every member (coordinator included)
/// plus the coordinator's identity for synonym routing.
pub struct Roster {
    members: Vec<Arc<Agent>>,
    coordinator: String,
}

impl Roster {
    pub fn new(members: Vec<Arc<Agent>>, coordinator: impl Into<String>) -> Self {
        Self {
            members,
            coordinator: coordinator.into(),
        }
    }

    /// A roster with nobody on it — the standalone-agent context.
    pub fn empty() -> Self {
        Self {
            members: Vec::new(),
            coordinator: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.identity()).collect()
    }

    pub fn coordinator_identity(&self) -> &str {
        &self.coordinator
    }

    /// Find a member by exact identity.
    pub fn find(&self, identity: &str) -> Option<&Arc<Agent>> {
        self.members.iter().find(|m| m.identity() == identity)
    }

    pub fn members(&self) -> &[Arc<Agent>] {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted_agent;

    #[test]
    fn builder_sets_fields() {
        let agent = scripted_agent("Scout", ["hi"]);
        assert_eq!(agent.identity(), "Scout");
        assert!(!agent.can_ask_user());
        assert!(agent.tools().is_empty());
    }

    #[test]
    fn roster_finds_by_exact_identity() {
        let a = scripted_agent("Atlas", ["x"]);
        let b = scripted_agent("Scout", ["y"]);
        let roster = Roster::new(vec![a, b], "Atlas");

        assert!(roster.find("Scout").is_some());
        assert!(roster.find("scout").is_none());
        assert_eq!(roster.coordinator_identity(), "Atlas");
        assert_eq!(roster.names(), vec!["Atlas", "Scout"]);
    }

    #[test]
    fn empty_roster_has_no_coordinator() {
        let roster = Roster::empty();
        assert!(roster.is_empty());
        assert_eq!(roster.coordinator_identity(), "");
    }
}
