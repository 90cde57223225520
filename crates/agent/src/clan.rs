//! Clan — a roster of agents behind one goal, led by one coordinator.
//!
//! `unleash` runs the two-phase protocol: a single planning model call on
//! the coordinator (its output, stripped of reasoning and markup, becomes
//! the shared plan every member reads), then the coordinator's own loop on
//! the goal. All delegation during execution flows through `send_message`,
//! depth-first on one call stack — there is no separate scheduler.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use muster_callparse::{strip_reasoning, strip_tags};
use muster_core::{Error, Result};
use muster_history::{FileHistoryStore, HistoryStore};

use crate::agent::{Agent, Roster};
use crate::loop_runner::{LoopContext, LoopOutcome, unleash_with};
use crate::prompt;

/// A named group of agents sharing a goal.
pub struct Clan {
    name: String,
    coordinator: Arc<Agent>,
    members: Vec<Arc<Agent>>,
    shared_instruction: String,
    goal: String,
    history: Arc<dyn HistoryStore>,
    output_file: Option<PathBuf>,
    roster: Arc<Roster>,
    roster_text: String,
}

impl std::fmt::Debug for Clan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clan")
            .field("name", &self.name)
            .field("members", &self.members.len())
            .field("shared_instruction", &self.shared_instruction)
            .field("goal", &self.goal)
            .field("output_file", &self.output_file)
            .field("roster_text", &self.roster_text)
            .finish()
    }
}

impl Clan {
    /// Assemble a clan. The coordinator must be one of `members`; the
    /// roster and its formatted description are frozen here.
    pub fn new(
        name: impl Into<String>,
        coordinator: Arc<Agent>,
        members: Vec<Arc<Agent>>,
        shared_instruction: impl Into<String>,
        goal: impl Into<String>,
    ) -> Result<Self> {
        if !members.iter().any(|m| Arc::ptr_eq(m, &coordinator)) {
            return Err(Error::Internal(
                "clan coordinator must be a roster member".into(),
            ));
        }

        let roster_text: String = members
            .iter()
            .map(|member| {
                if Arc::ptr_eq(member, &coordinator) {
                    format!("- {} (Manager): {}\n", member.identity(), member.description())
                } else {
                    format!("- {}: {}\n", member.identity(), member.description())
                }
            })
            .collect();

        let roster = Arc::new(Roster::new(members.clone(), coordinator.identity()));

        Ok(Self {
            name: name.into(),
            coordinator,
            members,
            shared_instruction: shared_instruction.into(),
            goal: goal.into(),
            history: Arc::new(FileHistoryStore::new("history")),
            output_file: None,
            roster,
            roster_text,
        })
    }

    /// Use this store for every member's transcript. Each agent still owns
    /// its own entry, keyed by identity.
    pub fn with_history_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = store;
        self
    }

    /// Shorthand for a shared file store rooted at `dir`.
    pub fn with_history_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.with_history_store(Arc::new(FileHistoryStore::new(dir.into())))
    }

    /// Where the final answer lands. Truncated at the start of `unleash`.
    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn roster_text(&self) -> &str {
        &self.roster_text
    }

    /// Inject clan wiring into every member. Membership and the roster
    /// description are frozen; only the plan changes after this, once,
    /// during planning.
    fn wire_members(&self) {
        for member in &self.members {
            let is_coordinator = Arc::ptr_eq(member, &self.coordinator);
            {
                let mut wiring = member.wiring();
                wiring.clan_connected = true;
                wiring.ask_user = is_coordinator;
                wiring.clan_name = self.name.clone();
                wiring.goal = self.goal.clone();
                wiring.shared_instruction = self.shared_instruction.clone();
                wiring.roster_text = self.roster_text.clone();
                wiring.plan = None;
            }
            member.set_history_store(self.history.clone());
            member.set_sink_path(self.output_file.clone());
        }
    }

    /// Plan, then execute. Returns the coordinator's loop outcome.
    pub async fn unleash(&self) -> Result<LoopOutcome> {
        self.wire_members();

        if let Some(path) = &self.output_file {
            // Truncate up front so a crashed run leaves no stale answer.
            if let Err(e) = std::fs::write(path, "") {
                warn!(path = %path.display(), error = %e, "Failed to truncate output file");
            }
        }

        info!(clan = %self.name, members = self.members.len(), goal = %self.goal, "Clan unleashed");

        // ── Planning phase ──
        let plan_text = {
            let mut model = self.coordinator.model().lock().await;
            model.reset();
            let planning = prompt::plan_prompt(&self.roster_text, &self.shared_instruction, &self.goal);
            let response = model.run(&planning, false).await?;
            model.reset();
            strip_tags(&strip_reasoning(&response))
        };

        self.coordinator.observer().on_plan(&self.name, &plan_text);
        info!(clan = %self.name, "Plan ready");

        // Broadcast the plan read-only to every member, coordinator included.
        for member in &self.members {
            member.wiring().plan = Some(plan_text.clone());
        }

        // ── Execution phase ──
        let ctx = LoopContext::for_roster(self.roster.clone());
        unleash_with(&self.coordinator, &self.goal, &ctx).await
    }
}
