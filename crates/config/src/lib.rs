//! Clan definition files.
//!
//! A clan is described in one TOML file: the clan itself, the model
//! endpoint, and the agent roster. API keys never live in the file — they
//! resolve from the environment (`MUSTER_API_KEY`, then `OPENAI_API_KEY`).
//!
//! ```toml
//! [clan]
//! name = "Research Crew"
//! goal = "Research rust agents and write a summary"
//! shared_instruction = "Keep answers short."
//! output_file = "result.txt"
//!
//! [model]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4o-mini"
//!
//! [[agents]]
//! identity = "Boss"
//! description = "Coordinates the crew"
//! manager = true
//!
//! [[agents]]
//! identity = "Scout"
//! description = "Finds information"
//! task = "Research whatever the Boss asks"
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid clan definition: {0}")]
    Invalid(String),
}

/// The root of a clan definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClanFile {
    pub clan: ClanSection,
    #[serde(default)]
    pub model: ModelSection,
    pub agents: Vec<AgentSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClanSection {
    pub name: String,
    pub goal: String,
    #[serde(default)]
    pub shared_instruction: String,
    #[serde(default = "default_history_dir")]
    pub history_dir: String,
    #[serde(default)]
    pub output_file: Option<String>,
}

fn default_history_dir() -> String {
    "history".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_temperature() -> f32 {
    0.7
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    pub identity: String,
    pub description: String,
    #[serde(default)]
    pub task: String,
    /// Exactly one agent must carry this flag.
    #[serde(default)]
    pub manager: bool,
}

impl ClanFile {
    /// Load and validate a clan definition.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse and validate clan TOML.
    pub fn parse(content: &str, path: &str) -> Result<Self, ConfigError> {
        let file: ClanFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.agents.is_empty() {
            return Err(ConfigError::Invalid("no agents defined".into()));
        }

        let managers = self.agents.iter().filter(|a| a.manager).count();
        if managers != 1 {
            return Err(ConfigError::Invalid(format!(
                "exactly one agent must be the manager, found {managers}"
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for agent in &self.agents {
            if agent.identity.trim().is_empty() {
                return Err(ConfigError::Invalid("agent identity must not be empty".into()));
            }
            if !seen.insert(agent.identity.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate agent identity '{}'",
                    agent.identity
                )));
            }
        }

        Ok(())
    }

    /// The roster entry flagged as manager.
    pub fn manager(&self) -> &AgentSection {
        self.agents
            .iter()
            .find(|a| a.manager)
            .expect("validated clan file has a manager")
    }
}

/// Resolve the model API key from the environment.
///
/// `MUSTER_API_KEY` wins; `OPENAI_API_KEY` is the fallback.
pub fn resolve_api_key() -> Option<String> {
    std::env::var("MUSTER_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok()
        .filter(|key| !key.trim().is_empty())
}
