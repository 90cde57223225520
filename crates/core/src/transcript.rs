//! Transcript records — the conversation history unit.
//!
//! An agent's conversation with its model is an append-only sequence of
//! role/content records, owned exclusively by that agent and persisted to
//! its own history store entry after every model turn.

use serde::{Deserialize, Serialize};

/// The role of a transcript record's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (identity, rules, tool cards)
    System,
    /// Input fed to the model — the task, or tool results from the last turn
    User,
    /// The model's response
    Assistant,
}

/// A single role/content record in an agent's conversation history.
///
/// This is exactly the shape persisted to disk: one JSON array of these
/// per agent identity, fully overwritten after every turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
}

impl TranscriptEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
