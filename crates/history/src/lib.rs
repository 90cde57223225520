//! Conversation history persistence for Muster agents.
//!
//! Each agent owns exactly one store entry, keyed by its identity. An entry
//! is the agent's full transcript — an ordered list of `{role, content}`
//! records — and is fully overwritten after every model turn. No two agents
//! ever share a key, so the stores need no cross-agent locking.
//!
//! A persistence failure must never stall an agent: callers log and carry
//! on (the loop treats history as best-effort).

pub mod file_store;
pub mod in_memory;

pub use file_store::FileHistoryStore;
pub use in_memory::MemoryHistoryStore;

use async_trait::async_trait;
use muster_core::TranscriptEntry;
use muster_core::error::HistoryError;

/// A store of per-identity transcripts.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// A human-readable name for this backend (e.g., "file", "memory").
    fn name(&self) -> &str;

    /// Load the transcript for `identity`. A missing entry is an empty
    /// transcript, not an error.
    async fn load(&self, identity: &str) -> Result<Vec<TranscriptEntry>, HistoryError>;

    /// Overwrite the transcript for `identity`.
    async fn save(&self, identity: &str, entries: &[TranscriptEntry]) -> Result<(), HistoryError>;
}
