//! In-memory history store, for tests and ephemeral runs.

use async_trait::async_trait;
use muster_core::TranscriptEntry;
use muster_core::error::HistoryError;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::HistoryStore;

/// A transcript store that lives and dies with the process.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<HashMap<String, Vec<TranscriptEntry>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities with a stored transcript.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, identity: &str) -> Result<Vec<TranscriptEntry>, HistoryError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, identity: &str, entries: &[TranscriptEntry]) -> Result<(), HistoryError> {
        self.entries
            .lock()
            .unwrap()
            .insert(identity.to_string(), entries.to_vec());
        Ok(())
    }
}
