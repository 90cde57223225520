//! File-based history store — one JSON file per agent identity.
//!
//! Storage location: `<dir>/<identity>.json`, holding a pretty-printed
//! array of `{role, content}` records. Simple, portable, and
//! human-inspectable; the file is fully rewritten on every save.

use async_trait::async_trait;
use muster_core::TranscriptEntry;
use muster_core::error::HistoryError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::HistoryStore;

/// A directory of per-identity transcript files.
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, identity: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_identity(identity)))
    }
}

/// Make an identity safe to use as a file name.
fn sanitize_identity(identity: &str) -> String {
    identity
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, identity: &str) -> Result<Vec<TranscriptEntry>, HistoryError> {
        let path = self.entry_path(identity);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            // Missing file — agent simply has no prior history.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(HistoryError::Storage(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // Corrupted entry: start fresh rather than wedging the agent.
                warn!(identity, error = %e, "Discarding corrupted history file");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, identity: &str, entries: &[TranscriptEntry]) -> Result<(), HistoryError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            HistoryError::Storage(format!("failed to create {}: {e}", self.dir.display()))
        })?;

        let path = self.entry_path(identity);
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| HistoryError::Storage(format!("failed to serialize transcript: {e}")))?;

        std::fs::write(&path, json).map_err(|e| {
            HistoryError::Storage(format!("failed to write {}: {e}", path.display()))
        })?;

        debug!(identity, records = entries.len(), "History saved");
        Ok(())
    }
}
