//! ModelAdapter trait — the abstraction over language-model backends.
//!
//! An adapter is a *stateful* client: it owns the conversation transcript
//! and an optional system prompt. The agent loop drives it through a narrow
//! contract — `reset()`, `run(prompt, save)` — and reads the transcript back
//! after each call to persist it.
//!
//! Implementations: OpenAI-compatible HTTP endpoints, scripted adapters for
//! tests and offline runs.

use crate::error::ModelError;
use crate::transcript::TranscriptEntry;
use async_trait::async_trait;

/// A stateful language-model client.
///
/// The loop calls `run()` without knowing which backend is behind it —
/// pure polymorphism at the seam.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// A human-readable name for this adapter (e.g., "openai-compat", "scripted").
    fn name(&self) -> &str;

    /// Clear the transcript and the system prompt.
    fn reset(&mut self);

    /// Install the system prompt for subsequent runs.
    fn set_system_prompt(&mut self, prompt: &str);

    /// Seed the transcript with previously persisted records.
    fn load_transcript(&mut self, entries: Vec<TranscriptEntry>);

    /// The full conversation transcript, oldest first.
    ///
    /// The system prompt is not part of the transcript — it is adapter
    /// state, installed per `unleash` and never persisted.
    fn transcript(&self) -> &[TranscriptEntry];

    /// Send `prompt` to the model and return its text response.
    ///
    /// When `save` is true the prompt and the response are appended to the
    /// transcript; when false the exchange leaves no trace (used for
    /// one-shot calls like clan planning).
    async fn run(&mut self, prompt: &str, save: bool) -> std::result::Result<String, ModelError>;
}
