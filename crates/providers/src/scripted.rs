//! Scripted model adapter — canned responses for tests and offline runs.
//!
//! Each `run` pops the next response from the queue. A `repeating` adapter
//! returns its single response forever, which is how tests exercise loops
//! that never stop requesting tools.

use async_trait::async_trait;
use muster_core::error::ModelError;
use muster_core::{ModelAdapter, TranscriptEntry};
use std::collections::VecDeque;

/// A model adapter that replays a fixed script.
pub struct ScriptedAdapter {
    responses: VecDeque<String>,
    repeat: Option<String>,
    system_prompt: Option<String>,
    transcript: Vec<TranscriptEntry>,
    calls: usize,
}

impl ScriptedAdapter {
    /// Respond with each entry in order; error when the script runs out.
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            repeat: None,
            system_prompt: None,
            transcript: Vec::new(),
            calls: 0,
        }
    }

    /// Respond with `response` on every call, forever.
    pub fn repeating(response: impl Into<String>) -> Self {
        Self {
            responses: VecDeque::new(),
            repeat: Some(response.into()),
            system_prompt: None,
            transcript: Vec::new(),
            calls: 0,
        }
    }

    /// After the scripted responses run out, keep returning `response`.
    pub fn then_repeating(mut self, response: impl Into<String>) -> Self {
        self.repeat = Some(response.into());
        self
    }

    /// How many times `run` has been called.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// The installed system prompt, for assertions.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn reset(&mut self) {
        self.transcript.clear();
        self.system_prompt = None;
    }

    fn set_system_prompt(&mut self, prompt: &str) {
        self.system_prompt = Some(prompt.to_string());
    }

    fn load_transcript(&mut self, entries: Vec<TranscriptEntry>) {
        self.transcript = entries;
    }

    fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    async fn run(&mut self, prompt: &str, save: bool) -> Result<String, ModelError> {
        self.calls += 1;

        let text = match self.responses.pop_front() {
            Some(text) => text,
            None => match &self.repeat {
                Some(text) => text.clone(),
                None => {
                    return Err(ModelError::NotConfigured(format!(
                        "scripted adapter exhausted after {} calls",
                        self.calls - 1
                    )));
                }
            },
        };

        if save {
            self.transcript.push(TranscriptEntry::user(prompt));
            self.transcript.push(TranscriptEntry::assistant(&text));
        }

        Ok(text)
    }
}
