//! OpenAI-compatible model adapter.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, Together AI, and any other
//! endpoint speaking the `/v1/chat/completions` dialect. The adapter holds
//! the conversation state itself: the system prompt and the transcript are
//! replayed into every request, and `run` appends the new exchange when
//! asked to.

use async_trait::async_trait;
use muster_core::error::ModelError;
use muster_core::{ModelAdapter, Role, TranscriptEntry};
use serde::Deserialize;
use tracing::{debug, warn};

/// A stateful chat-completions client.
pub struct OpenAiCompatAdapter {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: Option<String>,
    transcript: Vec<TranscriptEntry>,
    client: reqwest::Client,
}

impl OpenAiCompatAdapter {
    /// Create an adapter for an arbitrary OpenAI-compatible endpoint.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            system_prompt: None,
            transcript: Vec::new(),
            client,
        }
    }

    /// Convenience constructor for OpenAI direct.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key, model)
    }

    /// Convenience constructor for OpenRouter.
    pub fn openrouter(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key, model)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn api_messages(&self, prompt: &str) -> Vec<serde_json::Value> {
        let mut messages = Vec::with_capacity(self.transcript.len() + 2);
        if let Some(system) = &self.system_prompt {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        for entry in &self.transcript {
            let role = match entry.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(serde_json::json!({"role": role, "content": entry.content}));
        }
        messages.push(serde_json::json!({"role": "user", "content": prompt}));
        messages
    }
}

#[async_trait]
impl ModelAdapter for OpenAiCompatAdapter {
    fn name(&self) -> &str {
        &self.name
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
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": self.api_messages(prompt),
            "temperature": self.temperature,
            "stream": false,
        });
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(adapter = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ModelError::RateLimited { retry_after_secs: 5 });
        }
        if status == 401 || status == 403 {
            return Err(ModelError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model endpoint returned error");
            return Err(ModelError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Network(format!("malformed response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ModelError::EmptyResponse)?;

        if save {
            self.transcript.push(TranscriptEntry::user(prompt));
            self.transcript.push(TranscriptEntry::assistant(&text));
        }

        Ok(text)
    }
}

// --- Wire format ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let adapter = OpenAiCompatAdapter::new("x", "http://localhost:8000/v1/", "key", "m");
        assert_eq!(adapter.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn system_prompt_leads_the_message_list() {
        let mut adapter = OpenAiCompatAdapter::openai("key", "gpt-4o");
        adapter.set_system_prompt("You are Scout.");
        adapter.load_transcript(vec![
            TranscriptEntry::user("hi"),
            TranscriptEntry::assistant("hello"),
        ]);

        let messages = adapter.api_messages("next");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[3]["content"], "next");
    }

    #[test]
    fn reset_clears_transcript_and_system_prompt() {
        let mut adapter = OpenAiCompatAdapter::openai("key", "gpt-4o");
        adapter.set_system_prompt("rules");
        adapter.load_transcript(vec![TranscriptEntry::user("hi")]);

        adapter.reset();
        assert!(adapter.transcript().is_empty());
        assert_eq!(adapter.api_messages("x").len(), 1);
    }
}
