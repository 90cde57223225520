//! Model adapter implementations for Muster.
//!
//! Two adapters cover the practical range:
//! - [`OpenAiCompatAdapter`] — any `/v1/chat/completions` endpoint
//!   (OpenAI, OpenRouter, Ollama, vLLM, …)
//! - [`ScriptedAdapter`] — canned responses for tests and offline runs
//!
//! Both are *stateful*: they own the conversation transcript and an
//! optional system prompt, per the [`muster_core::ModelAdapter`] contract.

pub mod openai_compat;
pub mod scripted;

pub use openai_compat::OpenAiCompatAdapter;
pub use scripted::ScriptedAdapter;
