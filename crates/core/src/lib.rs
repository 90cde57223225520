//! # Muster Core
//!
//! Domain types, traits, and error definitions for the Muster multi-agent
//! runtime. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem boundary is a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping model backends via configuration
//! - Easy testing with scripted/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod adapter;
pub mod call;
pub mod error;
pub mod tool;
pub mod transcript;

// Re-export key types at crate root for ergonomics
pub use adapter::ModelAdapter;
pub use call::ToolCall;
pub use error::{Error, HistoryError, ModelError, Result, ToolError};
pub use tool::{
    Capability, FnTool, ParamSpec, ParamType, ToolRegistry, ToolResult, ToolSpec, bind_arguments,
};
pub use transcript::{Role, TranscriptEntry};
