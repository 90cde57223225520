//! ToolCall — a structured, literal-argument invocation.
//!
//! Produced by the call parser from a repaired call string. By construction
//! every argument value is literal data (string, number, boolean, list,
//! mapping, null) — never an identifier, a nested call, or anything that
//! would require evaluation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// The raw call text this was parsed from (post-repair).
    pub source: String,

    /// The callee name.
    pub name: String,

    /// Positional argument values, in call order.
    pub args: Vec<Value>,

    /// Keyword argument values, in call order.
    pub kwargs: serde_json::Map<String, Value>,
}

impl ToolCall {
    /// Look up a keyword argument.
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// Look up a keyword argument expected to be a string.
    pub fn kwarg_str(&self, name: &str) -> Option<&str> {
        self.kwargs.get(name).and_then(Value::as_str)
    }
}

impl std::fmt::Display for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}
