//! Tool-call parsing for Muster.
//!
//! Model output is text. Somewhere in that text live `<tool>…</tool>`
//! regions, each holding one Python-style call expression — usually
//! well-formed, sometimes mangled by the model (unescaped newlines, a
//! dropped closing paren or quote, markdown backticks). This crate turns
//! that text into executable [`ToolCall`]s in three stages:
//!
//! 1. [`extract_tool_calls`] — pull the delimited call strings out.
//! 2. [`repair`] — a best-effort cascade of syntax fixes; idempotent,
//!    never fails, returns the input unchanged when nothing helps.
//! 3. [`parse_call`] — a restricted literal-expression parser. Argument
//!    values must be literals; identifiers, nested calls, and attribute
//!    access are rejected, never evaluated.

pub mod extract;
pub mod literal;
pub mod repair;

pub use extract::{extract_tool_calls, first_reasoning, strip_reasoning, strip_tags};
pub use literal::{ParseError, parse_call};
pub use repair::repair;

pub use muster_core::ToolCall;
