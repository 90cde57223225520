//! The Muster agent runtime.
//!
//! One [`Agent`] is a model adapter plus an identity, a tool registry, and
//! (when clan-connected) the wiring that ties it to its teammates. The
//! [`unleash`] loop alternates model turns with tool execution until the
//! agent produces an answer, calls `pass_result`, or runs out of turns.
//! A [`Clan`] binds a roster of agents to a shared goal: one planning call,
//! then depth-first delegation through `send_message`, all on a single
//! synchronous call stack.

pub mod agent;
pub mod clan;
pub mod dispatch;
pub mod loop_runner;
pub mod observer;
pub mod prompt;
pub mod resolve;
pub mod user_io;

#[cfg(test)]
mod test_helpers;

pub use agent::{Agent, Roster};
pub use clan::Clan;
pub use dispatch::DispatchOutcome;
pub use loop_runner::{
    LoopContext, LoopOutcome, MAX_DELEGATION_DEPTH, TURN_BUDGET, unleash, unleash_with,
};
pub use observer::{LoopObserver, NullObserver, TracingObserver};
pub use resolve::{COORDINATOR_SYNONYMS, resolve};
pub use user_io::{ScriptedChannel, StdinChannel, UserChannel};
