//! LoopObserver — the observability seam for notable loop events.
//!
//! The loop reports what it is doing (reasoning surfaced, tool invoked,
//! final answer, plan produced) through this trait instead of printing;
//! control flow never depends on an observer.

/// Receiver for notable agent-loop events. All methods default to no-ops,
/// so implementations override only what they care about.
pub trait LoopObserver: Send + Sync {
    /// A loop started on a task.
    fn on_task_start(&self, _identity: &str, _task: &str) {}

    /// The model produced a `<think>` block this turn.
    fn on_reasoning(&self, _identity: &str, _reasoning: &str) {}

    /// A tool call was dispatched and produced feedback text.
    fn on_tool_call(&self, _identity: &str, _call: &str, _result: &str) {}

    /// The loop terminated with a final answer.
    fn on_final_answer(&self, _identity: &str, _answer: &str) {}

    /// A clan's planning phase produced the shared plan.
    fn on_plan(&self, _clan: &str, _plan: &str) {}
}

/// Discards every event. Useful in tests and embedded use.
pub struct NullObserver;

impl LoopObserver for NullObserver {}

/// Logs every event through `tracing` at info level.
pub struct TracingObserver;

impl LoopObserver for TracingObserver {
    fn on_task_start(&self, identity: &str, task: &str) {
        tracing::info!(agent = identity, task, "Task started");
    }

    fn on_reasoning(&self, identity: &str, reasoning: &str) {
        tracing::info!(agent = identity, reasoning, "Reasoning");
    }

    fn on_tool_call(&self, identity: &str, call: &str, result: &str) {
        // Long tool output is truncated for the log line; the loop itself
        // always sees the full text.
        let shown: String = if result.len() > 300 {
            let mut cut = 297;
            while !result.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}...", &result[..cut])
        } else {
            result.to_string()
        };
        tracing::info!(agent = identity, call, result = %shown, "Tool call");
    }

    fn on_final_answer(&self, identity: &str, answer: &str) {
        tracing::info!(agent = identity, answer, "Final answer");
    }

    fn on_plan(&self, clan: &str, plan: &str) {
        tracing::info!(clan, plan, "Plan ready");
    }
}
