//! Tag extraction from raw model text.
//!
//! Model turns carry two kinds of markup: `<think>…</think>` reasoning
//! blocks (at most one matters, ignored for execution) and `<tool>…</tool>`
//! call regions (zero or more per turn). Both span multiple lines.

use regex_lite::Regex;
use std::sync::OnceLock;

fn tool_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<tool>(.*?)</tool>").expect("valid tool regex"))
}

fn think_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<think>(.*?)</think>").expect("valid think regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"))
}

/// The trimmed contents of every non-overlapping `<tool>…</tool>` region,
/// in document order.
pub fn extract_tool_calls(text: &str) -> Vec<String> {
    tool_re()
        .captures_iter(text)
        .map(|cap| cap[1].trim().to_string())
        .collect()
}

/// The first `<think>` block, trimmed — surfaced for observability only.
pub fn first_reasoning(text: &str) -> Option<String> {
    think_re().captures(text).map(|cap| cap[1].trim().to_string())
}

/// Remove every `<think>` block; what remains (trimmed) is the answer text.
pub fn strip_reasoning(text: &str) -> String {
    think_re().replace_all(text, "").trim().to_string()
}

/// Remove all remaining `<…>` markup. Used to clean plan text before it is
/// broadcast to clan members.
pub fn strip_tags(text: &str) -> String {
    tag_re().replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_call() {
        let text = "Let me check.\n<tool>add(a=2, b=3)</tool>\nDone.";
        assert_eq!(extract_tool_calls(text), vec!["add(a=2, b=3)"]);
    }

    #[test]
    fn extracts_multiple_calls_in_document_order() {
        let text = "<tool>first()</tool> middle <tool>second()</tool>";
        assert_eq!(extract_tool_calls(text), vec!["first()", "second()"]);
    }

    #[test]
    fn extracts_across_newlines() {
        let text = "<tool>\nnote(\n  text=\"hi\"\n)\n</tool>";
        assert_eq!(extract_tool_calls(text), vec!["note(\n  text=\"hi\"\n)"]);
    }

    #[test]
    fn no_calls_yields_empty() {
        assert!(extract_tool_calls("just an answer").is_empty());
        assert!(extract_tool_calls("<tool>unclosed").is_empty());
    }

    #[test]
    fn first_reasoning_found_and_trimmed() {
        let text = "<think>\n  pondering  \n</think>answer";
        assert_eq!(first_reasoning(text).as_deref(), Some("pondering"));
        assert_eq!(first_reasoning("no tags"), None);
    }

    #[test]
    fn strip_reasoning_removes_all_blocks() {
        let text = "<think>a</think>The answer.<think>b</think>";
        assert_eq!(strip_reasoning(text), "The answer.");
    }

    #[test]
    fn strip_tags_cleans_plan_markup() {
        let text = "<think>scheming</think><plan>1. Research\n2. Write</plan>";
        assert_eq!(strip_tags(&strip_reasoning(text)), "1. Research\n2. Write");
    }
}
