//! Best-effort repair of near-well-formed call strings.
//!
//! Models mangle call syntax in predictable ways: literal newlines inside
//! string arguments, a dropped closing paren or quote, markdown backticks
//! around the call. The cascade below tries targeted fixes in order of
//! increasing lossiness and returns the first variant that parses.
//!
//! `repair` is total and idempotent: it never fails, and repairing an
//! already-repaired string changes nothing. When no variant parses, the
//! (trimmed) input comes back unchanged so the caller's own error path
//! applies.

use crate::literal::parse_call;
use regex_lite::Regex;
use std::sync::OnceLock;

fn backtick_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("`([^`]*)`").expect("valid backtick regex"))
}

fn parses(candidate: &str) -> bool {
    parse_call(candidate).is_ok()
}

/// Repair a raw call string so it parses as a restricted literal call.
///
/// Cascade, first success wins:
/// 1. already valid — return unchanged;
/// 2. escape literal newlines inside strings, space out those outside;
/// 3. collapse all whitespace runs (lossy for in-string newlines);
/// 4. append missing `)` to the outputs of 2 and 3;
/// 5. append a closing `"` or `'` plus `)` to the outputs of 2 and 3;
/// 6. strip single-backtick code spans and retry the step-2 scan.
pub fn repair(raw: &str) -> String {
    let s = raw.trim();

    // 1. Already valid
    if parses(s) {
        return s.to_string();
    }

    // 2. Escape newlines inside strings, collapse those outside to spaces
    let escaped = escape_string_newlines(s);
    if parses(&escaped) {
        return escaped;
    }

    // 3. Brute-force collapse all whitespace (lossy for in-string newlines)
    let collapsed = collapse_whitespace(s);
    if parses(&collapsed) {
        return collapsed;
    }

    // 4. Fix missing closing parentheses
    for candidate in [&escaped, &collapsed] {
        let open = candidate.matches('(').count();
        let close = candidate.matches(')').count();
        if open > close {
            let attempt = format!("{}{}", candidate, ")".repeat(open - close));
            if parses(&attempt) {
                return attempt;
            }
        }
    }

    // 5. Fix missing closing quote + paren
    for quote in ['"', '\''] {
        for candidate in [&escaped, &collapsed] {
            let attempt = format!("{candidate}{quote})");
            if parses(&attempt) {
                return attempt;
            }
        }
    }

    // 6. Strip markdown backtick wrappers
    let stripped = backtick_span_re().replace_all(s, "$1");
    if stripped != s {
        let stripped = escape_string_newlines(&stripped);
        if parses(&stripped) {
            return stripped;
        }
    }

    // Give up; the caller's error path reports the unparsable call.
    s.to_string()
}

/// Escape literal newlines *inside* string arguments; replace those outside
/// with spaces. Escape sequences pass through untouched, `\r\n` folds to
/// one newline first.
fn escape_string_newlines(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut in_str = false;
    let mut quote = '"';
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if in_str {
            if ch == '\\' && i + 1 < chars.len() {
                out.push(ch);
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if ch == quote {
                in_str = false;
                out.push(ch);
            } else if ch == '\r' || ch == '\n' {
                if ch == '\r' && chars.get(i + 1) == Some(&'\n') {
                    i += 1;
                }
                out.push_str("\\n");
            } else {
                out.push(ch);
            }
        } else if ch == '"' || ch == '\'' {
            in_str = true;
            quote = ch;
            out.push(ch);
        } else if ch == '\r' || ch == '\n' {
            if ch == '\r' && chars.get(i + 1) == Some(&'\n') {
                i += 1;
            }
            out.push(' ');
        } else {
            out.push(ch);
        }
        i += 1;
    }

    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
