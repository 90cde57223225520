//! Fuzzy agent-name resolution.
//!
//! Models address teammates loosely: "the Manager", "agent scout",
//! "Reserch Lead". Resolution is a pure function over the input, the
//! roster, and a fixed synonym table for the coordinator role — no shared
//! state, no side effects.

/// Inputs that always mean the coordinator, whatever it is actually named.
pub const COORDINATOR_SYNONYMS: &[&str] =
    &["ceo", "manager", "ceo/manager", "ceo-manager", "ceo manager"];

/// Similarity floor for approximate matching.
const SIMILARITY_CUTOFF: f64 = 0.6;

/// Resolve a free-text agent name against a roster.
///
/// Resolution order: coordinator synonyms → exact case-insensitive match →
/// best `normalized_levenshtein` match clearing the cutoff. When nothing
/// matches, the raw input comes back unchanged — the caller must treat an
/// unresolved name as not-found, never as a silent no-op.
pub fn resolve(raw: &str, roster: &[&str], coordinator: &str) -> String {
    let mut clean = raw.trim().to_lowercase();
    for filler in ["agent ", " agent", "the "] {
        clean = clean.replace(filler, "");
    }
    let clean = clean.trim();

    if !coordinator.is_empty() && COORDINATOR_SYNONYMS.contains(&clean) {
        return coordinator.to_string();
    }

    for name in roster {
        if name.to_lowercase() == clean {
            return name.to_string();
        }
    }

    let mut best: Option<(&str, f64)> = None;
    for name in roster {
        let score = strsim::normalized_levenshtein(clean, &name.to_lowercase());
        if score >= SIMILARITY_CUTOFF && best.is_none_or(|(_, b)| score > b) {
            best = Some((name, score));
        }
    }

    match best {
        Some((name, _)) => name.to_string(),
        None => raw.to_string(),
    }
}
