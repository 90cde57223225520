//! Built-in capability implementations for Muster agents.
//!
//! These are ordinary registrable tools — distinct from the loop's
//! built-in calls (`send_message`, `ask_user`, `pass_result`), which live
//! in the dispatcher and are not registry entries.

pub mod calculator;

pub use calculator::CalculatorTool;

use muster_core::ToolRegistry;

/// A registry preloaded with every built-in capability.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(calculator::CalculatorTool::new()))
        .expect("built-in tool specs are valid");
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_calculator() {
        let registry = default_registry();
        assert!(registry.get("calculator").is_some());
    }
}
