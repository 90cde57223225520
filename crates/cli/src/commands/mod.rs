pub mod clan_cmd;
pub mod run;

/// Fail fast with setup instructions when no API key is configured.
pub fn require_api_key() -> Result<String, Box<dyn std::error::Error>> {
    match muster_config::resolve_api_key() {
        Some(key) => Ok(key),
        None => {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    MUSTER_API_KEY = 'sk-...'   (preferred)");
            eprintln!("    OPENAI_API_KEY = 'sk-...'");
            eprintln!();
            Err("No API key found. See above for setup instructions.".into())
        }
    }
}
