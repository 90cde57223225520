//! Muster CLI — the main entry point.
//!
//! Commands:
//! - `run`  — Run a single agent on a task
//! - `clan` — Run a clan from a TOML definition file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "muster",
    about = "Muster — multi-agent coordination runtime",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single agent on a task
    Run {
        /// The task to accomplish
        task: String,

        /// Model name
        #[arg(short, long)]
        model: Option<String>,

        /// OpenAI-compatible endpoint base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Write the final answer to this file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run a clan from a TOML definition file
    Clan {
        /// Path to the clan definition
        #[arg(short, long, default_value = "clan.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            task,
            model,
            base_url,
            output,
        } => commands::run::run(task, model, base_url, output).await?,
        Commands::Clan { config } => commands::clan_cmd::run(&config).await?,
    }

    Ok(())
}
