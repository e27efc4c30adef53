//! devpilot CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config
//! - `agent`   — Interactive session or single-message mode

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "devpilot",
    about = "devpilot — an LLM agent that plans tasks and drives a browser, shell and editor",
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
    /// Initialize configuration
    Onboard,

    /// Work with the agent
    Agent {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Replace the knowledge base with this JSON object of strings
        #[arg(short, long)]
        knowledge: Option<PathBuf>,

        /// Queue subtasks from this JSON array of strings
        #[arg(short, long)]
        tasks: Option<PathBuf>,

        /// Ignore any saved session state
        #[arg(long)]
        fresh: bool,
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
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Agent {
            message,
            knowledge,
            tasks,
            fresh,
        } => {
            commands::agent::run(commands::agent::AgentArgs {
                message,
                knowledge,
                tasks,
                fresh,
            })
            .await?
        }
    }

    Ok(())
}
