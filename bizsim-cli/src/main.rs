//! BIZSIM CLI - Command-line interface
//!
//! Commands:
//! - run: Play a round-robin tournament and write the report
//! - phases: Print the phase table

mod phases_cmd;
mod run_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bizsim")]
#[command(about = "Iterated business-simulation tournament between decision agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a round-robin tournament
    Run(run_cmd::RunArgs),
    /// Show the phases and payoff tables
    Phases(phases_cmd::PhasesArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides; default to info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_cmd::run(args).await,
        Commands::Phases(args) => phases_cmd::run(args),
    }
}
