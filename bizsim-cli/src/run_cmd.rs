//! Run command - play a tournament and write the report
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: resolve_config(), build_source(), write_report()
//! - Level 3: roster and option helpers
//! - Level 4: formatting utilities

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

use bizsim_core::{SimulationConfig, REFERENCE_ROUNDS};
use bizsim_tournament::{
    run_tournament, short_name, ChatSource, DecisionSource, LeaderboardEntry, ScoreMatrix, ScriptedSource, Strategy,
    TournamentOptions, TournamentReport,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

/// Where decisions come from
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Built-in strategies; agent ids are strategy names
    Scripted,
    /// Chat-completions endpoint; agent ids are model names
    Chat,
}

#[derive(Args)]
pub struct RunArgs {
    /// Simulation config JSON file (reference phases when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Decision source
    #[arg(long, value_enum, default_value = "scripted")]
    pub source: SourceKind,

    /// Comma-separated roster, replacing the configured one. Scripted
    /// strategies: always-cooperate, always-exploit, tit-for-tat,
    /// suspicious-tit-for-tat, grim-trigger (remembers only the last 5
    /// opponent moves), random
    #[arg(long, value_delimiter = ',')]
    pub agents: Option<Vec<String>>,

    /// Rounds per match (rescales the reference phases)
    #[arg(long)]
    pub rounds: Option<u32>,

    /// Matches to run concurrently
    #[arg(long, default_value = "1")]
    pub parallel: usize,

    /// Pause after each round in milliseconds (default: 100 for chat, 0 for scripted)
    #[arg(long)]
    pub round_delay_ms: Option<u64>,

    /// Seed for randomized scripted strategies
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Report output path
    #[arg(long, default_value = "business_sim_report.json")]
    pub output: PathBuf,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run the tournament command
///
/// 1. Resolve the simulation config
/// 2. Build the decision source
/// 3. Play every ordered pairing
/// 4. Print and save the report
pub async fn run(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let source = build_source(&args, &config)?;
    let options = tournament_options(&args);

    tracing::info!(
        "Roster: {} ({} source, {} concurrent)",
        config.roster.join(", "),
        match args.source {
            SourceKind::Scripted => "scripted",
            SourceKind::Chat => "chat",
        },
        options.max_concurrent_matches
    );

    let report = run_tournament(&config, source, &options)
        .await
        .context("Invalid simulation configuration")?;

    println!("{}", render_leaderboard(&report.leaderboard));
    println!("{}", render_matrix(&report.matrix));

    write_report(&report, &args.output)?;
    tracing::info!("Report written to {}", args.output.display());

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Load or derive the simulation config and apply roster/round overrides
fn resolve_config(args: &RunArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let config = SimulationConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            if let Some(rounds) = args.rounds {
                if rounds != config.total_rounds {
                    bail!(
                        "--rounds {} does not match {} rounds in {}; edit the config's phases instead",
                        rounds,
                        config.total_rounds,
                        path.display()
                    );
                }
            }
            config
        }
        None => {
            let config = SimulationConfig::reference_with_rounds(args.rounds.unwrap_or(REFERENCE_ROUNDS));
            match args.source {
                // Model ids in the reference roster mean nothing to the scripted source
                SourceKind::Scripted => config.with_roster(Strategy::NAMES),
                SourceKind::Chat => config,
            }
        }
    };

    if let Some(agents) = &args.agents {
        config = config.with_roster(agents.iter().map(|a| a.trim()).filter(|a| !a.is_empty()));
    }

    Ok(config)
}

/// Build the decision source for the roster
fn build_source(args: &RunArgs, config: &SimulationConfig) -> Result<Arc<dyn DecisionSource>> {
    match args.source {
        SourceKind::Scripted => {
            let source = ScriptedSource::from_roster(&config.roster, args.seed)
                .context("Scripted roster must name built-in strategies")?;
            Ok(Arc::new(source))
        }
        SourceKind::Chat => {
            let source = ChatSource::from_env().context("Failed to build HTTP client")?;
            if source.config().api_key.is_none() {
                tracing::warn!("OPENROUTER_API_KEY is not set; requests will likely be rejected");
            }
            Ok(Arc::new(source))
        }
    }
}

/// Save the report as pretty JSON
fn write_report(report: &TournamentReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn tournament_options(args: &RunArgs) -> TournamentOptions {
    let delay_ms = args.round_delay_ms.unwrap_or(match args.source {
        SourceKind::Scripted => 0,
        SourceKind::Chat => 100,
    });

    TournamentOptions::parallel(args.parallel).with_round_delay(Duration::from_millis(delay_ms))
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn render_leaderboard(entries: &[LeaderboardEntry]) -> String {
    let mut out = String::from("=== FINAL LEADERBOARD ===\n");
    out.push_str(&format!(
        "{:<4} {:<28} {:>16} {:>13} {:>18} {:>12} {:>13}\n",
        "#", "Model", "Avg Profit/Round", "Total Profit", "Record (W-L-D)", "Coop Rate %", "Exploit Count"
    ));
    for (rank, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{:<4} {:<28} {:>16.2} {:>13} {:>18} {:>12.1} {:>13}\n",
            rank + 1,
            short_name(&entry.agent),
            entry.avg_score_per_round,
            entry.total_score,
            entry.record(),
            entry.cooperation_rate,
            entry.exploit_count
        ));
    }
    out
}

fn render_matrix(matrix: &ScoreMatrix) -> String {
    let names: Vec<&str> = matrix.agents.iter().map(|a| short_name(a)).collect();
    let width = names.iter().map(|n| n.len()).max().unwrap_or(0).max(8);

    let mut out = String::from("=== HEAD-TO-HEAD (row attacks first, cell = row's score) ===\n");
    out.push_str(&format!("{:<width$}", "", width = width));
    for name in &names {
        out.push_str(&format!(" {:>width$}", name, width = width));
    }
    out.push('\n');

    for (name, row) in names.iter().zip(&matrix.cells) {
        out.push_str(&format!("{:<width$}", name, width = width));
        for cell in row {
            let text = cell.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(" {:>width$}", text, width = width));
        }
        out.push('\n');
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
