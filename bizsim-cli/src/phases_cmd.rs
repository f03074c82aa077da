//! Phases command - print the phase schedule and payoff tables

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use bizsim_core::{PhaseTable, Seat, SimulationConfig};

#[derive(Args)]
pub struct PhasesArgs {
    /// Simulation config JSON file (reference phases when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run(args: PhasesArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => SimulationConfig::reference(),
    };

    let table = config.validate().context("Invalid simulation configuration")?;
    print!("{}", render_phases(&table));
    Ok(())
}

/// Phase schedule with each payoff table as seen from the first seat
fn render_phases(table: &PhaseTable) -> String {
    let mut out = format!("{} rounds, {} phases\n", table.total_rounds(), table.phases().len());
    for phase in table.phases() {
        out.push_str(&format!(
            "\n{} (rounds {}-{})\n  {}\n",
            phase.name, phase.first_round, phase.last_round, phase.description
        ));
        for line in phase.payoff.describe(Seat::First).lines() {
            out.push_str(&format!("  {}\n", line));
        }
    }
    out
}
