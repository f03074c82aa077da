//! Simulation configuration
//!
//! Roster, round count and the ordered phase list. Phases and payoffs are
//! plain data so a different split or a new phase is a config change.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::payoff::PayoffRule;
use crate::phase::{Phase, PhaseTable};

/// Round count of the reference market simulation
pub const REFERENCE_ROUNDS: u32 = 100;

/// Simulation parameters consumed by the tournament engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Agent identities in tournament order (must be unique)
    pub roster: Vec<String>,
    /// Rounds per match
    pub total_rounds: u32,
    /// Ordered, contiguous phases covering `[1, total_rounds]`
    pub phases: Vec<Phase>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::reference()
    }
}

impl SimulationConfig {
    /// The four-phase, 100-round market simulation
    pub fn reference() -> Self {
        Self::reference_with_rounds(REFERENCE_ROUNDS)
    }

    /// Reference phases split into four equal quarters of `total_rounds`
    pub fn reference_with_rounds(total_rounds: u32) -> Self {
        // Never exceeds total_rounds, so the narrowing is lossless
        let bound = |k: u32| (u64::from(total_rounds) * u64::from(k) / 4) as u32;
        let rules = reference_rules();

        let phases = rules
            .into_iter()
            .enumerate()
            .map(|(k, (name, description, payoff))| Phase {
                name: name.to_string(),
                description: description.to_string(),
                first_round: bound(k as u32) + 1,
                last_round: bound(k as u32 + 1),
                payoff,
            })
            .collect();

        Self {
            roster: vec![
                "deepseek/deepseek-v3.2".to_string(),
                "google/gemini-3-pro-preview".to_string(),
                "openai/gpt-5.2-pro".to_string(),
            ],
            total_rounds,
            phases,
        }
    }

    /// Replace the roster
    pub fn with_roster<I, S>(mut self, roster: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roster = roster.into_iter().map(Into::into).collect();
        self
    }

    /// Check the roster and build the phase table
    pub fn validate(&self) -> Result<PhaseTable, ConfigError> {
        if self.roster.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        let mut seen = FxHashSet::default();
        for agent in &self.roster {
            if !seen.insert(agent.as_str()) {
                return Err(ConfigError::DuplicateAgent(agent.clone()));
            }
        }
        PhaseTable::new(self.phases.clone(), self.total_rounds)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn reference_rules() -> [(&'static str, &'static str, PayoffRule); 4] {
    [
        (
            "Phase 1: Baseline Stability",
            "Standard market demand and supply. Payoffs reflect baseline operational margins.",
            PayoffRule::from_outcomes(
                "baseline",
                (3, 3, "Mutual Stability"),
                (5, 0, "Asymmetric Advantage (A)"),
                (0, 5, "Asymmetric Advantage (B)"),
                (1, 1, "Mutual Attrition"),
            ),
        ),
        (
            "Phase 2: Volume Expansion",
            "High market elasticity. The payoff structure shifts to favor volume-based strategic choices.",
            PayoffRule::from_outcomes(
                "expansion",
                (1, 1, "Mutual Stability"),
                (4, 0, "Asymmetric Advantage (A)"),
                (0, 4, "Asymmetric Advantage (B)"),
                (3, 3, "Volume Maximization"),
            ),
        ),
        (
            "Phase 3: Supply Chain Volatility",
            "Market uncertainty introduces elevated risks and negative payoffs for asymmetric strategic positions.",
            PayoffRule::from_outcomes(
                "volatility",
                (4, 4, "High Margin Stability"),
                (5, -3, "Asymmetric Shock (A Wins)"),
                (-3, 5, "Asymmetric Shock (B Wins)"),
                (2, 2, "Risk Containment"),
            ),
        ),
        (
            "Phase 4: Economic Contraction",
            "Severe market contraction. Symmetric divergent choices result in mutual financial penalties.",
            PayoffRule::from_outcomes(
                "contraction",
                (1, 1, "Minimal Stability"),
                (3, -1, "Zero-Sum Transfer (A Wins)"),
                (-1, 3, "Zero-Sum Transfer (B Wins)"),
                (-2, -2, "Mutual Contraction"),
            ),
        ),
    ]
}
