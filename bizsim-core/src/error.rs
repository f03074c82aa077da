//! Configuration errors
//!
//! All of these are fatal and raised before any match runs.

use thiserror::Error;

use crate::game::Move;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("roster is empty")]
    EmptyRoster,

    #[error("agent '{0}' appears more than once in the roster")]
    DuplicateAgent(String),

    #[error("total round count must be at least 1")]
    ZeroRounds,

    #[error("total round count {total_rounds} exceeds the limit of {max}")]
    TooManyRounds { total_rounds: u32, max: u32 },

    #[error("no phases configured")]
    NoPhases,

    #[error("phase '{phase}' starts at round {found}, expected {expected} (gap)")]
    PhaseGap { phase: String, expected: u32, found: u32 },

    #[error("phase '{phase}' starts at round {round}, overlapping the previous phase")]
    PhaseOverlap { phase: String, round: u32 },

    #[error("phase '{phase}' ends before it starts ({first_round}..={last_round})")]
    InvertedPhase { phase: String, first_round: u32, last_round: u32 },

    #[error("phase '{phase}' ends at round {last_round}, past the last round {total_rounds}")]
    PhaseBeyondRounds { phase: String, last_round: u32, total_rounds: u32 },

    #[error("phases cover rounds 1..={covered} but the simulation has {total_rounds} rounds")]
    UncoveredRounds { covered: u32, total_rounds: u32 },

    #[error("phase '{phase}' has no payoff for ({first}, {second})")]
    IncompletePayoff { phase: String, first: Move, second: Move },

    #[error("phase '{phase}' defines ({first}, {second}) more than once")]
    DuplicatePayoff { phase: String, first: Move, second: Move },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
