//! BIZSIM Core - Market game model
//!
//! This crate provides the pure, synchronous pieces of the simulation:
//! - Moves and their neutral option labels
//! - Payoff rules and the payoff resolver
//! - Market phases and the phase table
//! - Simulation configuration and validation

pub mod config;
pub mod error;
pub mod game;
pub mod payoff;
pub mod phase;

// Re-exports for convenient access
pub use config::{SimulationConfig, REFERENCE_ROUNDS};
pub use error::ConfigError;
pub use game::{Choice, MatchWinner, Move, Seat};
pub use payoff::{resolve, Payoff, PayoffEntry, PayoffRule, RESOLUTION_GAP_LABEL};
pub use phase::{Phase, PhaseError, PhaseTable, MAX_ROUNDS};
