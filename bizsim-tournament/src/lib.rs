//! BIZSIM Tournament - Round-robin play between decision-making agents
//!
//! This crate provides tournament infrastructure:
//! - Decision port with retry and fallback around pluggable sources
//! - Scripted strategies and a chat-completions source
//! - Round, match and tournament runners
//! - Per-agent stats, leaderboard and head-to-head matrix
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_tournament (orchestration)
//! - Level 2: play_match, StatsAggregator (phases)
//! - Level 3: RoundRunner, DecisionPort (steps)
//! - Level 4: utilities, configuration

mod config;
mod decision;
mod match_play;
mod round;
pub mod source;
mod stats;
mod tournament;

pub use config::{RetryPolicy, TournamentOptions};
pub use decision::{
    normalize_response, Decision, DecisionNote, DecisionPort, DecisionRequest, DecisionSource, FallbackReason,
    SourceError, DEFAULT_MOVE, HISTORY_WINDOW,
};
pub use match_play::{play_match, short_name, MatchContext, MatchOutcome, MatchRecord, MoveTally};
pub use round::{MatchState, RoundRecord, RoundRunner, RoundStage, SideState};
pub use source::{ChatConfig, ChatSource, ScriptedSource, Strategy, UnknownStrategy};
pub use stats::{AgentStats, LeaderboardEntry, StatsAggregator};
pub use tournament::{generate_ordered_pairings, run_tournament, ScoreMatrix, TournamentReport};
