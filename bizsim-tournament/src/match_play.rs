//! Match play - every round between two agents in fixed seats
//!
//! Level 2 - Phase-level implementation

use std::time::Duration;

use bizsim_core::{MatchWinner, Move, PhaseTable, Seat};
use serde::{Deserialize, Serialize};

use crate::decision::DecisionPort;
use crate::round::{MatchState, RoundRecord, RoundRunner};

/// Final record of one ordered pairing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// 1-based id in enumeration order
    pub match_id: u32,
    pub first_agent: String,
    pub second_agent: String,
    pub first_score: i64,
    pub second_score: i64,
    /// Rounds where both sides cooperated
    pub mutual_cooperation: u32,
    /// Rounds where both sides exploited
    pub mutual_exploitation: u32,
    pub winner: MatchWinner,
    pub rounds: Vec<RoundRecord>,
}

impl MatchRecord {
    pub fn rounds_played(&self) -> u32 {
        self.rounds.len() as u32
    }

    pub fn agent(&self, seat: Seat) -> &str {
        match seat {
            Seat::First => &self.first_agent,
            Seat::Second => &self.second_agent,
        }
    }

    pub fn score(&self, seat: Seat) -> i64 {
        match seat {
            Seat::First => self.first_score,
            Seat::Second => self.second_score,
        }
    }

    /// Winning agent, `None` on a draw
    pub fn winner_agent(&self) -> Option<&str> {
        match self.winner {
            MatchWinner::First => Some(&self.first_agent),
            MatchWinner::Second => Some(&self.second_agent),
            MatchWinner::Draw => None,
        }
    }
}

/// How often one agent chose each move in a match
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTally {
    pub cooperate: u32,
    pub exploit: u32,
}

impl MoveTally {
    pub fn from_moves(moves: &[Move]) -> Self {
        moves.iter().fold(Self::default(), |mut tally, mv| {
            match mv {
                Move::Cooperate => tally.cooperate += 1,
                Move::Exploit => tally.exploit += 1,
            }
            tally
        })
    }

    pub fn total(&self) -> u32 {
        self.cooperate + self.exploit
    }
}

/// A finished match plus both agents' move tallies
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchOutcome {
    pub record: MatchRecord,
    pub first_tally: MoveTally,
    pub second_tally: MoveTally,
}

impl MatchOutcome {
    pub fn tally(&self, seat: Seat) -> MoveTally {
        match seat {
            Seat::First => self.first_tally,
            Seat::Second => self.second_tally,
        }
    }
}

/// Shared, read-only inputs for running matches
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    pub port: &'a DecisionPort,
    pub table: &'a PhaseTable,
    /// Pause after each round (zero to disable)
    pub round_delay: Duration,
}

impl<'a> MatchContext<'a> {
    pub fn new(port: &'a DecisionPort, table: &'a PhaseTable) -> Self {
        Self {
            port,
            table,
            round_delay: Duration::ZERO,
        }
    }

    pub fn with_round_delay(mut self, delay: Duration) -> Self {
        self.round_delay = delay;
        self
    }
}

/// Play a full match (Level 2 phase)
///
/// Rounds run strictly in order; round `r + 1` sees the histories
/// finalized by round `r`.
pub async fn play_match(match_id: u32, first: &str, second: &str, ctx: MatchContext<'_>) -> MatchOutcome {
    tracing::info!("Match {}: {} vs {}", match_id, short_name(first), short_name(second));

    let mut state = MatchState::new(match_id, first, second, ctx.table.total_rounds());

    for (round, phase) in ctx.table.schedule() {
        let record = RoundRunner::new(round, phase).run(ctx.port, &mut state).await;
        tracing::debug!("{}", progress_line(record));

        if !ctx.round_delay.is_zero() {
            tokio::time::sleep(ctx.round_delay).await;
        }
    }

    let outcome = finalize(state);
    tracing::info!(
        "Match {} finished: {} {} - {} {} (winner: {})",
        match_id,
        short_name(first),
        outcome.record.first_score,
        outcome.record.second_score,
        short_name(second),
        outcome.record.winner.label()
    );
    outcome
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Freeze match state into its record and tallies
fn finalize(state: MatchState) -> MatchOutcome {
    let first_tally = MoveTally::from_moves(&state.first.history);
    let second_tally = MoveTally::from_moves(&state.second.history);

    let record = MatchRecord {
        match_id: state.match_id,
        winner: MatchWinner::from_scores(state.first.score, state.second.score),
        first_agent: state.first.agent,
        second_agent: state.second.agent,
        first_score: state.first.score,
        second_score: state.second.score,
        mutual_cooperation: state.mutual_cooperation,
        mutual_exploitation: state.mutual_exploitation,
        rounds: state.rounds,
    };

    MatchOutcome {
        record,
        first_tally,
        second_tally,
    }
}

// ============================================================================
// Level 4 - Formatting utilities
// ============================================================================

/// Last path segment of a model id ("openai/gpt-5.2-pro" -> "gpt-5.2-pro")
pub fn short_name(agent: &str) -> &str {
    agent.rsplit('/').next().unwrap_or(agent)
}

/// One-line round summary: `R001 [Phase 1: B...]: C vs E -> 0 / 5 (Label)`
fn progress_line(record: &RoundRecord) -> String {
    let phase: String = record.phase.chars().take(10).collect();
    format!(
        "R{:03} [{}...]: {} vs {} -> {} / {} ({})",
        record.round,
        phase,
        record.first_move.initial(),
        record.second_move.initial(),
        record.first_points,
        record.second_points,
        record.outcome
    )
}
