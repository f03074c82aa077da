//! Round runner - one round of one match
//!
//! Level 3 - Step-level implementation
//!
//! A round moves `Pending -> AwaitingDecisions -> Resolved`. Both decisions
//! are requested together and joined before anything is resolved, so neither
//! agent can observe the other's in-flight move.

use bizsim_core::{resolve, Move, Phase, Seat};
use serde::{Deserialize, Serialize};

use crate::decision::{DecisionNote, DecisionPort, DecisionRequest};

/// Immutable log entry for a resolved round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub match_id: u32,
    pub round: u32,
    pub phase: String,
    pub first_agent: String,
    pub second_agent: String,
    pub first_move: Move,
    pub second_move: Move,
    pub first_points: i32,
    pub second_points: i32,
    pub outcome: String,
    pub first_note: DecisionNote,
    pub second_note: DecisionNote,
}

impl RoundRecord {
    pub fn note_for(&self, seat: Seat) -> DecisionNote {
        match seat {
            Seat::First => self.first_note,
            Seat::Second => self.second_note,
        }
    }
}

/// Running state for one side of a match
#[derive(Clone, Debug, Default)]
pub struct SideState {
    pub agent: String,
    pub history: Vec<Move>,
    pub score: i64,
}

impl SideState {
    fn new(agent: &str) -> Self {
        Self {
            agent: agent.to_string(),
            ..Default::default()
        }
    }
}

/// Per-match state, owned exclusively by the match runner
#[derive(Clone, Debug)]
pub struct MatchState {
    pub match_id: u32,
    pub total_rounds: u32,
    pub first: SideState,
    pub second: SideState,
    pub mutual_cooperation: u32,
    pub mutual_exploitation: u32,
    pub rounds: Vec<RoundRecord>,
}

impl MatchState {
    pub fn new(match_id: u32, first: &str, second: &str, total_rounds: u32) -> Self {
        Self {
            match_id,
            total_rounds,
            first: SideState::new(first),
            second: SideState::new(second),
            mutual_cooperation: 0,
            mutual_exploitation: 0,
            rounds: Vec::with_capacity(total_rounds as usize),
        }
    }
}

/// Lifecycle of a round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStage {
    Pending,
    AwaitingDecisions,
    Resolved,
}

/// Executes a single round against a match's state
pub struct RoundRunner<'a> {
    round: u32,
    phase: &'a Phase,
    stage: RoundStage,
}

impl<'a> RoundRunner<'a> {
    pub fn new(round: u32, phase: &'a Phase) -> Self {
        Self {
            round,
            phase,
            stage: RoundStage::Pending,
        }
    }

    pub fn stage(&self) -> RoundStage {
        self.stage
    }

    /// Request both moves, resolve the payoff and append the round to `state`
    pub async fn run<'s>(mut self, port: &DecisionPort, state: &'s mut MatchState) -> &'s RoundRecord {
        self.stage = RoundStage::AwaitingDecisions;
        tracing::trace!(match_id = state.match_id, round = self.round, stage = ?self.stage);

        // Each side sees the other's history as of the start of the round
        let first_request = DecisionRequest::new(
            &state.first.agent,
            Seat::First,
            self.round,
            state.total_rounds,
            self.phase,
            &state.second.history,
        )
        .with_match_id(state.match_id);
        let second_request = DecisionRequest::new(
            &state.second.agent,
            Seat::Second,
            self.round,
            state.total_rounds,
            self.phase,
            &state.first.history,
        )
        .with_match_id(state.match_id);

        let (first, second) = tokio::join!(port.decide(&first_request), port.decide(&second_request));

        let payoff = resolve(first.choice, second.choice, self.phase);
        self.stage = RoundStage::Resolved;
        tracing::trace!(match_id = state.match_id, round = self.round, stage = ?self.stage);

        state.first.score += i64::from(payoff.first);
        state.second.score += i64::from(payoff.second);
        match (first.choice, second.choice) {
            (Move::Cooperate, Move::Cooperate) => state.mutual_cooperation += 1,
            (Move::Exploit, Move::Exploit) => state.mutual_exploitation += 1,
            _ => {}
        }
        state.first.history.push(first.choice);
        state.second.history.push(second.choice);

        state.rounds.push(RoundRecord {
            match_id: state.match_id,
            round: self.round,
            phase: self.phase.name.clone(),
            first_agent: state.first.agent.clone(),
            second_agent: state.second.agent.clone(),
            first_move: first.choice,
            second_move: second.choice,
            first_points: payoff.first,
            second_points: payoff.second,
            outcome: payoff.label,
            first_note: first.note,
            second_note: second.note,
        });

        let last = state.rounds.len() - 1;
        &state.rounds[last]
    }
}
