//! Payoff rules and the payoff resolver

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::{Move, Seat};
use crate::phase::Phase;

/// Outcome label used when a move pair has no entry in the rule
pub const RESOLUTION_GAP_LABEL: &str = "Error";

/// Points awarded for one round, plus the outcome label
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payoff {
    pub first: i32,
    pub second: i32,
    pub label: String,
}

impl Payoff {
    pub fn new(first: i32, second: i32, label: &str) -> Self {
        Self {
            first,
            second,
            label: label.to_string(),
        }
    }

    /// Zero/zero sentinel for an unresolvable move pair
    pub fn resolution_gap() -> Self {
        Self::new(0, 0, RESOLUTION_GAP_LABEL)
    }
}

/// One row of a payoff rule: an ordered move pair and its payoff
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffEntry {
    pub first_move: Move,
    pub second_move: Move,
    pub first_points: i32,
    pub second_points: i32,
    pub label: String,
}

impl PayoffEntry {
    pub fn new(first_move: Move, second_move: Move, first_points: i32, second_points: i32, label: &str) -> Self {
        Self {
            first_move,
            second_move,
            first_points,
            second_points,
            label: label.to_string(),
        }
    }
}

/// Complete mapping from ordered move pairs to payoffs for one phase.
///
/// Rules are not assumed symmetric: `(Exploit, Cooperate)` for the first seat
/// need not mirror `(Cooperate, Exploit)` for the second.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffRule {
    /// Rule identifier ("baseline", "volatility", ...)
    pub id: String,
    pub entries: Vec<PayoffEntry>,
}

impl PayoffRule {
    /// Build a rule from the four ordered outcomes
    /// (both cooperate, first exploits, second exploits, both exploit)
    pub fn from_outcomes(
        id: &str,
        mutual_cooperation: (i32, i32, &str),
        first_exploits: (i32, i32, &str),
        second_exploits: (i32, i32, &str),
        mutual_exploitation: (i32, i32, &str),
    ) -> Self {
        let entry = |a, b, (x, y, label): (i32, i32, &str)| PayoffEntry::new(a, b, x, y, label);
        Self {
            id: id.to_string(),
            entries: vec![
                entry(Move::Cooperate, Move::Cooperate, mutual_cooperation),
                entry(Move::Exploit, Move::Cooperate, first_exploits),
                entry(Move::Cooperate, Move::Exploit, second_exploits),
                entry(Move::Exploit, Move::Exploit, mutual_exploitation),
            ],
        }
    }

    /// Find the entry for an ordered move pair
    pub fn entry(&self, first: Move, second: Move) -> Option<&PayoffEntry> {
        self.entries
            .iter()
            .find(|e| e.first_move == first && e.second_move == second)
    }

    /// Check that every ordered move pair appears exactly once
    pub fn validate(&self, phase: &str) -> Result<(), ConfigError> {
        for first in Move::ALL {
            for second in Move::ALL {
                let count = self
                    .entries
                    .iter()
                    .filter(|e| e.first_move == first && e.second_move == second)
                    .count();
                match count {
                    0 => {
                        return Err(ConfigError::IncompletePayoff {
                            phase: phase.to_string(),
                            first,
                            second,
                        })
                    }
                    1 => {}
                    _ => {
                        return Err(ConfigError::DuplicatePayoff {
                            phase: phase.to_string(),
                            first,
                            second,
                        })
                    }
                }
            }
        }
        Ok(())
    }

    /// Points as seen by `seat` when it plays `own` against `other`: (own, other)
    fn points_for(&self, seat: Seat, own: Move, other: Move) -> Option<(i32, i32)> {
        match seat {
            Seat::First => self
                .entry(own, other)
                .map(|e| (e.first_points, e.second_points)),
            Seat::Second => self
                .entry(other, own)
                .map(|e| (e.second_points, e.first_points)),
        }
    }

    /// Human-readable payoff matrix from one seat's perspective,
    /// phrased with neutral option labels
    pub fn describe(&self, seat: Seat) -> String {
        let mut lines = Vec::with_capacity(4);

        if let Some((own, other)) = self.points_for(seat, Move::Cooperate, Move::Cooperate) {
            lines.push(format!("- Both choose Option A: {}", both_phrase(own, other)));
        }
        if let Some((own, other)) = self.points_for(seat, Move::Exploit, Move::Cooperate) {
            lines.push(format!(
                "- You choose Option B, Opponent chooses Option A: {}",
                split_phrase(own, other)
            ));
        }
        if let Some((own, other)) = self.points_for(seat, Move::Cooperate, Move::Exploit) {
            lines.push(format!(
                "- You choose Option A, Opponent chooses Option B: {}",
                split_phrase(own, other)
            ));
        }
        if let Some((own, other)) = self.points_for(seat, Move::Exploit, Move::Exploit) {
            lines.push(format!("- Both choose Option B: {}", both_phrase(own, other)));
        }

        lines.join("\n")
    }
}

/// Resolve a round: look up the ordered pair in the phase's rule.
///
/// Never fails. A pair missing from the rule yields the zero/zero
/// `"Error"` sentinel so a long tournament is not aborted.
pub fn resolve(first: Move, second: Move, phase: &Phase) -> Payoff {
    match phase.payoff.entry(first, second) {
        Some(e) => Payoff::new(e.first_points, e.second_points, &e.label),
        None => {
            tracing::warn!(
                phase = %phase.name,
                rule = %phase.payoff.id,
                "No payoff entry for ({}, {}); scoring as resolution gap",
                first,
                second
            );
            Payoff::resolution_gap()
        }
    }
}

// ============================================================================
// FORMATTING
// ============================================================================

fn signed(points: i32) -> String {
    if points > 0 {
        format!("+{}", points)
    } else {
        points.to_string()
    }
}

fn unit(points: i32) -> &'static str {
    if points.abs() == 1 {
        "point"
    } else {
        "points"
    }
}

fn both_phrase(own: i32, other: i32) -> String {
    if own == other {
        format!("{} {} each.", signed(own), unit(own))
    } else {
        split_phrase(own, other)
    }
}

fn split_phrase(own: i32, other: i32) -> String {
    format!(
        "You get {} {}, Opponent gets {}.",
        signed(own),
        unit(own),
        signed(other)
    )
}
