//! Moves, neutral choice labels and seats

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CORE TYPES
// ============================================================================

/// A move in the market game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Move {
    /// Mutually restrained choice
    Cooperate,
    /// Unilaterally aggressive choice
    Exploit,
}

impl Move {
    pub const ALL: [Move; 2] = [Move::Cooperate, Move::Exploit];

    /// Neutral label shown to decision sources
    pub fn to_choice(self) -> Choice {
        match self {
            Move::Cooperate => Choice::OptionA,
            Move::Exploit => Choice::OptionB,
        }
    }

    /// Single-letter code used in progress logs
    pub fn initial(self) -> char {
        match self {
            Move::Cooperate => 'C',
            Move::Exploit => 'E',
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Cooperate => write!(f, "COOPERATE"),
            Move::Exploit => write!(f, "EXPLOIT"),
        }
    }
}

/// Neutral label for a move, free of the engine's vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    #[serde(rename = "Option A")]
    OptionA,
    #[serde(rename = "Option B")]
    OptionB,
}

impl Choice {
    pub fn to_move(self) -> Move {
        match self {
            Choice::OptionA => Move::Cooperate,
            Choice::OptionB => Move::Exploit,
        }
    }
}

impl From<Move> for Choice {
    fn from(mv: Move) -> Self {
        mv.to_choice()
    }
}

impl From<Choice> for Move {
    fn from(choice: Choice) -> Self {
        choice.to_move()
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::OptionA => write!(f, "Option A"),
            Choice::OptionB => write!(f, "Option B"),
        }
    }
}

/// Role held by an agent for a whole match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    First,
    Second,
}

/// Match result from the seats' point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchWinner {
    First,
    Second,
    Draw,
}

impl MatchWinner {
    /// Strictly greater score wins; equal scores draw
    pub fn from_scores(first: i64, second: i64) -> Self {
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => MatchWinner::First,
            std::cmp::Ordering::Less => MatchWinner::Second,
            std::cmp::Ordering::Equal => MatchWinner::Draw,
        }
    }

    /// Short label used in match summaries ("A", "B", "Draw")
    pub fn label(self) -> &'static str {
        match self {
            MatchWinner::First => "A",
            MatchWinner::Second => "B",
            MatchWinner::Draw => "Draw",
        }
    }
}
