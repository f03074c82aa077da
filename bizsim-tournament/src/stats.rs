//! Stats aggregation - per-agent totals across a tournament
//!
//! Level 2 - Phase-level implementation

use bizsim_core::{MatchWinner, Seat};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::decision::DecisionNote;
use crate::match_play::MatchOutcome;

/// Cumulative statistics for one agent
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    pub agent: String,
    /// Total score across all matches, both seats
    pub score: i64,
    pub matches: u32,
    pub rounds: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub cooperate_count: u32,
    pub exploit_count: u32,
    /// Moves that were the default rather than the agent's own
    pub fallback_count: u32,
}

impl AgentStats {
    fn new(agent: &str) -> Self {
        Self {
            agent: agent.to_string(),
            ..Default::default()
        }
    }

    /// Average score per round played
    pub fn avg_score_per_round(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.score as f64 / self.rounds as f64
        }
    }

    /// Cooperation rate as a percentage of rounds played
    pub fn cooperation_rate(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.cooperate_count as f64 / self.rounds as f64 * 100.0
        }
    }
}

/// One row of the leaderboard
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub agent: String,
    pub avg_score_per_round: f64,
    pub total_score: i64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Percentage of rounds where the agent cooperated
    pub cooperation_rate: f64,
    pub exploit_count: u32,
}

impl LeaderboardEntry {
    /// W-L-D record
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.wins, self.losses, self.draws)
    }
}

impl From<&AgentStats> for LeaderboardEntry {
    fn from(stats: &AgentStats) -> Self {
        LeaderboardEntry {
            agent: stats.agent.clone(),
            avg_score_per_round: stats.avg_score_per_round(),
            total_score: stats.score,
            wins: stats.wins,
            losses: stats.losses,
            draws: stats.draws,
            cooperation_rate: stats.cooperation_rate(),
            exploit_count: stats.exploit_count,
        }
    }
}

/// Folds finished matches into per-agent stats
///
/// Agents are kept in first-reference order; the index map only speeds up
/// lookups.
#[derive(Clone, Debug, Default)]
pub struct StatsAggregator {
    index: FxHashMap<String, usize>,
    agents: Vec<AgentStats>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update both agents of a finished match
    pub fn record(&mut self, outcome: &MatchOutcome) {
        for seat in [Seat::First, Seat::Second] {
            self.record_side(outcome, seat);
        }
    }

    /// Snapshot of all agents in first-reference order
    pub fn stats(&self) -> &[AgentStats] {
        &self.agents
    }

    pub fn get(&self, agent: &str) -> Option<&AgentStats> {
        self.index.get(agent).map(|&i| &self.agents[i])
    }

    /// Ranking by average score per round, best first
    ///
    /// Agents without rounds are left out. Ties keep first-reference order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .agents
            .iter()
            .filter(|s| s.rounds > 0)
            .map(LeaderboardEntry::from)
            .collect();

        entries.sort_by(|a, b| {
            b.avg_score_per_round
                .partial_cmp(&a.avg_score_per_round)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        entries
    }

    // ========================================================================
    // Level 3 - Steps
    // ========================================================================

    fn record_side(&mut self, outcome: &MatchOutcome, seat: Seat) {
        let record = &outcome.record;
        let tally = outcome.tally(seat);
        let fallbacks = record
            .rounds
            .iter()
            .filter(|r| matches!(r.note_for(seat), DecisionNote::Fallback(_)))
            .count() as u32;

        let won = match (record.winner, seat) {
            (MatchWinner::Draw, _) => None,
            (MatchWinner::First, Seat::First) | (MatchWinner::Second, Seat::Second) => Some(true),
            _ => Some(false),
        };

        let stats = self.entry(record.agent(seat));
        stats.score += record.score(seat);
        stats.matches += 1;
        stats.rounds += record.rounds_played();
        stats.cooperate_count += tally.cooperate;
        stats.exploit_count += tally.exploit;
        stats.fallback_count += fallbacks;
        match won {
            Some(true) => stats.wins += 1,
            Some(false) => stats.losses += 1,
            None => stats.draws += 1,
        }
    }

    fn entry(&mut self, agent: &str) -> &mut AgentStats {
        let i = match self.index.get(agent) {
            Some(&i) => i,
            None => {
                self.agents.push(AgentStats::new(agent));
                let i = self.agents.len() - 1;
                self.index.insert(agent.to_string(), i);
                i
            }
        };
        &mut self.agents[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::FallbackReason;
    use crate::match_play::{MatchRecord, MoveTally};
    use crate::round::RoundRecord;
    use bizsim_core::Move;

    fn round(n: u32, first: Move, second: Move, points: (i32, i32), notes: (DecisionNote, DecisionNote)) -> RoundRecord {
        RoundRecord {
            match_id: 1,
            round: n,
            phase: "Phase 1: Baseline Stability".to_string(),
            first_agent: String::new(),
            second_agent: String::new(),
            first_move: first,
            second_move: second,
            first_points: points.0,
            second_points: points.1,
            outcome: String::new(),
            first_note: notes.0,
            second_note: notes.1,
        }
    }

    fn outcome(first: &str, second: &str, rounds: Vec<RoundRecord>) -> MatchOutcome {
        let first_moves: Vec<Move> = rounds.iter().map(|r| r.first_move).collect();
        let second_moves: Vec<Move> = rounds.iter().map(|r| r.second_move).collect();
        let first_score: i64 = rounds.iter().map(|r| r.first_points as i64).sum();
        let second_score: i64 = rounds.iter().map(|r| r.second_points as i64).sum();

        MatchOutcome {
            record: MatchRecord {
                match_id: 1,
                first_agent: first.to_string(),
                second_agent: second.to_string(),
                first_score,
                second_score,
                mutual_cooperation: 0,
                mutual_exploitation: 0,
                winner: MatchWinner::from_scores(first_score, second_score),
                rounds,
            },
            first_tally: MoveTally::from_moves(&first_moves),
            second_tally: MoveTally::from_moves(&second_moves),
        }
    }

    const CHOSEN: (DecisionNote, DecisionNote) = (DecisionNote::Chosen, DecisionNote::Chosen);

    #[test]
    fn test_record_updates_both_agents() {
        let mut agg = StatsAggregator::new();
        agg.record(&outcome(
            "hawk",
            "dove",
            vec![
                round(1, Move::Exploit, Move::Cooperate, (5, 0), CHOSEN),
                round(2, Move::Exploit, Move::Exploit, (1, 1), CHOSEN),
            ],
        ));

        let hawk = agg.get("hawk").unwrap();
        assert_eq!(hawk.score, 6);
        assert_eq!((hawk.wins, hawk.losses, hawk.draws), (1, 0, 0));
        assert_eq!(hawk.exploit_count, 2);
        assert_eq!(hawk.rounds, 2);

        let dove = agg.get("dove").unwrap();
        assert_eq!(dove.score, 1);
        assert_eq!((dove.wins, dove.losses, dove.draws), (0, 1, 0));
        assert_eq!(dove.cooperate_count, 1);
        assert_eq!(dove.cooperation_rate(), 50.0);
    }

    #[test]
    fn test_draw_and_fallback_counting() {
        let mut agg = StatsAggregator::new();
        let fallback = DecisionNote::Fallback(FallbackReason::Unreachable);
        agg.record(&outcome(
            "a",
            "b",
            vec![
                round(1, Move::Cooperate, Move::Cooperate, (3, 3), (fallback, DecisionNote::Chosen)),
                round(2, Move::Cooperate, Move::Cooperate, (3, 3), (fallback, fallback)),
            ],
        ));

        assert_eq!(agg.get("a").unwrap().draws, 1);
        assert_eq!(agg.get("b").unwrap().draws, 1);
        assert_eq!(agg.get("a").unwrap().fallback_count, 2);
        assert_eq!(agg.get("b").unwrap().fallback_count, 1);
    }

    #[test]
    fn test_stats_keep_first_reference_order() {
        let mut agg = StatsAggregator::new();
        agg.record(&outcome("b", "a", vec![round(1, Move::Cooperate, Move::Cooperate, (3, 3), CHOSEN)]));
        agg.record(&outcome("c", "b", vec![round(1, Move::Cooperate, Move::Cooperate, (3, 3), CHOSEN)]));

        let order: Vec<&str> = agg.stats().iter().map(|s| s.agent.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(agg.get("b").unwrap().matches, 2);
    }

    #[test]
    fn test_leaderboard_sorted_by_average_with_stable_ties() {
        let mut agg = StatsAggregator::new();
        agg.record(&outcome(
            "low",
            "high",
            vec![round(1, Move::Cooperate, Move::Exploit, (0, 5), CHOSEN)],
        ));
        agg.record(&outcome(
            "tie-a",
            "tie-b",
            vec![round(1, Move::Cooperate, Move::Cooperate, (3, 3), CHOSEN)],
        ));

        let board = agg.leaderboard();
        let names: Vec<&str> = board.iter().map(|e| e.agent.as_str()).collect();
        assert_eq!(names, vec!["high", "tie-a", "tie-b", "low"]);
        assert_eq!(board[0].record(), "1-0-0");
        assert_eq!(board[3].record(), "0-1-0");
        assert_eq!(board[0].avg_score_per_round, 5.0);
    }

    #[test]
    fn test_empty_aggregator() {
        let agg = StatsAggregator::new();
        assert!(agg.stats().is_empty());
        assert!(agg.leaderboard().is_empty());
        assert!(agg.get("anyone").is_none());
    }
}
