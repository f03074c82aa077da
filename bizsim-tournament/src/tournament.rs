//! Tournament execution - round-robin over every ordered pair
//!
//! Level 1 - Orchestration and Level 2 - Phases

use std::sync::Arc;

use bizsim_core::{ConfigError, PhaseTable, SimulationConfig};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::config::TournamentOptions;
use crate::decision::{DecisionPort, DecisionSource};
use crate::match_play::{play_match, short_name, MatchContext, MatchRecord};
use crate::round::RoundRecord;
use crate::stats::{AgentStats, LeaderboardEntry, StatsAggregator};

/// Head-to-head scores
///
/// Rows are the first-seat agent, columns the second-seat agent; each cell
/// holds the first agent's score in that pairing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreMatrix {
    pub agents: Vec<String>,
    pub cells: Vec<Vec<Option<i64>>>,
}

impl ScoreMatrix {
    fn new(agents: &[String]) -> Self {
        let n = agents.len();
        Self {
            agents: agents.to_vec(),
            cells: vec![vec![None; n]; n],
        }
    }

    /// Score of `first` playing first against `second`
    pub fn get(&self, first: &str, second: &str) -> Option<i64> {
        let i = self.position(first)?;
        let j = self.position(second)?;
        self.cells[i][j]
    }

    fn position(&self, agent: &str) -> Option<usize> {
        self.agents.iter().position(|a| a == agent)
    }

    fn set(&mut self, record: &MatchRecord) {
        if let (Some(i), Some(j)) = (self.position(&record.first_agent), self.position(&record.second_agent)) {
            self.cells[i][j] = Some(record.first_score);
        }
    }
}

/// Result of a tournament
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentReport {
    /// Ranked by average score per round
    pub leaderboard: Vec<LeaderboardEntry>,
    pub matrix: ScoreMatrix,
    /// Every match in enumeration order
    pub matches: Vec<MatchRecord>,
    /// Per-agent totals in first-reference order
    pub stats: Vec<AgentStats>,
}

impl TournamentReport {
    /// Every round of every match, in order
    pub fn round_log(&self) -> impl Iterator<Item = &RoundRecord> {
        self.matches.iter().flat_map(|m| m.rounds.iter())
    }

    /// Top of the leaderboard
    pub fn winner(&self) -> Option<&LeaderboardEntry> {
        self.leaderboard.first()
    }

    pub fn stats_for(&self, agent: &str) -> Option<&AgentStats> {
        self.stats.iter().find(|s| s.agent == agent)
    }
}

// ============================================================================
// Level 1 - Orchestration
// ============================================================================

/// Run a round-robin tournament (Level 1 orchestration)
///
/// Every agent meets every other agent twice, once in each seat. Only an
/// invalid configuration fails, and it fails before any match is played.
pub async fn run_tournament(
    config: &SimulationConfig,
    source: Arc<dyn DecisionSource>,
    options: &TournamentOptions,
) -> Result<TournamentReport, ConfigError> {
    let table = config.validate()?;
    let pairings = generate_ordered_pairings(config.roster.len());

    tracing::info!(
        "Starting tournament: {} agents, {} matches, {} rounds per match",
        config.roster.len(),
        pairings.len(),
        table.total_rounds()
    );

    let port = DecisionPort::new(source, options.retry.clone());
    let report = run_round_robin(&config.roster, &pairings, &table, &port, options).await;

    if let Some(top) = report.winner() {
        tracing::info!(
            "Tournament complete: {} leads with {:.2} per round",
            short_name(&top.agent),
            top.avg_score_per_round
        );
    }
    Ok(report)
}

// ============================================================================
// Level 2 - Phases
// ============================================================================

/// Play every pairing and fold the results (Level 2 phase)
async fn run_round_robin(
    roster: &[String],
    pairings: &[(usize, usize)],
    table: &PhaseTable,
    port: &DecisionPort,
    options: &TournamentOptions,
) -> TournamentReport {
    let ctx = MatchContext::new(port, table).with_round_delay(options.round_delay);

    // Results come back in enumeration order even when matches overlap
    let mut outcomes = std::pin::pin!(stream::iter(pairings.iter().enumerate())
        .map(move |(k, &(i, j))| play_match(k as u32 + 1, &roster[i], &roster[j], ctx))
        .buffered(options.max_concurrent_matches.max(1)));

    let mut aggregator = StatsAggregator::new();
    let mut matrix = ScoreMatrix::new(roster);
    let mut matches = Vec::with_capacity(pairings.len());

    while let Some(outcome) = outcomes.next().await {
        aggregator.record(&outcome);
        matrix.set(&outcome.record);
        matches.push(outcome.record);
    }

    TournamentReport {
        leaderboard: aggregator.leaderboard(),
        matrix,
        matches,
        stats: aggregator.stats().to_vec(),
    }
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// All ordered pairs `(i, j)` with `i != j`, row by row
pub fn generate_ordered_pairings(n: usize) -> Vec<(usize, usize)> {
    let mut pairings = Vec::with_capacity(n * n.saturating_sub(1));
    for i in 0..n {
        for j in 0..n {
            if i != j {
                pairings.push((i, j));
            }
        }
    }
    pairings
}
