//! Decision port - the boundary to external decision sources
//!
//! Level 3 - Step-level implementation
//!
//! The engine owns the retry and fallback policy. A source only turns a
//! request into raw text (or an error); the port translates moves to neutral
//! labels on the way out, normalizes the raw reply on the way in, and always
//! yields a valid move.

use std::sync::Arc;

use async_trait::async_trait;
use bizsim_core::{Choice, Move, Phase, Seat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RetryPolicy;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Opponent moves shown to a source (most recent only)
pub const HISTORY_WINDOW: usize = 5;

/// Move used whenever no confident decision is available
pub const DEFAULT_MOVE: Move = Move::Cooperate;

const MARKER_PREFIX: &str = "DECISION:";
const COOPERATE_MARKER: &str = "DECISION: OPTION A";
const EXPLOIT_MARKER: &str = "DECISION: OPTION B";

// ============================================================================
// SOURCE BOUNDARY
// ============================================================================

/// Failure reported by a decision source
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Temporary capacity problem (rate limit); worth retrying after a pause
    #[error("decision source is overloaded")]
    Overloaded,
    /// Anything else; not retried
    #[error("decision source failed: {0}")]
    Failed(String),
}

/// Everything a source may see when asked for a move
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Match the request belongs to (0 outside a tournament)
    pub match_id: u32,
    pub agent: String,
    pub seat: Seat,
    /// 1-indexed round number
    pub round: u32,
    pub total_rounds: u32,
    pub phase_name: String,
    pub phase_description: String,
    /// Payoff matrix rendered from this agent's seat
    pub payoff_matrix: String,
    /// Opponent's most recent choices, oldest first, at most `HISTORY_WINDOW`
    pub opponent_history: Vec<Choice>,
}

impl DecisionRequest {
    /// Build a request, truncating and relabeling the opponent's moves
    pub fn new(
        agent: &str,
        seat: Seat,
        round: u32,
        total_rounds: u32,
        phase: &Phase,
        opponent_moves: &[Move],
    ) -> Self {
        let start = opponent_moves.len().saturating_sub(HISTORY_WINDOW);
        Self {
            match_id: 0,
            agent: agent.to_string(),
            seat,
            round,
            total_rounds,
            phase_name: phase.name.clone(),
            phase_description: phase.description.clone(),
            payoff_matrix: phase.payoff.describe(seat),
            opponent_history: opponent_moves[start..].iter().map(|m| m.to_choice()).collect(),
        }
    }

    pub fn with_match_id(mut self, match_id: u32) -> Self {
        self.match_id = match_id;
        self
    }
}

/// Something that can answer a decision request with raw text
#[async_trait]
pub trait DecisionSource: Send + Sync {
    async fn query(&self, request: &DecisionRequest) -> Result<String, SourceError>;
}

// ============================================================================
// DECISIONS
// ============================================================================

/// Why the default move was used
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackReason {
    /// Reply could not be parsed into a move
    Ambiguous,
    /// Source failed with a non-transient error
    Unreachable,
    /// Every attempt hit an overload
    Exhausted,
}

/// Provenance of a move; diagnostic only, never affects scoring
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionNote {
    Chosen,
    Fallback(FallbackReason),
}

/// A move as delivered by the port
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub choice: Move,
    pub note: DecisionNote,
}

impl Decision {
    pub fn chosen(choice: Move) -> Self {
        Self {
            choice,
            note: DecisionNote::Chosen,
        }
    }

    pub fn fallback(reason: FallbackReason) -> Self {
        Self {
            choice: DEFAULT_MOVE,
            note: DecisionNote::Fallback(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.note, DecisionNote::Fallback(_))
    }
}

/// Engine-side wrapper that applies retry and fallback around a source
#[derive(Clone)]
pub struct DecisionPort {
    source: Arc<dyn DecisionSource>,
    retry: RetryPolicy,
}

impl DecisionPort {
    pub fn new(source: Arc<dyn DecisionSource>, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Ask the source for a move. Never fails.
    pub async fn decide(&self, request: &DecisionRequest) -> Decision {
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.source.query(request).await {
                Ok(raw) => {
                    return match normalize_response(&raw) {
                        Some(choice) => Decision::chosen(choice),
                        None => {
                            tracing::warn!(
                                agent = %request.agent,
                                round = request.round,
                                "Unparseable decision, defaulting to {}",
                                DEFAULT_MOVE
                            );
                            Decision::fallback(FallbackReason::Ambiguous)
                        }
                    };
                }
                Err(SourceError::Overloaded) => {
                    tracing::warn!(
                        agent = %request.agent,
                        round = request.round,
                        "Source overloaded (attempt {}/{})",
                        attempt,
                        max_attempts
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry.backoff).await;
                    }
                }
                Err(SourceError::Failed(reason)) => {
                    tracing::warn!(
                        agent = %request.agent,
                        round = request.round,
                        "Source failed: {}; defaulting to {}",
                        reason,
                        DEFAULT_MOVE
                    );
                    return Decision::fallback(FallbackReason::Unreachable);
                }
            }
        }

        tracing::warn!(
            agent = %request.agent,
            round = request.round,
            "Retries exhausted, defaulting to {}",
            DEFAULT_MOVE
        );
        Decision::fallback(FallbackReason::Exhausted)
    }
}

// ============================================================================
// RESPONSE NORMALIZATION
// ============================================================================

/// Turn a raw reply into a move.
///
/// An explicit `DECISION: OPTION A|B` marker wins when exactly one of the two
/// appears. Otherwise the text after the last `DECISION:` (or the whole text)
/// is scanned for `OPTION B` then `OPTION A`. Returns `None` when nothing
/// matches.
pub fn normalize_response(raw: &str) -> Option<Move> {
    let text = raw.trim().to_uppercase();

    match (text.contains(COOPERATE_MARKER), text.contains(EXPLOIT_MARKER)) {
        (true, false) => return Some(Move::Cooperate),
        (false, true) => return Some(Move::Exploit),
        _ => {}
    }

    let tail = match text.rfind(MARKER_PREFIX) {
        Some(idx) => &text[idx + MARKER_PREFIX.len()..],
        None => text.as_str(),
    };

    if tail.contains("OPTION B") {
        Some(Move::Exploit)
    } else if tail.contains("OPTION A") {
        Some(Move::Cooperate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizsim_core::SimulationConfig;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Source that replays a fixed list of replies and counts calls
    struct ReplaySource {
        replies: Mutex<VecDeque<Result<String, SourceError>>>,
        calls: AtomicU32,
    }

    impl ReplaySource {
        fn new(replies: Vec<Result<String, SourceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DecisionSource for ReplaySource {
        async fn query(&self, _request: &DecisionRequest) -> Result<String, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SourceError::Failed("no reply left".into())))
        }
    }

    fn request_with_history(history: &[Move]) -> DecisionRequest {
        let config = SimulationConfig::reference();
        DecisionRequest::new("agent-x", Seat::First, 7, 100, &config.phases[0], history)
    }

    fn request() -> DecisionRequest {
        request_with_history(&[])
    }

    #[test]
    fn test_normalize_terminal_marker_with_both_options_mentioned() {
        let raw = "Option A yields +3 each, Option B yields +5 if they pick Option A.\nDECISION: OPTION B";
        assert_eq!(normalize_response(raw), Some(Move::Exploit));
    }

    #[test]
    fn test_normalize_no_marker_defaults_to_none() {
        assert_eq!(normalize_response("I need more information."), None);
        assert_eq!(normalize_response(""), None);
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        assert_eq!(normalize_response("decision: option a"), Some(Move::Cooperate));
    }

    #[test]
    fn test_normalize_both_markers_uses_last_decision() {
        let raw = "Draft: DECISION: OPTION B. Revised: DECISION: OPTION A";
        assert_eq!(normalize_response(raw), Some(Move::Cooperate));

        let raw = "DECISION: OPTION A ... on reflection DECISION: OPTION B";
        assert_eq!(normalize_response(raw), Some(Move::Exploit));
    }

    #[test]
    fn test_normalize_loose_tail_prefers_b() {
        assert_eq!(
            normalize_response("Decision:  either Option A or Option B"),
            Some(Move::Exploit)
        );
        assert_eq!(normalize_response("Decision:   Option A!"), Some(Move::Cooperate));
        assert_eq!(normalize_response("I'll go with option b"), Some(Move::Exploit));
    }

    #[test]
    fn test_request_truncates_and_relabels_history() {
        use Move::{Cooperate as C, Exploit as E};
        let req = request_with_history(&[E, E, C, C, E, C, E]);
        assert_eq!(
            req.opponent_history,
            vec![
                Choice::OptionA,
                Choice::OptionA,
                Choice::OptionB,
                Choice::OptionA,
                Choice::OptionB,
            ]
        );
        assert_eq!(req.round, 7);
        assert!(req.payoff_matrix.starts_with("- Both choose Option A"));
    }

    #[tokio::test]
    async fn test_decide_confident() {
        let source = ReplaySource::new(vec![Ok("DECISION: OPTION B".into())]);
        let port = DecisionPort::new(source.clone(), RetryPolicy::immediate(3));

        let decision = port.decide(&request()).await;
        assert_eq!(decision, Decision::chosen(Move::Exploit));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_decide_ambiguous_falls_back_without_retry() {
        let source = ReplaySource::new(vec![Ok("hmm".into()), Ok("DECISION: OPTION B".into())]);
        let port = DecisionPort::new(source.clone(), RetryPolicy::immediate(3));

        let decision = port.decide(&request()).await;
        assert_eq!(decision.choice, Move::Cooperate);
        assert_eq!(decision.note, DecisionNote::Fallback(FallbackReason::Ambiguous));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_decide_hard_failure_is_not_retried() {
        let source = ReplaySource::new(vec![
            Err(SourceError::Failed("401 unauthorized".into())),
            Ok("DECISION: OPTION B".into()),
        ]);
        let port = DecisionPort::new(source.clone(), RetryPolicy::immediate(3));

        let decision = port.decide(&request()).await;
        assert_eq!(decision, Decision::fallback(FallbackReason::Unreachable));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_decide_recovers_after_overload() {
        let source = ReplaySource::new(vec![
            Err(SourceError::Overloaded),
            Err(SourceError::Overloaded),
            Ok("DECISION: OPTION B".into()),
        ]);
        let port = DecisionPort::new(source.clone(), RetryPolicy::immediate(3));

        let decision = port.decide(&request()).await;
        assert_eq!(decision, Decision::chosen(Move::Exploit));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decide_exhausted_waits_between_attempts_only() {
        let source = ReplaySource::new(vec![
            Err(SourceError::Overloaded),
            Err(SourceError::Overloaded),
            Err(SourceError::Overloaded),
            Ok("DECISION: OPTION B".into()),
        ]);
        let port = DecisionPort::new(source.clone(), RetryPolicy::new(3, Duration::from_secs(5)));

        let started = tokio::time::Instant::now();
        let decision = port.decide(&request()).await;
        let elapsed = started.elapsed();

        assert_eq!(decision, Decision::fallback(FallbackReason::Exhausted));
        assert!(decision.is_fallback());
        assert_eq!(source.calls(), 3);
        assert!(elapsed >= Duration::from_secs(10), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(15), "elapsed {:?}", elapsed);
    }
}
