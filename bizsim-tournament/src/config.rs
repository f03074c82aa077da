//! Configuration types for tournament play
//!
//! Level 4 - Utilities and configuration

use std::time::Duration;

/// Retry policy applied by the decision port
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per decision, including the first
    pub max_attempts: u32,
    /// Fixed pause after an overload signal before the next attempt
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempts and backoff
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// No waiting between attempts (tests, offline sources)
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

/// Tournament execution options
#[derive(Clone, Debug)]
pub struct TournamentOptions {
    /// Retry policy for every decision request
    pub retry: RetryPolicy,
    /// Matches allowed in flight at once (1 = sequential)
    pub max_concurrent_matches: usize,
    /// Pause after each resolved round, to rate-limit remote sources
    pub round_delay: Duration,
}

impl Default for TournamentOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_concurrent_matches: 1,
            round_delay: Duration::from_millis(100),
        }
    }
}

impl TournamentOptions {
    /// Sequential play with no pauses between rounds
    pub fn sequential() -> Self {
        Self {
            max_concurrent_matches: 1,
            round_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Run up to `matches` matches concurrently
    pub fn parallel(matches: usize) -> Self {
        Self {
            max_concurrent_matches: matches.max(1),
            ..Self::sequential()
        }
    }

    /// Set retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set inter-round pause
    pub fn with_round_delay(mut self, delay: Duration) -> Self {
        self.round_delay = delay;
        self
    }
}
