//! Scripted decision source
//!
//! Each agent id names a fixed strategy (`tit-for-tat`, `random#2`, ...).
//! Replies use the same `DECISION: OPTION X` phrasing a model would, so
//! they go through the port's normal parsing path.

use std::hash::{Hash, Hasher};
use std::str::FromStr;

use async_trait::async_trait;
use bizsim_core::Choice;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHasher};
use thiserror::Error;

use crate::decision::{DecisionRequest, DecisionSource, SourceError};

/// Strategy name that could not be recognized
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown strategy '{0}' (expected one of: {names})", names = Strategy::NAMES.join(", "))]
pub struct UnknownStrategy(pub String);

/// Fixed strategies, driven only by the opponent's visible history
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Always pick the restrained option
    AlwaysCooperate,
    /// Always pick the aggressive option
    AlwaysExploit,
    /// Copy the opponent's last choice, start restrained
    TitForTat,
    /// Tit-for-tat that opens aggressively
    SuspiciousTitForTat,
    /// Aggressive while the opponent's visible history holds an aggressive
    /// choice. Sources only see the last `HISTORY_WINDOW` moves, so the
    /// trigger lapses once the offence scrolls out of view.
    GrimTrigger,
    /// Coin flip, seeded per match, agent, seat and round
    Random,
}

impl Strategy {
    pub const NAMES: [&'static str; 6] = [
        "always-cooperate",
        "always-exploit",
        "tit-for-tat",
        "suspicious-tit-for-tat",
        "grim-trigger",
        "random",
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::AlwaysCooperate => "always-cooperate",
            Strategy::AlwaysExploit => "always-exploit",
            Strategy::TitForTat => "tit-for-tat",
            Strategy::SuspiciousTitForTat => "suspicious-tit-for-tat",
            Strategy::GrimTrigger => "grim-trigger",
            Strategy::Random => "random",
        }
    }

    /// Parse an agent id, ignoring any `#label` suffix
    pub fn from_agent_id(agent: &str) -> Result<Self, UnknownStrategy> {
        let base = agent.split('#').next().unwrap_or(agent);
        base.parse()
    }

    fn choose(self, history: &[Choice], rng: &mut ChaCha8Rng) -> Choice {
        match self {
            Strategy::AlwaysCooperate => Choice::OptionA,
            Strategy::AlwaysExploit => Choice::OptionB,
            Strategy::TitForTat => history.last().copied().unwrap_or(Choice::OptionA),
            Strategy::SuspiciousTitForTat => history.last().copied().unwrap_or(Choice::OptionB),
            Strategy::GrimTrigger => {
                if history.contains(&Choice::OptionB) {
                    Choice::OptionB
                } else {
                    Choice::OptionA
                }
            }
            Strategy::Random => {
                if rng.gen_bool(0.5) {
                    Choice::OptionB
                } else {
                    Choice::OptionA
                }
            }
        }
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always-cooperate" => Ok(Strategy::AlwaysCooperate),
            "always-exploit" => Ok(Strategy::AlwaysExploit),
            "tit-for-tat" => Ok(Strategy::TitForTat),
            "suspicious-tit-for-tat" => Ok(Strategy::SuspiciousTitForTat),
            "grim-trigger" => Ok(Strategy::GrimTrigger),
            "random" => Ok(Strategy::Random),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Decision source backed by fixed strategies
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    strategies: FxHashMap<String, Strategy>,
    seed: u64,
}

impl ScriptedSource {
    pub fn new(seed: u64) -> Self {
        Self {
            strategies: FxHashMap::default(),
            seed,
        }
    }

    /// Register every roster entry by parsing its id as a strategy name
    pub fn from_roster(roster: &[String], seed: u64) -> Result<Self, UnknownStrategy> {
        let mut source = Self::new(seed);
        for agent in roster {
            let strategy = Strategy::from_agent_id(agent)?;
            source.strategies.insert(agent.clone(), strategy);
        }
        Ok(source)
    }

    /// Register an agent with an explicit strategy
    pub fn with_agent(mut self, agent: &str, strategy: Strategy) -> Self {
        self.strategies.insert(agent.to_string(), strategy);
        self
    }

    pub fn strategy_for(&self, agent: &str) -> Option<Strategy> {
        self.strategies.get(agent).copied()
    }

    fn rng_for(&self, request: &DecisionRequest) -> ChaCha8Rng {
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        request.match_id.hash(&mut hasher);
        request.agent.hash(&mut hasher);
        request.seat.hash(&mut hasher);
        request.round.hash(&mut hasher);
        ChaCha8Rng::seed_from_u64(hasher.finish())
    }
}

#[async_trait]
impl DecisionSource for ScriptedSource {
    async fn query(&self, request: &DecisionRequest) -> Result<String, SourceError> {
        let strategy = self
            .strategy_for(&request.agent)
            .ok_or_else(|| SourceError::Failed(format!("no strategy registered for '{}'", request.agent)))?;

        let mut rng = self.rng_for(request);
        let choice = strategy.choose(&request.opponent_history, &mut rng);

        Ok(format!(
            "Playing {}.\nDECISION: {}",
            strategy.name(),
            choice.to_string().to_uppercase()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{normalize_response, HISTORY_WINDOW};
    use bizsim_core::{Move, Seat, SimulationConfig};

    fn request(agent: &str, round: u32, history: &[Move]) -> DecisionRequest {
        let config = SimulationConfig::reference();
        DecisionRequest::new(agent, Seat::First, round, 100, &config.phases[0], history)
    }

    async fn decide(source: &ScriptedSource, agent: &str, round: u32, history: &[Move]) -> Move {
        let raw = source.query(&request(agent, round, history)).await.unwrap();
        normalize_response(&raw).unwrap()
    }

    #[test]
    fn test_parse_strategy_names() {
        for name in Strategy::NAMES {
            let strategy: Strategy = name.parse().unwrap();
            assert_eq!(strategy.name(), name);
        }
        assert_eq!(Strategy::from_agent_id("random#2"), Ok(Strategy::Random));
        assert!(Strategy::from_agent_id("pavlov").is_err());
    }

    #[test]
    fn test_from_roster_rejects_unknown() {
        let roster = vec!["tit-for-tat".to_string(), "mystery".to_string()];
        assert_eq!(
            ScriptedSource::from_roster(&roster, 1).unwrap_err(),
            UnknownStrategy("mystery".to_string())
        );
    }

    #[tokio::test]
    async fn test_tit_for_tat_mirrors_last_move() {
        let source = ScriptedSource::new(0).with_agent("tft", Strategy::TitForTat);
        assert_eq!(decide(&source, "tft", 1, &[]).await, Move::Cooperate);
        assert_eq!(decide(&source, "tft", 2, &[Move::Exploit]).await, Move::Exploit);
        assert_eq!(
            decide(&source, "tft", 3, &[Move::Exploit, Move::Cooperate]).await,
            Move::Cooperate
        );
    }

    #[tokio::test]
    async fn test_grim_trigger_and_suspicious() {
        let source = ScriptedSource::new(0)
            .with_agent("grim", Strategy::GrimTrigger)
            .with_agent("stft", Strategy::SuspiciousTitForTat);

        assert_eq!(decide(&source, "grim", 1, &[Move::Cooperate]).await, Move::Cooperate);
        assert_eq!(
            decide(&source, "grim", 3, &[Move::Exploit, Move::Cooperate]).await,
            Move::Exploit
        );
        assert_eq!(decide(&source, "stft", 1, &[]).await, Move::Exploit);
    }

    #[tokio::test]
    async fn test_grim_trigger_only_remembers_the_window() {
        let source = ScriptedSource::new(0).with_agent("grim", Strategy::GrimTrigger);

        let mut history = vec![Move::Exploit];
        history.extend(std::iter::repeat(Move::Cooperate).take(HISTORY_WINDOW - 1));
        assert_eq!(decide(&source, "grim", 6, &history).await, Move::Exploit);

        history.push(Move::Cooperate);
        assert_eq!(decide(&source, "grim", 7, &history).await, Move::Cooperate);
    }

    #[tokio::test]
    async fn test_random_differs_between_matches() {
        let source = ScriptedSource::new(42).with_agent("random", Strategy::Random);
        let config = SimulationConfig::reference();

        let mut sequences = Vec::new();
        for match_id in [1, 2] {
            let mut moves = Vec::new();
            for round in 1..=40 {
                let request = DecisionRequest::new("random", Seat::First, round, 100, &config.phases[0], &[])
                    .with_match_id(match_id);
                let raw = source.query(&request).await.unwrap();
                moves.push(normalize_response(&raw).unwrap());
            }
            sequences.push(moves);
        }
        assert_ne!(sequences[0], sequences[1]);
    }

    #[tokio::test]
    async fn test_random_is_reproducible() {
        let a = ScriptedSource::new(42).with_agent("random", Strategy::Random);
        let b = ScriptedSource::new(42).with_agent("random", Strategy::Random);

        let mut moves = Vec::new();
        for round in 1..=40 {
            let x = decide(&a, "random", round, &[]).await;
            let y = decide(&b, "random", round, &[]).await;
            assert_eq!(x, y);
            moves.push(x);
        }
        assert!(moves.contains(&Move::Cooperate));
        assert!(moves.contains(&Move::Exploit));
    }

    #[tokio::test]
    async fn test_unregistered_agent_fails() {
        let source = ScriptedSource::new(0);
        let err = source.query(&request("ghost", 1, &[])).await.unwrap_err();
        assert!(matches!(err, SourceError::Failed(_)));
    }
}
