//! Market phases and the phase table
//!
//! A phase is a contiguous range of rounds sharing one payoff rule. The
//! table is built from configuration and validated once, so lookups can
//! only fail for rounds outside `[1, total_rounds]`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ConfigError;
use crate::payoff::PayoffRule;

/// Upper bound on rounds per match
pub const MAX_ROUNDS: u32 = 1_000_000;

/// A contiguous range of rounds with its own payoff rule
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub description: String,
    /// First round of the phase (inclusive, 1-indexed)
    pub first_round: u32,
    /// Last round of the phase (inclusive)
    pub last_round: u32,
    pub payoff: PayoffRule,
}

impl Phase {
    pub fn contains(&self, round: u32) -> bool {
        (self.first_round..=self.last_round).contains(&round)
    }

    /// Number of rounds in this phase
    pub fn len(&self) -> u32 {
        self.last_round.saturating_sub(self.first_round).saturating_add(1)
    }
}

/// Lookup failure for a round outside the simulation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("round {round} is outside [1, {total_rounds}]")]
    OutOfRange { round: u32, total_rounds: u32 },
}

/// Ordered phases covering every round exactly once
#[derive(Clone, Debug)]
pub struct PhaseTable {
    phases: Vec<Phase>,
    total_rounds: u32,
}

impl PhaseTable {
    /// Build a table, checking the phases are ordered, contiguous and cover
    /// `[1, total_rounds]` with no gaps or overlaps
    pub fn new(phases: Vec<Phase>, total_rounds: u32) -> Result<Self, ConfigError> {
        if total_rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if total_rounds > MAX_ROUNDS {
            return Err(ConfigError::TooManyRounds {
                total_rounds,
                max: MAX_ROUNDS,
            });
        }
        if phases.is_empty() {
            return Err(ConfigError::NoPhases);
        }

        let mut expected = 1u32;
        for phase in &phases {
            if phase.first_round > phase.last_round {
                return Err(ConfigError::InvertedPhase {
                    phase: phase.name.clone(),
                    first_round: phase.first_round,
                    last_round: phase.last_round,
                });
            }
            if phase.first_round > expected {
                return Err(ConfigError::PhaseGap {
                    phase: phase.name.clone(),
                    expected,
                    found: phase.first_round,
                });
            }
            if phase.first_round < expected {
                return Err(ConfigError::PhaseOverlap {
                    phase: phase.name.clone(),
                    round: phase.first_round,
                });
            }
            if phase.last_round > total_rounds {
                return Err(ConfigError::PhaseBeyondRounds {
                    phase: phase.name.clone(),
                    last_round: phase.last_round,
                    total_rounds,
                });
            }
            phase.payoff.validate(&phase.name)?;
            // last_round <= total_rounds <= MAX_ROUNDS
            expected = phase.last_round + 1;
        }

        if expected != total_rounds + 1 {
            return Err(ConfigError::UncoveredRounds {
                covered: expected - 1,
                total_rounds,
            });
        }

        Ok(Self {
            phases,
            total_rounds,
        })
    }

    /// Phase in effect for a 1-indexed round
    pub fn phase_for(&self, round: u32) -> Result<&Phase, PhaseError> {
        self.phases
            .iter()
            .find(|p| p.contains(round))
            .ok_or(PhaseError::OutOfRange {
                round,
                total_rounds: self.total_rounds,
            })
    }

    /// Every round in order, paired with its phase
    pub fn schedule(&self) -> impl Iterator<Item = (u32, &Phase)> + '_ {
        self.phases
            .iter()
            .flat_map(|p| (p.first_round..=p.last_round).map(move |r| (r, p)))
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn reference_table() -> PhaseTable {
        let config = SimulationConfig::reference();
        PhaseTable::new(config.phases, config.total_rounds).unwrap()
    }

    #[test]
    fn test_reference_partition() {
        let table = reference_table();
        let ranges: Vec<(u32, u32)> = table
            .phases()
            .iter()
            .map(|p| (p.first_round, p.last_round))
            .collect();
        assert_eq!(ranges, vec![(1, 25), (26, 50), (51, 75), (76, 100)]);
    }

    #[test]
    fn test_every_round_has_exactly_one_phase() {
        let table = reference_table();
        for round in 1..=100 {
            let owners = table.phases().iter().filter(|p| p.contains(round)).count();
            assert_eq!(owners, 1, "round {} owned by {} phases", round, owners);
            assert!(table.phase_for(round).is_ok());
        }
        assert_eq!(table.phase_for(25).unwrap().payoff.id, "baseline");
        assert_eq!(table.phase_for(26).unwrap().payoff.id, "expansion");
        assert_eq!(table.phase_for(75).unwrap().payoff.id, "volatility");
        assert_eq!(table.phase_for(76).unwrap().payoff.id, "contraction");
    }

    #[test]
    fn test_out_of_range() {
        let table = reference_table();
        assert_eq!(
            table.phase_for(0),
            Err(PhaseError::OutOfRange { round: 0, total_rounds: 100 })
        );
        assert!(table.phase_for(101).is_err());
    }

    #[test]
    fn test_schedule_is_ordered_and_complete() {
        let table = reference_table();
        let rounds: Vec<u32> = table.schedule().map(|(r, _)| r).collect();
        assert_eq!(rounds, (1..=100).collect::<Vec<_>>());
        for (round, phase) in table.schedule() {
            assert!(phase.contains(round));
        }
    }

    #[test]
    fn test_rejects_gap_overlap_and_short_cover() {
        let base = SimulationConfig::reference().phases;

        let mut gap = base.clone();
        gap[1].first_round = 27;
        assert!(matches!(
            PhaseTable::new(gap, 100),
            Err(ConfigError::PhaseGap { expected: 26, found: 27, .. })
        ));

        let mut overlap = base.clone();
        overlap[2].first_round = 50;
        assert!(matches!(
            PhaseTable::new(overlap, 100),
            Err(ConfigError::PhaseOverlap { round: 50, .. })
        ));

        assert!(matches!(
            PhaseTable::new(base.clone(), 120),
            Err(ConfigError::UncoveredRounds { covered: 100, total_rounds: 120 })
        ));

        assert!(matches!(
            PhaseTable::new(base, 80),
            Err(ConfigError::PhaseBeyondRounds { .. })
        ));
    }

    #[test]
    fn test_rejects_too_many_rounds() {
        let mut phases = SimulationConfig::reference().phases;
        phases.truncate(1);
        phases[0].last_round = u32::MAX;

        assert!(matches!(
            PhaseTable::new(phases.clone(), u32::MAX),
            Err(ConfigError::TooManyRounds { total_rounds: u32::MAX, max: MAX_ROUNDS })
        ));

        phases[0].last_round = MAX_ROUNDS;
        let table = PhaseTable::new(phases, MAX_ROUNDS).unwrap();
        assert_eq!(table.phases()[0].len(), MAX_ROUNDS);
        assert!(table.phase_for(MAX_ROUNDS).is_ok());
    }

    #[test]
    fn test_len_saturates() {
        let mut phase = SimulationConfig::reference().phases.remove(0);
        phase.first_round = 0;
        phase.last_round = u32::MAX;
        assert_eq!(phase.len(), u32::MAX);
    }

    #[test]
    fn test_custom_split() {
        let mut phases = SimulationConfig::reference().phases;
        phases.truncate(2);
        phases[0].last_round = 3;
        phases[1].first_round = 4;
        phases[1].last_round = 10;

        let table = PhaseTable::new(phases, 10).unwrap();
        assert_eq!(table.phase_for(3).unwrap().payoff.id, "baseline");
        assert_eq!(table.phase_for(4).unwrap().payoff.id, "expansion");
        assert_eq!(table.phases()[1].len(), 7);
    }
}
