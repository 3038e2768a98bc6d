//! Environment configuration.

use crate::error::EnvError;
use matmul_rl_factors::DEFAULT_SIGMA;
use serde::{Deserialize, Serialize};

/// Rank at which an episode terminates.
pub const RANK_FLOOR: usize = 45;
/// Upper observation bound for simulated episodes.
pub const RANK_CEILING: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Rank restored by every `reset`.
    pub starting_rank: usize,
    /// Step budget per episode (truncation).
    pub max_steps: usize,
    /// Terminal rank; rank-reducing edits are invalid at this rank. Never
    /// below [`RANK_FLOOR`].
    pub rank_floor: usize,
    /// Upper bound of the observation space.
    pub rank_ceiling: usize,

    // Simulated dynamics
    /// Probability that a simulated edit "verifies".
    pub success_probability: f64,
    /// Probability that a verified simulated mutation drops the rank.
    pub mutate_drop_probability: f64,

    // Verified dynamics
    /// Noise scale for factor mutation.
    pub sigma: f64,

    /// RNG seed; `None` seeds from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            starting_rank: 46,
            max_steps: 128,
            rank_floor: RANK_FLOOR,
            rank_ceiling: RANK_CEILING,
            success_probability: 0.9,
            mutate_drop_probability: 0.3,
            sigma: DEFAULT_SIGMA,
            seed: None,
        }
    }
}

impl EnvConfig {
    /// Config for verified dynamics starting from a candidate of `rank`
    /// triples. The observation ceiling grows to fit the candidate.
    pub fn for_candidate(rank: usize) -> Self {
        let defaults = Self::default();
        Self {
            starting_rank: rank,
            rank_ceiling: defaults.rank_ceiling.max(rank),
            ..defaults
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), EnvError> {
        if self.rank_floor < RANK_FLOOR {
            return Err(EnvError::InvalidConfig(format!(
                "rank_floor must be >= {}, got {}",
                RANK_FLOOR, self.rank_floor
            )));
        }
        if self.starting_rank < self.rank_floor {
            return Err(EnvError::StartingRankBelowFloor {
                starting_rank: self.starting_rank,
                floor: self.rank_floor,
            });
        }
        if self.rank_ceiling < self.rank_floor {
            return Err(EnvError::InvalidConfig(format!(
                "rank_ceiling {} is below rank_floor {}",
                self.rank_ceiling, self.rank_floor
            )));
        }
        for (name, p) in [
            ("success_probability", self.success_probability),
            ("mutate_drop_probability", self.mutate_drop_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(EnvError::InvalidConfig(format!(
                    "{} must be in [0, 1], got {}",
                    name, p
                )));
            }
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(EnvError::InvalidConfig(format!(
                "sigma must be finite and >= 0, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}
