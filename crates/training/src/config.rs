//! Training configuration.

use anyhow::{bail, Context, Result};
use matmul_rl_env::EnvConfig;
use matmul_rl_factors::{load_triples, SeedKind, Triple, MATRIX_DIM};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which edit dynamics the workers' environments run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DynamicsConfig {
    #[default]
    Simulated,
    Verified {
        /// Candidate JSON to start from. Takes precedence over `seed_kind`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed_file: Option<PathBuf>,
        #[serde(default = "default_seed_kind")]
        seed_kind: SeedKind,
    },
}

fn default_seed_kind() -> SeedKind {
    SeedKind::Naive
}

impl DynamicsConfig {
    /// The starting candidate for verified dynamics.
    pub fn load_candidate(&self) -> Result<Option<Vec<Triple>>> {
        match self {
            DynamicsConfig::Simulated => Ok(None),
            DynamicsConfig::Verified {
                seed_file: Some(path),
                ..
            } => {
                let triples = load_triples(path)
                    .with_context(|| format!("failed to load seed candidate {}", path.display()))?;
                Ok(Some(triples))
            }
            DynamicsConfig::Verified {
                seed_file: None,
                seed_kind,
            } => Ok(Some(seed_kind.build(MATRIX_DIM))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub run_id: String,
    pub max_iterations: usize,
    pub num_workers: usize,
    pub rollout_fragment_length: usize,
    pub train_batch_size: usize,
    pub gamma: f64,
    pub learning_rate: f64,
    /// Iterations between checkpoints; 0 only writes the final one.
    pub checkpoint_freq: usize,
    pub results_dir: PathBuf,
    /// Base seed; worker `i` seeds its environment with `seed + i`.
    pub seed: u64,
    pub dynamics: DynamicsConfig,
    pub env: EnvConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            run_id: "exp0".into(),
            max_iterations: 100_000,
            num_workers: 8,
            rollout_fragment_length: 128,
            train_batch_size: 4096,
            gamma: 0.99,
            learning_rate: 0.01,
            checkpoint_freq: 500,
            results_dir: PathBuf::from("results"),
            seed: 0,
            dynamics: DynamicsConfig::Simulated,
            env: EnvConfig::default(),
        }
    }
}

impl TrainConfig {
    /// Load a (possibly partial) config from JSON.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.run_id.is_empty() || self.run_id.contains(|c: char| c == '/' || c == '\\') {
            bail!("run_id must be a non-empty name without path separators");
        }
        if self.num_workers == 0 {
            bail!("num_workers must be at least 1");
        }
        if self.rollout_fragment_length == 0 {
            bail!("rollout_fragment_length must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            bail!("gamma must be in [0, 1], got {}", self.gamma);
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            bail!("learning_rate must be positive, got {}", self.learning_rate);
        }
        Ok(())
    }

    /// Steps each worker collects per iteration.
    pub fn steps_per_worker(&self) -> usize {
        let share = self.train_batch_size.div_ceil(self.num_workers.max(1));
        self.rollout_fragment_length.max(share)
    }

    /// `<results_dir>/<run_id>`.
    pub fn run_dir(&self) -> PathBuf {
        self.results_dir.join(&self.run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = TrainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.steps_per_worker(), 512);
        assert_eq!(config.run_dir(), PathBuf::from("results").join("exp0"));
    }

    #[test]
    fn test_steps_per_worker_floor_is_fragment() {
        let config = TrainConfig {
            train_batch_size: 100,
            num_workers: 4,
            rollout_fragment_length: 64,
            ..TrainConfig::default()
        };
        assert_eq!(config.steps_per_worker(), 64);

        let config = TrainConfig {
            train_batch_size: 1001,
            num_workers: 4,
            rollout_fragment_length: 8,
            ..TrainConfig::default()
        };
        assert_eq!(config.steps_per_worker(), 251);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            TrainConfig {
                num_workers: 0,
                ..TrainConfig::default()
            },
            TrainConfig {
                gamma: 1.5,
                ..TrainConfig::default()
            },
            TrainConfig {
                learning_rate: 0.0,
                ..TrainConfig::default()
            },
            TrainConfig {
                run_id: "../escape".into(),
                ..TrainConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn test_load_partial_config() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("train.json");
        fs::write(
            &path,
            r#"{
                "run_id": "verified-run",
                "num_workers": 2,
                "dynamics": {"kind": "verified", "seed_kind": "identity"},
                "env": {"max_steps": 16}
            }"#,
        )?;

        let config = TrainConfig::load_from_file(&path)?;
        assert_eq!(config.run_id, "verified-run");
        assert_eq!(config.num_workers, 2);
        assert_eq!(config.gamma, 0.99);
        assert_eq!(config.env.max_steps, 16);
        assert_eq!(config.env.rank_floor, 45);
        assert_eq!(
            config.dynamics,
            DynamicsConfig::Verified {
                seed_file: None,
                seed_kind: SeedKind::Identity
            }
        );
        Ok(())
    }

    #[test]
    fn test_load_candidate() -> Result<()> {
        assert!(DynamicsConfig::Simulated.load_candidate()?.is_none());

        let naive = DynamicsConfig::Verified {
            seed_file: None,
            seed_kind: SeedKind::Naive,
        };
        assert_eq!(naive.load_candidate()?.map(|c| c.len()), Some(64));

        let missing = DynamicsConfig::Verified {
            seed_file: Some(PathBuf::from("/nonexistent/seed.json")),
            seed_kind: SeedKind::Naive,
        };
        assert!(missing.load_candidate().is_err());
        Ok(())
    }
}
