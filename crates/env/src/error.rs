//! Environment errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("Invalid action {0}: expected 0 (mutate), 1 (swap) or 2 (prune)")]
    InvalidAction(i64),

    #[error("starting_rank must be >= {floor}, got {starting_rank}")]
    StartingRankBelowFloor { starting_rank: usize, floor: usize },

    #[error("dynamics start at rank {dynamics}, but config starting_rank is {config}")]
    RankMismatch { config: usize, dynamics: usize },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}
