//! Training driver for the rank-search environment.
//!
//! Workers each own an independent [`matmul_rl_env::MatmulEnv`] and collect
//! rollouts in parallel under a shared [`policy::SoftmaxPolicy`], which is
//! updated between iterations. A [`curriculum::Curriculum`] tracks the target
//! rank, and [`checkpoint::Checkpoint`]s land under `<results_dir>/<run_id>/`.

pub mod checkpoint;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod curriculum;
pub mod policy;
pub mod trainer;

pub use checkpoint::Checkpoint;
pub use config::{DynamicsConfig, TrainConfig};
pub use curriculum::{Curriculum, Stage};
pub use policy::SoftmaxPolicy;
pub use trainer::{IterationMetrics, Trainer, TrainingSummary};
