//! Reinforcement-learning search for low-rank 4×4 matrix multiplication
//! algorithms, with exact verification of every candidate.
//!
//! - [`factors`]: factor triples, JSON I/O, mutation and seeds
//! - [`eval`]: exact verifier, reports, LaTeX rendering
//! - [`env`]: the rank-search environment
//! - [`training`]: curriculum, policy and parallel training driver

pub use matmul_rl_env as env;
pub use matmul_rl_eval as eval;
pub use matmul_rl_factors as factors;
pub use matmul_rl_training as training;
