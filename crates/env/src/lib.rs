//! Rank-search environment for 4×4 matrix multiplication.
//!
//! [`MatmulEnv`] exposes a gym-style `reset` / `step` / `render` surface over
//! three observable fields: `current_rank`, `best_rank` and `steps`. What an
//! action does is decided by its [`EditDynamics`]:
//!
//! - [`SimulatedDynamics`]: random accept/reject draws, no factor triples
//! - [`VerifiedDynamics`]: real edits on a candidate, gated by exact verification
//!
//! ```text
//! action ──▶ MatmulEnv::step ──▶ EditDynamics::apply ──▶ EditOutcome
//!                 │                                         │
//!                 └── rank / best / reward / flags ◀────────┘
//! ```

pub mod action;
pub mod config;
pub mod dynamics;
pub mod env;
pub mod error;
pub mod spaces;

pub use action::Action;
pub use config::{EnvConfig, RANK_CEILING, RANK_FLOOR};
pub use dynamics::{EditDynamics, EditOutcome, SimulatedDynamics, VerifiedDynamics};
pub use env::{Info, MatmulEnv, Observation, StepResult, INVALID_PENALTY, TERMINAL_BONUS};
pub use error::EnvError;
pub use spaces::{BoxSpace, Discrete};
