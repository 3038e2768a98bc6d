//! Edit dynamics: what an action does to the search state.

use crate::action::Action;
use crate::config::EnvConfig;
use matmul_rl_eval::Verifier;
use matmul_rl_factors::{mutate_factor, Triple};
use rand::rngs::StdRng;
use rand::Rng;

/// Reward for a verified edit that keeps the rank.
pub const SWAP_REWARD: f64 = 0.2;
/// Reward per rank dropped.
pub const RANK_DROP_REWARD: f64 = 1.0;

/// Result of applying one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditOutcome {
    /// Rank after the edit.
    pub rank: usize,
    /// Base reward before the terminal bonus.
    pub reward: f64,
    /// `false` when the edit was rejected.
    pub valid: bool,
}

impl EditOutcome {
    pub fn accepted(rank: usize, reward: f64) -> Self {
        Self {
            rank,
            reward,
            valid: true,
        }
    }

    pub fn invalid(rank: usize) -> Self {
        Self {
            rank,
            reward: 0.0,
            valid: false,
        }
    }
}

/// Trait for the state transition behind `MatmulEnv::step`.
pub trait EditDynamics: Send {
    /// Name of these dynamics.
    fn name(&self) -> &str;

    /// Rank dictated by the dynamics' own state, if any.
    fn initial_rank(&self) -> Option<usize> {
        None
    }

    /// Restore the episode-start state.
    fn reset(&mut self) {}

    /// Apply `action` at `current_rank`.
    fn apply(
        &mut self,
        action: Action,
        current_rank: usize,
        config: &EnvConfig,
        rng: &mut StdRng,
    ) -> EditOutcome;

    /// The working candidate, for dynamics that hold one.
    fn candidate(&self) -> Option<&[Triple]> {
        None
    }
}

/// Random accept/reject process over a bare rank counter.
///
/// Each step draws a "verification success" with
/// `config.success_probability`, independent of the action.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedDynamics;

impl EditDynamics for SimulatedDynamics {
    fn name(&self) -> &str {
        "simulated"
    }

    fn apply(
        &mut self,
        action: Action,
        current_rank: usize,
        config: &EnvConfig,
        rng: &mut StdRng,
    ) -> EditOutcome {
        let verified = rng.gen_bool(config.success_probability);
        let above_floor = current_rank > config.rank_floor;

        match action {
            Action::Mutate => {
                if !(verified && above_floor) {
                    return EditOutcome::invalid(current_rank);
                }
                if rng.gen_bool(config.mutate_drop_probability) {
                    EditOutcome::accepted(current_rank - 1, RANK_DROP_REWARD)
                } else {
                    EditOutcome::accepted(current_rank, 0.0)
                }
            }
            Action::Swap if verified => EditOutcome::accepted(current_rank, SWAP_REWARD),
            Action::Swap => EditOutcome::invalid(current_rank),
            Action::Prune if above_floor => {
                EditOutcome::accepted(current_rank - 1, RANK_DROP_REWARD)
            }
            Action::Prune => EditOutcome::invalid(current_rank),
        }
    }
}

/// Edits a real candidate and keeps a proposal only if it verifies exactly.
///
/// The rank is always the working candidate's length.
pub struct VerifiedDynamics {
    seed: Vec<Triple>,
    candidate: Vec<Triple>,
    verifier: Verifier,
}

impl VerifiedDynamics {
    pub fn new(seed: Vec<Triple>) -> Self {
        Self::with_verifier(seed, Verifier::default())
    }

    pub fn with_verifier(seed: Vec<Triple>, verifier: Verifier) -> Self {
        Self {
            candidate: seed.clone(),
            seed,
            verifier,
        }
    }

    fn propose(&mut self, action: Action, proposal: Vec<Triple>, reward: f64) -> EditOutcome {
        let report = self.verifier.verify(&proposal);
        if report.passed() {
            tracing::debug!(
                action = action.name(),
                rank = proposal.len(),
                "edit verified"
            );
            self.candidate = proposal;
            EditOutcome::accepted(self.candidate.len(), reward)
        } else {
            tracing::debug!(
                action = action.name(),
                reason = report.failure_reason(),
                "edit rejected"
            );
            EditOutcome::invalid(self.candidate.len())
        }
    }
}

impl EditDynamics for VerifiedDynamics {
    fn name(&self) -> &str {
        "verified"
    }

    fn initial_rank(&self) -> Option<usize> {
        Some(self.seed.len())
    }

    fn reset(&mut self) {
        self.candidate = self.seed.clone();
    }

    fn apply(
        &mut self,
        action: Action,
        _current_rank: usize,
        config: &EnvConfig,
        rng: &mut StdRng,
    ) -> EditOutcome {
        let rank = self.candidate.len();
        match action {
            Action::Mutate => match mutate_factor(&self.candidate, config.sigma, rng) {
                Ok(proposal) => self.propose(action, proposal, 0.0),
                Err(e) => {
                    tracing::warn!(error = %e, "mutation failed");
                    EditOutcome::invalid(rank)
                }
            },
            Action::Swap => {
                if rank < 2 {
                    return EditOutcome::invalid(rank);
                }
                let i = rng.gen_range(0..rank);
                let mut j = rng.gen_range(0..rank - 1);
                if j >= i {
                    j += 1;
                }
                let mut proposal = self.candidate.clone();
                proposal.swap(i, j);
                self.propose(action, proposal, SWAP_REWARD)
            }
            Action::Prune => {
                if rank <= config.rank_floor {
                    return EditOutcome::invalid(rank);
                }
                let mut proposal = self.candidate.clone();
                proposal.remove(rng.gen_range(0..rank));
                self.propose(action, proposal, RANK_DROP_REWARD)
            }
        }
    }

    fn candidate(&self) -> Option<&[Triple]> {
        Some(&self.candidate)
    }
}
