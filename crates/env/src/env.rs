//! The rank-search environment.

use crate::action::Action;
use crate::config::EnvConfig;
use crate::dynamics::{EditDynamics, SimulatedDynamics, VerifiedDynamics};
use crate::error::EnvError;
use crate::spaces::{BoxSpace, Discrete};
use matmul_rl_factors::Triple;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt;

/// Bonus added on the step that reaches the rank floor.
pub const TERMINAL_BONUS: f64 = 50.0;
/// Reward for a rejected edit; replaces any other reward for that step.
pub const INVALID_PENALTY: f64 = -1.0;

/// `[current_rank, best_rank]`.
pub type Observation = [f32; 2];

/// Auxiliary step data keyed by name.
pub type Info = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
    /// Whether the dynamics accepted the edit.
    pub action_valid: bool,
}

impl StepResult {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

pub struct MatmulEnv {
    config: EnvConfig,
    dynamics: Box<dyn EditDynamics>,
    rng: StdRng,
    observation_space: BoxSpace,
    action_space: Discrete,
    current_rank: usize,
    best_rank: usize,
    steps: usize,
}

impl MatmulEnv {
    /// Environment with simulated dynamics.
    pub fn new(config: EnvConfig) -> Result<Self, EnvError> {
        Self::with_dynamics(config, Box::new(SimulatedDynamics))
    }

    /// Environment that edits and verifies `seed`.
    pub fn verified(config: EnvConfig, seed: Vec<Triple>) -> Result<Self, EnvError> {
        Self::with_dynamics(config, Box::new(VerifiedDynamics::new(seed)))
    }

    pub fn with_dynamics(
        config: EnvConfig,
        dynamics: Box<dyn EditDynamics>,
    ) -> Result<Self, EnvError> {
        config.validate()?;
        if let Some(rank) = dynamics.initial_rank() {
            if rank != config.starting_rank {
                return Err(EnvError::RankMismatch {
                    config: config.starting_rank,
                    dynamics: rank,
                });
            }
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let low = config.rank_floor as f32;
        let high = config.rank_ceiling as f32;

        Ok(Self {
            observation_space: BoxSpace::new(vec![low, low], vec![high, high]),
            action_space: Discrete::new(Action::ALL.len()),
            current_rank: config.starting_rank,
            best_rank: config.starting_rank,
            steps: 0,
            config,
            dynamics,
            rng,
        })
    }

    /// Start a new episode. `Some(seed)` reseeds the environment RNG.
    pub fn reset(&mut self, seed: Option<u64>) -> (Observation, Info) {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.dynamics.reset();
        self.current_rank = self.config.starting_rank;
        self.best_rank = self.config.starting_rank;
        self.steps = 0;
        (self.observation(), Info::new())
    }

    /// Step with a raw action code.
    pub fn step(&mut self, action: i64) -> Result<StepResult, EnvError> {
        if !self.action_space.contains(action) {
            return Err(EnvError::InvalidAction(action));
        }
        Ok(self.step_action(Action::try_from(action)?))
    }

    pub fn step_action(&mut self, action: Action) -> StepResult {
        self.steps += 1;

        let outcome =
            self.dynamics
                .apply(action, self.current_rank, &self.config, &mut self.rng);
        self.current_rank = outcome.rank;
        self.best_rank = self.best_rank.min(self.current_rank);

        let terminated = self.current_rank == self.config.rank_floor;
        let truncated = self.steps >= self.config.max_steps;

        let reward = if outcome.valid {
            outcome.reward + if terminated { TERMINAL_BONUS } else { 0.0 }
        } else {
            INVALID_PENALTY
        };

        let mut info = Info::new();
        info.insert("rank".into(), self.current_rank as f64);
        info.insert("best_rank".into(), self.best_rank as f64);

        StepResult {
            observation: self.observation(),
            reward,
            terminated,
            truncated,
            info,
            action_valid: outcome.valid,
        }
    }

    pub fn render(&self) {
        println!("{}", self);
    }

    pub fn observation(&self) -> Observation {
        [self.current_rank as f32, self.best_rank as f32]
    }

    pub fn observation_space(&self) -> &BoxSpace {
        &self.observation_space
    }

    pub fn action_space(&self) -> &Discrete {
        &self.action_space
    }

    pub fn current_rank(&self) -> usize {
        self.current_rank
    }

    pub fn best_rank(&self) -> usize {
        self.best_rank
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn dynamics_name(&self) -> &str {
        self.dynamics.name()
    }

    /// Working candidate under verified dynamics.
    pub fn candidate(&self) -> Option<&[Triple]> {
        self.dynamics.candidate()
    }

    /// Mutable access to the RNG, for policies that should share the
    /// environment's seed stream.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl fmt::Display for MatmulEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Step {}: rank={}, best={}",
            self.steps, self.current_rank, self.best_rank
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RANK_FLOOR;
    use matmul_rl_eval::verify_triples;
    use matmul_rl_factors::naive_seed;
    use rand::Rng;

    const RANK_DROP: f64 = crate::dynamics::RANK_DROP_REWARD;

    fn seeded(seed: u64) -> EnvConfig {
        EnvConfig::default().with_seed(seed)
    }

    #[test]
    fn test_construction_rejects_low_starting_rank() {
        let config = EnvConfig {
            starting_rank: 44,
            ..EnvConfig::default()
        };
        assert!(matches!(
            MatmulEnv::new(config),
            Err(EnvError::StartingRankBelowFloor { .. })
        ));
    }

    #[test]
    fn test_reset_restores_starting_state() {
        let mut env = MatmulEnv::new(seeded(1)).unwrap();
        for _ in 0..10 {
            env.step_action(Action::Prune);
        }
        let (obs, info) = env.reset(None);
        assert_eq!(obs, [46.0, 46.0]);
        assert!(info.is_empty());
        assert_eq!(env.current_rank(), 46);
        assert_eq!(env.best_rank(), 46);
        assert_eq!(env.steps(), 0);
    }

    #[test]
    fn test_best_rank_monotone() {
        let config = EnvConfig {
            starting_rank: 50,
            max_steps: 64,
            ..seeded(7)
        };
        let mut env = MatmulEnv::new(config).unwrap();
        let mut policy_rng = StdRng::seed_from_u64(99);

        for _ in 0..20 {
            env.reset(None);
            let mut last_best = env.best_rank();
            loop {
                let step = env.step(policy_rng.gen_range(0..3)).unwrap();
                assert!(env.best_rank() <= env.current_rank());
                assert!(env.best_rank() <= last_best);
                assert_eq!(step.info["rank"], env.current_rank() as f64);
                last_best = env.best_rank();
                if step.done() {
                    break;
                }
            }
        }
    }

    #[test]
    fn test_reaching_floor_terminates_with_bonus() {
        let mut env = MatmulEnv::new(seeded(3)).unwrap();
        env.reset(None);

        let step = env.step(2).unwrap();
        assert!(step.terminated);
        assert!(!step.truncated);
        assert_eq!(step.reward, RANK_DROP + TERMINAL_BONUS);
        assert_eq!(step.observation, [45.0, 45.0]);

        // At the floor, pruning is invalid and the penalty replaces the bonus.
        let step = env.step(2).unwrap();
        assert!(!step.action_valid);
        assert!(step.terminated);
        assert_eq!(step.reward, INVALID_PENALTY);
    }

    #[test]
    fn test_invalid_action_is_error() {
        let mut env = MatmulEnv::new(seeded(4)).unwrap();
        env.reset(None);
        assert_eq!(env.step(3), Err(EnvError::InvalidAction(3)));
        assert_eq!(env.step(-1), Err(EnvError::InvalidAction(-1)));
        assert_eq!(env.steps(), 0);
    }

    #[test]
    fn test_truncation_at_step_budget() {
        let config = EnvConfig {
            max_steps: 3,
            success_probability: 1.0,
            ..seeded(5)
        };
        let mut env = MatmulEnv::new(config).unwrap();
        env.reset(None);

        assert!(!env.step(1).unwrap().truncated);
        assert!(!env.step(1).unwrap().truncated);
        let last = env.step(1).unwrap();
        assert!(last.truncated);
        assert!(!last.terminated);
        assert_eq!(last.reward, 0.2);
    }

    #[test]
    fn test_failed_verification_penalized() {
        let config = EnvConfig {
            success_probability: 0.0,
            ..seeded(6)
        };
        let mut env = MatmulEnv::new(config).unwrap();
        env.reset(None);
        let step = env.step(0).unwrap();
        assert!(!step.action_valid);
        assert_eq!(step.reward, INVALID_PENALTY);
        assert_eq!(env.current_rank(), 46);
    }

    #[test]
    fn test_seeded_runs_reproduce() {
        let run = |seed: u64| -> Vec<f64> {
            let mut env = MatmulEnv::new(seeded(seed)).unwrap();
            env.reset(None);
            (0..40).map(|i| env.step(i % 2).unwrap().reward).collect()
        };
        assert_eq!(run(11), run(11));

        let mut env = MatmulEnv::new(seeded(12)).unwrap();
        env.reset(Some(500));
        let first: Vec<f64> = (0..40).map(|_| env.step(0).unwrap().reward).collect();
        env.reset(Some(500));
        let second: Vec<f64> = (0..40).map(|_| env.step(0).unwrap().reward).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_spaces() {
        let env = MatmulEnv::new(EnvConfig::default()).unwrap();
        assert_eq!(env.action_space().n, 3);
        assert!(env.observation_space().contains(&env.observation()));
        assert_eq!(env.to_string(), "Step 0: rank=46, best=46");
        assert_eq!(env.dynamics_name(), "simulated");
    }

    #[test]
    fn test_verified_rank_mismatch() {
        let result = MatmulEnv::verified(EnvConfig::default(), naive_seed(4));
        assert_eq!(
            result.err(),
            Some(EnvError::RankMismatch {
                config: 46,
                dynamics: 64
            })
        );
    }

    #[test]
    fn test_construction_rejects_lowered_floor() {
        let config = EnvConfig {
            starting_rank: 10,
            rank_floor: 1,
            ..EnvConfig::default()
        };
        assert!(matches!(
            MatmulEnv::new(config),
            Err(EnvError::InvalidConfig(_))
        ));

        let seed = vec![Triple::identity(4)];
        let config = EnvConfig {
            rank_floor: 1,
            ..EnvConfig::for_candidate(1)
        };
        assert!(MatmulEnv::verified(config, seed).is_err());
        let result = MatmulEnv::verified(EnvConfig::for_candidate(1), vec![Triple::identity(4)]);
        assert_eq!(
            result.err(),
            Some(EnvError::StartingRankBelowFloor {
                starting_rank: 1,
                floor: RANK_FLOOR
            })
        );
    }

    #[test]
    fn test_verified_prune_down_to_floor() {
        // (I, I, I) plus 48 zero triples: only the zero triples can be pruned.
        let mut seed = vec![Triple::identity(4)];
        seed.extend((0..48).map(|_| Triple::zeros(4)));
        let config = EnvConfig {
            max_steps: 1000,
            ..EnvConfig::for_candidate(seed.len())
        }
        .with_seed(8);

        let mut env = MatmulEnv::verified(config, seed).unwrap();
        env.reset(None);
        let mut last = None;
        for _ in 0..1000 {
            let step = env.step(2).unwrap();
            assert_eq!(env.current_rank(), env.candidate().unwrap().len());
            if step.action_valid {
                assert!(verify_triples(env.candidate().unwrap()));
            }
            if step.done() {
                last = Some(step);
                break;
            }
        }

        let last = last.expect("episode should end");
        assert!(last.terminated);
        assert_eq!(last.reward, RANK_DROP + TERMINAL_BONUS);
        assert_eq!(env.current_rank(), RANK_FLOOR);
        let candidate = env.candidate().unwrap();
        assert_eq!(candidate.len(), RANK_FLOOR);
        assert!(candidate.contains(&Triple::identity(4)));
        assert!(verify_triples(candidate));

        env.reset(None);
        assert_eq!(env.candidate().unwrap().len(), 49);
        assert_eq!(env.current_rank(), 49);
    }
}
