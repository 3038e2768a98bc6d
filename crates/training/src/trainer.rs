//! Parallel rollout collection and policy updates.

use crate::checkpoint::Checkpoint;
use crate::config::TrainConfig;
use crate::curriculum::Curriculum;
use crate::policy::{discounted_returns, Sample, SoftmaxPolicy};
use anyhow::{bail, Context, Result};
use matmul_rl_env::{Action, EnvConfig, MatmulEnv, Observation};
use matmul_rl_eval::verify_triples;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationMetrics {
    pub iteration: usize,
    pub steps: u64,
    /// Episodes that ended (terminated or truncated) during the iteration.
    pub episodes: u64,
    /// Mean reward of the episodes that ended; `None` if none did.
    pub mean_episode_reward: Option<f64>,
    /// Lowest rank any worker reached.
    pub best_rank: usize,
    pub terminated_episodes: u64,
    pub invalid_fraction: f64,
    pub target_rank: usize,
    pub curriculum_stage: usize,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub run_id: String,
    pub iterations: usize,
    pub total_steps: u64,
    pub best_rank: usize,
    pub final_target_rank: usize,
    pub curriculum_stage: usize,
    pub checkpoints: Vec<PathBuf>,
}

struct Worker {
    env: MatmulEnv,
    episode_reward: f64,
}

#[derive(Default)]
struct Rollout {
    samples: Vec<Sample>,
    steps: u64,
    episodes: u64,
    terminated: u64,
    invalid: u64,
    episode_reward_sum: f64,
    best_rank: usize,
}

pub struct Trainer {
    config: TrainConfig,
    workers: Vec<Worker>,
    policy: SoftmaxPolicy,
    curriculum: Curriculum,
    iteration: usize,
    total_steps: u64,
    best_rank: usize,
    last_metrics: Option<IterationMetrics>,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Result<Self> {
        config.validate()?;
        let candidate = config.dynamics.load_candidate()?;
        if let Some(seed) = &candidate {
            if !verify_triples(seed) {
                warn!(
                    rank = seed.len(),
                    "seed candidate does not verify; every edit will be rejected"
                );
            }
        }

        let workers = (0..config.num_workers)
            .map(|index| -> Result<Worker> {
                let env_config = EnvConfig {
                    seed: Some(config.seed.wrapping_add(index as u64)),
                    ..config.env.clone()
                };
                let env = match &candidate {
                    None => MatmulEnv::new(env_config),
                    Some(seed) => {
                        let env_config = EnvConfig {
                            starting_rank: seed.len(),
                            rank_ceiling: env_config.rank_ceiling.max(seed.len()),
                            ..env_config
                        };
                        MatmulEnv::verified(env_config, seed.clone())
                    }
                }
                .with_context(|| format!("failed to build environment for worker {}", index))?;
                Ok(Worker {
                    env,
                    episode_reward: 0.0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let env_config = workers[0].env.config();
        let policy = SoftmaxPolicy::new(env_config.rank_floor, env_config.rank_ceiling);
        let best_rank = env_config.starting_rank;

        info!(
            run_id = %config.run_id,
            workers = workers.len(),
            dynamics = workers[0].env.dynamics_name(),
            starting_rank = best_rank,
            steps_per_worker = config.steps_per_worker(),
            "trainer initialized"
        );

        Ok(Self {
            config,
            workers,
            policy,
            curriculum: Curriculum::new(),
            iteration: 0,
            total_steps: 0,
            best_rank,
            last_metrics: None,
        })
    }

    /// Continue from a saved checkpoint with a fresh set of environments.
    pub fn resume(config: TrainConfig, checkpoint: Checkpoint) -> Result<Self> {
        let mut trainer = Self::new(config)?;
        let (floor, ceiling) = (trainer.policy.rank_floor(), trainer.policy.rank_ceiling());
        if checkpoint.policy.rank_floor() != floor || checkpoint.policy.rank_ceiling() != ceiling {
            bail!(
                "checkpoint policy covers ranks {}..={}, environment expects {}..={}",
                checkpoint.policy.rank_floor(),
                checkpoint.policy.rank_ceiling(),
                floor,
                ceiling
            );
        }
        trainer.policy = checkpoint.policy;
        trainer.curriculum = checkpoint.curriculum;
        trainer.iteration = checkpoint.iteration;
        trainer.total_steps = checkpoint.total_steps;
        if let Some(metrics) = &checkpoint.metrics {
            trainer.best_rank = trainer.best_rank.min(metrics.best_rank);
        }
        trainer.last_metrics = checkpoint.metrics;
        info!(iteration = trainer.iteration, "resumed from checkpoint");
        Ok(trainer)
    }

    /// Collect one batch across all workers and update the policy.
    pub fn train_iteration(&mut self) -> Result<IterationMetrics> {
        let start = Instant::now();
        let steps = self.config.steps_per_worker();
        let gamma = self.config.gamma;
        let policy = &self.policy;

        let rollouts: Vec<Rollout> = self
            .workers
            .par_iter_mut()
            .map(|worker| collect(worker, policy, steps, gamma))
            .collect();

        let mut batch = Rollout {
            best_rank: usize::MAX,
            ..Rollout::default()
        };
        for rollout in rollouts {
            batch.samples.extend(rollout.samples);
            batch.steps += rollout.steps;
            batch.episodes += rollout.episodes;
            batch.terminated += rollout.terminated;
            batch.invalid += rollout.invalid;
            batch.episode_reward_sum += rollout.episode_reward_sum;
            batch.best_rank = batch.best_rank.min(rollout.best_rank);
        }

        let baseline = self.policy.update(&batch.samples, self.config.learning_rate);
        self.iteration += 1;
        self.total_steps += batch.steps;
        self.best_rank = self.best_rank.min(batch.best_rank);

        let target = self.curriculum.get_target_rank(self.total_steps);
        if batch.best_rank <= target && self.curriculum.advance() {
            info!(
                iteration = self.iteration,
                reached = batch.best_rank,
                target,
                next_target = self.curriculum.stage().target_rank,
                "curriculum advanced"
            );
        }

        let metrics = IterationMetrics {
            iteration: self.iteration,
            steps: batch.steps,
            episodes: batch.episodes,
            mean_episode_reward: (batch.episodes > 0)
                .then(|| batch.episode_reward_sum / batch.episodes as f64),
            best_rank: batch.best_rank,
            terminated_episodes: batch.terminated,
            invalid_fraction: batch.invalid as f64 / batch.steps.max(1) as f64,
            target_rank: self.curriculum.stage().target_rank,
            curriculum_stage: self.curriculum.current_stage(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        debug!(
            iteration = metrics.iteration,
            episodes = metrics.episodes,
            best_rank = metrics.best_rank,
            baseline,
            invalid_fraction = metrics.invalid_fraction,
            "iteration complete"
        );
        self.last_metrics = Some(metrics.clone());
        Ok(metrics)
    }

    /// Train until `max_iterations`, checkpointing along the way.
    pub fn run(&mut self) -> Result<TrainingSummary> {
        let mut checkpoints = Vec::new();
        let freq = self.config.checkpoint_freq;
        let mut saved_at = None;

        while self.iteration < self.config.max_iterations {
            let metrics = self.train_iteration()?;
            if freq > 0 && metrics.iteration % freq == 0 {
                info!(
                    iteration = metrics.iteration,
                    best_rank = metrics.best_rank,
                    mean_episode_reward = metrics.mean_episode_reward,
                    target_rank = metrics.target_rank,
                    "training progress"
                );
                checkpoints.push(self.save_checkpoint()?);
                saved_at = Some(self.iteration);
            }
        }
        if saved_at != Some(self.iteration) {
            checkpoints.push(self.save_checkpoint()?);
        }

        let summary = TrainingSummary {
            run_id: self.config.run_id.clone(),
            iterations: self.iteration,
            total_steps: self.total_steps,
            best_rank: self.best_rank,
            final_target_rank: self.curriculum.stage().target_rank,
            curriculum_stage: self.curriculum.current_stage(),
            checkpoints,
        };
        let path = self.run_dir().join("summary.json");
        fs::write(&path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(
            iterations = summary.iterations,
            total_steps = summary.total_steps,
            best_rank = summary.best_rank,
            path = %path.display(),
            "training finished"
        );
        Ok(summary)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            run_id: self.config.run_id.clone(),
            iteration: self.iteration,
            total_steps: self.total_steps,
            policy: self.policy.clone(),
            curriculum: self.curriculum.clone(),
            metrics: self.last_metrics.clone(),
            config: self.config.clone(),
        }
    }

    pub fn save_checkpoint(&self) -> Result<PathBuf> {
        let path = self.checkpoint().save(self.run_dir())?;
        info!(iteration = self.iteration, path = %path.display(), "checkpoint saved");
        Ok(path)
    }

    pub fn run_dir(&self) -> PathBuf {
        self.config.run_dir()
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn policy(&self) -> &SoftmaxPolicy {
        &self.policy
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Lowest rank reached over the whole run.
    pub fn best_rank(&self) -> usize {
        self.best_rank
    }
}

/// Run `steps` environment steps on one worker.
///
/// Episodes that end are reset in place; an episode still running at the end
/// is cut there and its returns are not bootstrapped.
fn collect(worker: &mut Worker, policy: &SoftmaxPolicy, steps: usize, gamma: f64) -> Rollout {
    let mut rollout = Rollout {
        samples: Vec::with_capacity(steps),
        best_rank: worker.env.best_rank(),
        ..Rollout::default()
    };
    let mut segment: Vec<(Observation, Action, f64)> = Vec::new();

    for _ in 0..steps {
        let observation = worker.env.observation();
        let action = policy.sample(&observation, worker.env.rng_mut());
        let step = worker.env.step_action(action);

        rollout.steps += 1;
        if !step.action_valid {
            rollout.invalid += 1;
        }
        rollout.best_rank = rollout.best_rank.min(worker.env.best_rank());
        worker.episode_reward += step.reward;
        segment.push((observation, action, step.reward));

        if step.done() {
            rollout.episodes += 1;
            if step.terminated {
                rollout.terminated += 1;
            }
            rollout.episode_reward_sum += worker.episode_reward;
            worker.episode_reward = 0.0;
            flush(&mut segment, &mut rollout.samples, gamma);
            worker.env.reset(None);
        }
    }
    flush(&mut segment, &mut rollout.samples, gamma);
    rollout
}

fn flush(segment: &mut Vec<(Observation, Action, f64)>, samples: &mut Vec<Sample>, gamma: f64) {
    let rewards: Vec<f64> = segment.iter().map(|(_, _, r)| *r).collect();
    let returns = discounted_returns(&rewards, gamma);
    samples.extend(
        segment
            .drain(..)
            .zip(returns)
            .map(|((observation, action, _), ret)| Sample {
                observation,
                action,
                ret,
            }),
    );
}
