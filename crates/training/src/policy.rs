//! Tabular softmax policy trained with REINFORCE.
//!
//! One row of action logits per rank in `[rank_floor, rank_ceiling]`; the
//! observation's current rank picks the row (clamped into range).

use matmul_rl_env::{Action, Observation};
use rand::Rng;
use serde::{Deserialize, Serialize};

const NUM_ACTIONS: usize = Action::ALL.len();

/// One step of experience with its discounted return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub observation: Observation,
    pub action: Action,
    pub ret: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPolicy")]
pub struct SoftmaxPolicy {
    rank_floor: usize,
    logits: Vec<[f64; NUM_ACTIONS]>,
}

#[derive(Deserialize)]
struct RawPolicy {
    rank_floor: usize,
    logits: Vec<[f64; NUM_ACTIONS]>,
}

impl TryFrom<RawPolicy> for SoftmaxPolicy {
    type Error = String;

    fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
        if raw.logits.is_empty() {
            return Err("policy needs at least one row of logits".into());
        }
        if raw.logits.iter().flatten().any(|l| !l.is_finite()) {
            return Err("policy logits must be finite".into());
        }
        Ok(Self {
            rank_floor: raw.rank_floor,
            logits: raw.logits,
        })
    }
}

impl SoftmaxPolicy {
    /// Uniform policy over ranks `rank_floor..=rank_ceiling`.
    pub fn new(rank_floor: usize, rank_ceiling: usize) -> Self {
        let rows = rank_ceiling.saturating_sub(rank_floor) + 1;
        Self {
            rank_floor,
            logits: vec![[0.0; NUM_ACTIONS]; rows],
        }
    }

    fn row(&self, observation: &Observation) -> usize {
        let rank = observation[0].max(0.0) as usize;
        rank.saturating_sub(self.rank_floor)
            .min(self.logits.len() - 1)
    }

    pub fn probabilities(&self, observation: &Observation) -> [f64; NUM_ACTIONS] {
        softmax(&self.logits[self.row(observation)])
    }

    pub fn sample<R: Rng>(&self, observation: &Observation, rng: &mut R) -> Action {
        let probs = self.probabilities(observation);
        let mut draw: f64 = rng.gen();
        for (action, p) in Action::ALL.iter().zip(probs) {
            if draw < p {
                return *action;
            }
            draw -= p;
        }
        Action::ALL[NUM_ACTIONS - 1]
    }

    /// Most likely action; ties go to the lower action index.
    pub fn greedy(&self, observation: &Observation) -> Action {
        let probs = self.probabilities(observation);
        let mut best = 0;
        for i in 1..NUM_ACTIONS {
            if probs[i] > probs[best] {
                best = i;
            }
        }
        Action::ALL[best]
    }

    /// One REINFORCE step with a mean-return baseline.
    ///
    /// Gradients are averaged per row so ranks visited rarely still move.
    /// Returns the baseline used.
    pub fn update(&mut self, samples: &[Sample], learning_rate: f64) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let baseline = samples.iter().map(|s| s.ret).sum::<f64>() / samples.len() as f64;

        let mut grads = vec![[0.0; NUM_ACTIONS]; self.logits.len()];
        let mut counts = vec![0usize; self.logits.len()];
        for sample in samples {
            let row = self.row(&sample.observation);
            let probs = softmax(&self.logits[row]);
            let advantage = sample.ret - baseline;
            for (a, p) in probs.iter().enumerate() {
                let taken = if a == sample.action.index() { 1.0 } else { 0.0 };
                grads[row][a] += advantage * (taken - p);
            }
            counts[row] += 1;
        }

        for ((logits, grad), count) in self.logits.iter_mut().zip(&grads).zip(&counts) {
            if *count == 0 {
                continue;
            }
            for (logit, g) in logits.iter_mut().zip(grad) {
                *logit += learning_rate * g / *count as f64;
            }
        }
        baseline
    }

    pub fn rank_floor(&self) -> usize {
        self.rank_floor
    }

    /// Highest rank with its own row.
    pub fn rank_ceiling(&self) -> usize {
        self.rank_floor + self.logits.len() - 1
    }

    pub fn logits(&self) -> &[[f64; NUM_ACTIONS]] {
        &self.logits
    }
}

fn softmax(logits: &[f64; NUM_ACTIONS]) -> [f64; NUM_ACTIONS] {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut out = logits.map(|l| (l - max).exp());
    let total: f64 = out.iter().sum();
    for p in &mut out {
        *p /= total;
    }
    out
}

/// Discounted returns of one episode segment, aligned with `rewards`.
pub fn discounted_returns(rewards: &[f64], gamma: f64) -> Vec<f64> {
    let mut returns = vec![0.0; rewards.len()];
    let mut acc = 0.0;
    for (i, r) in rewards.iter().enumerate().rev() {
        acc = r + gamma * acc;
        returns[i] = acc;
    }
    returns
}
