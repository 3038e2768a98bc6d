//! Observation and action spaces.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// `{0, 1, …, n - 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrete {
    pub n: usize,
}

impl Discrete {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= 0 && (value as u64) < self.n as u64
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> i64 {
        rng.gen_range(0..self.n) as i64
    }
}

/// Axis-aligned box with per-component bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl BoxSpace {
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Self {
        debug_assert_eq!(low.len(), high.len());
        Self { low, high }
    }

    pub fn shape(&self) -> usize {
        self.low.len()
    }

    pub fn contains(&self, value: &[f32]) -> bool {
        value.len() == self.shape()
            && value
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }
}
