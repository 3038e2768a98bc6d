//! Errors for factor I/O and genetic operators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FactorError {
    #[error("mutation sigma must be finite and >= 0, got {0}")]
    InvalidSigma(f64),

    #[error("no crossover point: shorter parent has {shorter} triple(s), need at least 2")]
    NoCrossoverPoint { shorter: usize },

    #[error("malformed factor matrix: {0}")]
    Shape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
