//! Verification reports.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of an exact verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum VerificationResult {
    Passed,
    Failed { reason: String },
}

/// First coefficient where the candidate disagrees with `A · B`.
///
/// `index` is `(p, a, b, c, d, q)`: the coefficient of `A[a,b] · B[c,d]` in
/// output entry `(p, q)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientMismatch {
    pub index: [usize; 6],
    pub expected: String,
    pub actual: String,
}

/// Complete report for one verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Number of triples in the candidate.
    pub rank: usize,

    /// Matrix dimension the candidate was checked against.
    pub dim: usize,

    pub result: VerificationResult,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatch: Option<CoefficientMismatch>,

    /// Largest floating-point coefficient residual. Diagnostic only; the
    /// decision is made on exact coefficients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_abs_residual: Option<f64>,

    pub verification_time_ms: f64,
}

impl VerificationReport {
    /// Create a rejection report for a candidate that never reached the
    /// coefficient comparison.
    pub fn rejected(rank: usize, dim: usize, reason: impl Into<String>) -> Self {
        Self {
            rank,
            dim,
            result: VerificationResult::Failed {
                reason: reason.into(),
            },
            mismatch: None,
            max_abs_residual: None,
            verification_time_ms: 0.0,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self.result, VerificationResult::Passed)
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.result {
            VerificationResult::Passed => None,
            VerificationResult::Failed { reason } => Some(reason),
        }
    }

    /// Save report to JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
