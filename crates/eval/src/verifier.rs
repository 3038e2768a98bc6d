//! Exact verification of candidate algorithms.
//!
//! Entry `(p, q)` of `U · A · V · B · W` is
//! `Σ U[p,a] · A[a,b] · V[b,c] · B[c,d] · W[d,q]`, so the identity
//! `Σᵢ Uᵢ·A·Vᵢ·B·Wᵢ = A·B` holds for symbolic A and B iff every coefficient
//!
//! ```text
//!     Σᵢ Uᵢ[p,a] · Vᵢ[b,c] · Wᵢ[d,q]  ==  δ(p,a) · δ(b,c) · δ(d,q)
//! ```
//!
//! All n⁶ coefficients are accumulated as exact rationals. Every finite `f64`
//! is converted to the rational it denotes, so there is no tolerance: noisy
//! floating-point factors do not pass.

use crate::report::{CoefficientMismatch, VerificationReport, VerificationResult};
use matmul_rl_factors::{Triple, MATRIX_DIM};
use ndarray::Array2;
use num_rational::BigRational;
use num_traits::{One, Zero};
use std::time::Instant;

/// Nonzero entries of one factor matrix: `(row, col, exact, float)`.
type SparseFactor = Vec<(usize, usize, BigRational, f64)>;

/// Exact checker for n×n candidates.
#[derive(Debug, Clone, Copy)]
pub struct Verifier {
    dim: usize,
}

impl Verifier {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// `true` iff the candidate reconstructs `A · B` exactly.
    pub fn check(&self, triples: &[Triple]) -> bool {
        self.verify(triples).passed()
    }

    /// Verify a candidate and report the outcome.
    ///
    /// Never fails: malformed input becomes a `Failed` result.
    pub fn verify(&self, triples: &[Triple]) -> VerificationReport {
        let start = Instant::now();
        let rank = triples.len();

        if triples.is_empty() {
            return self.reject(rank, "empty candidate: the zero matrix never equals A·B");
        }

        let mut factors = Vec::with_capacity(rank);
        for (i, triple) in triples.iter().enumerate() {
            if triple.square_dim() != Some(self.dim) {
                return self.reject(
                    rank,
                    format!(
                        "triple {} has shapes {:?}/{:?}/{:?}, expected {}x{}",
                        i,
                        triple.u.dim(),
                        triple.v.dim(),
                        triple.w.dim(),
                        self.dim,
                        self.dim
                    ),
                );
            }
            match exact_triple(triple) {
                Ok(f) => factors.push(f),
                Err(detail) => return self.reject(rank, format!("triple {}: {}", i, detail)),
            }
        }

        let n = self.dim;
        let len = n.pow(6);
        let mut exact = vec![BigRational::zero(); len];
        let mut approx = vec![0.0f64; len];

        for (u, v, w) in &factors {
            for (p, a, u_exact, u_float) in u {
                for (b, c, v_exact, v_float) in v {
                    let uv = u_exact * v_exact;
                    let uv_float = u_float * v_float;
                    for (d, q, w_exact, w_float) in w {
                        let idx = flat_index(n, [*p, *a, *b, *c, *d, *q]);
                        exact[idx] += &uv * w_exact;
                        approx[idx] += uv_float * w_float;
                    }
                }
            }
        }

        let one = BigRational::one();
        let zero = BigRational::zero();
        let mut max_abs_residual = 0.0f64;
        let mut mismatch = None;

        for (idx, (coeff, coeff_float)) in exact.iter().zip(&approx).enumerate() {
            let index = split_index(n, idx);
            let [p, a, b, c, d, q] = index;
            let on_target = p == a && b == c && d == q;
            let expected = if on_target { &one } else { &zero };

            let residual = coeff_float - if on_target { 1.0 } else { 0.0 };
            max_abs_residual = max_abs_residual.max(residual.abs());

            if mismatch.is_none() && coeff != expected {
                mismatch = Some(CoefficientMismatch {
                    index,
                    expected: expected.to_string(),
                    actual: coeff.to_string(),
                });
            }
        }

        let result = match &mismatch {
            None => VerificationResult::Passed,
            Some(m) => VerificationResult::Failed {
                reason: format!(
                    "coefficient of A[{},{}]·B[{},{}] in entry ({}, {}) is {}, expected {}",
                    m.index[1], m.index[2], m.index[3], m.index[4], m.index[0], m.index[5],
                    m.actual, m.expected
                ),
            },
        };

        let report = VerificationReport {
            rank,
            dim: n,
            result,
            mismatch,
            max_abs_residual: Some(max_abs_residual),
            verification_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        };

        match report.failure_reason() {
            Some(reason) => tracing::debug!(rank, reason, "candidate rejected"),
            None => tracing::debug!(rank, "candidate verified"),
        }
        report
    }

    fn reject(&self, rank: usize, reason: impl Into<String>) -> VerificationReport {
        let report = VerificationReport::rejected(rank, self.dim, reason);
        tracing::debug!(rank, reason = report.failure_reason(), "candidate rejected");
        report
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(MATRIX_DIM)
    }
}

/// Exact check for 4×4 candidates. Empty or malformed candidates are `false`.
pub fn verify_triples(triples: &[Triple]) -> bool {
    Verifier::default().check(triples)
}

fn exact_triple(triple: &Triple) -> Result<(SparseFactor, SparseFactor, SparseFactor), String> {
    Ok((
        exact_entries(&triple.u)?,
        exact_entries(&triple.v)?,
        exact_entries(&triple.w)?,
    ))
}

fn exact_entries(matrix: &Array2<f64>) -> Result<SparseFactor, String> {
    let mut entries = Vec::new();
    for ((row, col), &value) in matrix.indexed_iter() {
        if value == 0.0 {
            continue;
        }
        let exact = BigRational::from_float(value)
            .ok_or_else(|| format!("non-finite entry {} at ({}, {})", value, row, col))?;
        entries.push((row, col, exact, value));
    }
    Ok(entries)
}

fn flat_index(n: usize, index: [usize; 6]) -> usize {
    index.iter().fold(0, |acc, &i| acc * n + i)
}

fn split_index(n: usize, mut flat: usize) -> [usize; 6] {
    let mut index = [0; 6];
    for slot in index.iter_mut().rev() {
        *slot = flat % n;
        flat /= n;
    }
    index
}
