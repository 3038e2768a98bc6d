//! Candidate edits: Gaussian factor mutation and one-point crossover.
//!
//! Both operators return fresh candidates and never touch their inputs. They
//! draw from the caller's RNG so an environment or search loop can thread one
//! seed through every random choice.

use crate::error::FactorError;
use crate::triple::{Factor, Triple};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Default standard deviation for [`mutate_factor`].
pub const DEFAULT_SIGMA: f64 = 0.05;

/// Add `N(0, sigma²)` noise to every entry of one random factor matrix of one
/// random triple.
///
/// Empty input yields an empty candidate.
pub fn mutate_factor<R: Rng>(
    triples: &[Triple],
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<Triple>, FactorError> {
    if triples.is_empty() {
        return Ok(Vec::new());
    }
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(FactorError::InvalidSigma(sigma));
    }
    let noise = Normal::new(0.0, sigma).map_err(|_| FactorError::InvalidSigma(sigma))?;

    let mut mutated = triples.to_vec();
    let idx = rng.gen_range(0..mutated.len());
    let factor = Factor::ALL[rng.gen_range(0..Factor::ALL.len())];

    mutated[idx]
        .factor_mut(factor)
        .mapv_inplace(|x| x + noise.sample(&mut *rng));
    Ok(mutated)
}

/// One-point crossover: prefix of `first` followed by the suffix of `second`.
///
/// The cut is drawn from `1..min(len)`, so the offspring always has
/// `second.len()` triples. An empty parent yields a copy of the other one.
pub fn crossover<R: Rng>(
    first: &[Triple],
    second: &[Triple],
    rng: &mut R,
) -> Result<Vec<Triple>, FactorError> {
    if first.is_empty() {
        return Ok(second.to_vec());
    }
    if second.is_empty() {
        return Ok(first.to_vec());
    }

    let shorter = first.len().min(second.len());
    if shorter < 2 {
        return Err(FactorError::NoCrossoverPoint { shorter });
    }

    let cut = rng.gen_range(1..shorter);
    Ok(first[..cut]
        .iter()
        .chain(&second[cut..])
        .cloned()
        .collect())
}
