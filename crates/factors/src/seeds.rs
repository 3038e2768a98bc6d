//! Known-correct starting candidates.

use crate::triple::Triple;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedKind {
    /// One term per scalar product: rank n³.
    Naive,
    /// The single triple `(I, I, I)`.
    Identity,
}

impl SeedKind {
    pub fn build(self, dim: usize) -> Vec<Triple> {
        match self {
            SeedKind::Naive => naive_seed(dim),
            SeedKind::Identity => identity_seed(dim),
        }
    }
}

/// The schoolbook algorithm.
///
/// `E_pp · A · E_jj · B · E_qq` isolates `A[p,j] · B[j,q]` at position `(p, q)`,
/// so summing over all `(p, j, q)` reconstructs `A · B` with n³ triples.
pub fn naive_seed(dim: usize) -> Vec<Triple> {
    let mut triples = Vec::with_capacity(dim * dim * dim);
    for p in 0..dim {
        for j in 0..dim {
            for q in 0..dim {
                triples.push(Triple::new(
                    unit(dim, p, p),
                    unit(dim, j, j),
                    unit(dim, q, q),
                ));
            }
        }
    }
    triples
}

pub fn identity_seed(dim: usize) -> Vec<Triple> {
    vec![Triple::identity(dim)]
}

fn unit(dim: usize, row: usize, col: usize) -> Array2<f64> {
    let mut m = Array2::zeros((dim, dim));
    m[[row, col]] = 1.0;
    m
}
