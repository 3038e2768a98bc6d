//! Factor triples - one `(U, V, W)` term of a bilinear algorithm.

use crate::error::FactorError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Matrix dimension of the search domain (4×4 matrix multiplication).
pub const MATRIX_DIM: usize = 4;

/// Selects one of the three factor matrices in a triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    U,
    V,
    W,
}

impl Factor {
    pub const ALL: [Factor; 3] = [Factor::U, Factor::V, Factor::W];
}

/// One term `U · A · V · B · W` of a candidate algorithm.
///
/// Shapes are not checked on construction; the verifier rejects triples whose
/// matrices are not all n×n.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTriple", into = "RawTriple")]
pub struct Triple {
    pub u: Array2<f64>,
    pub v: Array2<f64>,
    pub w: Array2<f64>,
}

impl Triple {
    pub fn new(u: Array2<f64>, v: Array2<f64>, w: Array2<f64>) -> Self {
        Self { u, v, w }
    }

    pub fn zeros(dim: usize) -> Self {
        Self::new(
            Array2::zeros((dim, dim)),
            Array2::zeros((dim, dim)),
            Array2::zeros((dim, dim)),
        )
    }

    /// `(I, I, I)`, which alone reconstructs `A · B`.
    pub fn identity(dim: usize) -> Self {
        Self::new(Array2::eye(dim), Array2::eye(dim), Array2::eye(dim))
    }

    pub fn factor(&self, factor: Factor) -> &Array2<f64> {
        match factor {
            Factor::U => &self.u,
            Factor::V => &self.v,
            Factor::W => &self.w,
        }
    }

    pub fn factor_mut(&mut self, factor: Factor) -> &mut Array2<f64> {
        match factor {
            Factor::U => &mut self.u,
            Factor::V => &mut self.v,
            Factor::W => &mut self.w,
        }
    }

    /// Returns `Some(n)` when all three factors are n×n.
    pub fn square_dim(&self) -> Option<usize> {
        let (rows, cols) = self.u.dim();
        let same = [&self.u, &self.v, &self.w]
            .iter()
            .all(|m| m.dim() == (rows, cols));
        (same && rows == cols).then_some(rows)
    }

    /// Build from nested row vectors, the on-disk representation.
    pub fn from_rows(rows: [Vec<Vec<f64>>; 3]) -> Result<Self, FactorError> {
        let [u, v, w] = rows;
        Ok(Self::new(
            matrix_from_rows(u)?,
            matrix_from_rows(v)?,
            matrix_from_rows(w)?,
        ))
    }

    pub fn to_rows(&self) -> [Vec<Vec<f64>>; 3] {
        [
            matrix_to_rows(&self.u),
            matrix_to_rows(&self.v),
            matrix_to_rows(&self.w),
        ]
    }
}

fn matrix_from_rows(rows: Vec<Vec<f64>>) -> Result<Array2<f64>, FactorError> {
    let nrows = rows.len();
    let ncols = rows.first().map(Vec::len).unwrap_or(0);
    if let Some(bad) = rows.iter().position(|row| row.len() != ncols) {
        return Err(FactorError::Shape(format!(
            "row {} has {} entries, expected {}",
            bad,
            rows[bad].len(),
            ncols
        )));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), flat).map_err(|e| FactorError::Shape(e.to_string()))
}

fn matrix_to_rows(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct RawTriple([Vec<Vec<f64>>; 3]);

impl TryFrom<RawTriple> for Triple {
    type Error = FactorError;

    fn try_from(raw: RawTriple) -> Result<Self, Self::Error> {
        Triple::from_rows(raw.0)
    }
}

impl From<Triple> for RawTriple {
    fn from(triple: Triple) -> Self {
        RawTriple(triple.to_rows())
    }
}
