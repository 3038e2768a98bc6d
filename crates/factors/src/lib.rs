//! Factor-triple model for bilinear matrix multiplication algorithms.
//!
//! A candidate algorithm for multiplying two n×n matrices is an ordered list of
//! [`Triple`]s `(U, V, W)`. The candidate is correct when
//!
//! ```text
//!     Σᵢ Uᵢ · A · Vᵢ · B · Wᵢ  =  A · B
//! ```
//!
//! holds for every A and B. The number of triples is the candidate's *rank*.
//!
//! # Key Components
//!
//! - [`triple::Triple`]: one `(U, V, W)` term, stored as `ndarray` matrices
//! - [`io`]: JSON persistence (`rank45.json`-style arrays of triples)
//! - [`mutator`]: Gaussian factor mutation and one-point crossover
//! - [`seeds`]: known-correct starting candidates

pub mod error;
pub mod io;
pub mod mutator;
pub mod seeds;
pub mod triple;

pub use error::FactorError;
pub use io::{load_triples, save_triples, triples_from_json, triples_to_json};
pub use mutator::{crossover, mutate_factor, DEFAULT_SIGMA};
pub use seeds::{identity_seed, naive_seed, SeedKind};
pub use triple::{Factor, Triple, MATRIX_DIM};
