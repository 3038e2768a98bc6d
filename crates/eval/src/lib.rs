//! Exact verification and reporting for candidate matmul algorithms.
//!
//! # Key Components
//!
//! - [`verifier::Verifier`]: exact rational check of `Σ Uᵢ·A·Vᵢ·B·Wᵢ = A·B`
//! - [`verifier::verify_triples`]: boolean contract for 4×4 candidates
//! - [`report::VerificationReport`]: outcome, first mismatch, timing
//! - [`latex::render_latex`]: LaTeX table of a candidate's factors

pub mod latex;
pub mod report;
pub mod verifier;

pub use latex::render_latex;
pub use report::{CoefficientMismatch, VerificationReport, VerificationResult};
pub use verifier::{verify_triples, Verifier};
