//! Cholesky decomposition of the two-electron integrals.
//!
//! The AO electron-repulsion supermatrix V_(μν),(λσ) = (μν|λσ) is positive
//! semidefinite, so a pivoted incomplete Cholesky factorization yields
//! vectors L^x with (μν|λσ) ≈ Σ_x L^x_μν L^x_λσ to any requested accuracy.
//! Downstream drivers work with the MO-transformed vectors and never touch
//! the full 4-index AO tensor.

mod cholesky;
#[cfg(test)]
mod tests;

pub use cholesky::{CholeskyEri, CholeskyVectors, SpatialEri};
