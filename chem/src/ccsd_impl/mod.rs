//! CCSD (Coupled Cluster Singles and Doubles).
//!
//! Works in the spin-orbital basis over antisymmetrized MO integrals
//! reconstructed from the Cholesky vectors. The amplitude equations are the
//! standard one- and two-particle intermediate formulation; a closed-shell
//! reference is assumed, so each spatial orbital carries an alpha and a beta
//! spin orbital at the same energy.

mod ccsd;
#[cfg(test)]
mod tests;

pub use ccsd::Ccsd;
