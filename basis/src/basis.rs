//! Integral traits shared by primitive and contracted Gaussian orbitals.
//!
//! `Basis` is the single-function view: everything a method driver needs to
//! assemble matrix elements between two (or four) basis functions. `AOBasis`
//! is the per-element view used when expanding a molecular geometry into a
//! full list of atom-centered functions.

use nalgebra::Vector3;
use std::sync::Arc;

/// Analytic integrals over a pair (or quartet) of basis functions.
pub trait Basis {
    /// Value of the basis function at a point in space.
    fn evaluate(&self, r: &Vector3<f64>) -> f64;

    /// Overlap integral ⟨a|b⟩.
    fn Sab(a: &Self, b: &Self) -> f64;

    /// Kinetic energy integral ⟨a|-∇²/2|b⟩.
    fn Tab(a: &Self, b: &Self) -> f64;

    /// Nuclear attraction integral ⟨a|-Z/|r-R||b⟩ for a nucleus of charge
    /// `charge` at `center`.
    fn Vab(a: &Self, b: &Self, center: Vector3<f64>, charge: u32) -> f64;

    /// Two-electron repulsion integral (ab|cd) in chemists' notation.
    fn JKabcd(a: &Self, b: &Self, c: &Self, d: &Self) -> f64;
}

/// A per-element basis set that can be centered on an atom and expanded
/// into its contracted functions.
pub trait AOBasis: Clone {
    type BasisType: Basis;

    /// Number of contracted functions this basis contributes per atom.
    fn basis_size(&self) -> usize;

    /// The contracted functions, centered wherever `set_center` last put them.
    fn get_basis(&self) -> Vec<Arc<Self::BasisType>>;

    /// Move every primitive onto the given atomic center.
    fn set_center(&mut self, center: Vector3<f64>);

    /// Current atomic center.
    fn get_center(&self) -> Vector3<f64>;
}
