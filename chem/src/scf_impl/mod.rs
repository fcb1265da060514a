//! Self-consistent field machinery: the `SCF` trait, DIIS convergence
//! acceleration, and the restricted Hartree-Fock implementation.

mod simple;
#[cfg(test)]
mod tests;

pub use simple::SimpleSCF;

use basis::basis::AOBasis;
use nalgebra::{DMatrix, DVector, Vector3};
use periodic_table_on_an_enum::Element;
use std::collections::HashMap;

/// Interface every SCF driver provides to the application layer.
pub trait SCF {
    type BasisType: AOBasis;

    fn init_basis(&mut self, elems: &[Element], basis: HashMap<&str, &Self::BasisType>);
    fn init_geometry(&mut self, coords: &[Vector3<f64>], elems: &[Element]);
    fn init_density_matrix(&mut self);
    fn update_density_matrix(&mut self);
    fn init_fock_matrix(&mut self);
    fn scf_cycle(&mut self);
    fn calculate_total_energy(&self) -> f64;
}

/// DIIS (Direct Inversion in the Iterative Subspace) accelerator.
///
/// Extrapolates the Fock matrix from a history of previous iterations,
/// weighted to minimize the commutator error E = FDS - SDF under the
/// constraint that the weights sum to one.
#[derive(Clone)]
pub struct DIIS {
    error_matrices: Vec<DMatrix<f64>>,
    fock_matrices: Vec<DMatrix<f64>>,
    max_subspace_size: usize,
}

impl DIIS {
    pub fn new(max_subspace_size: usize) -> Self {
        DIIS {
            error_matrices: Vec::new(),
            fock_matrices: Vec::new(),
            max_subspace_size,
        }
    }

    /// Commutator error in the AO basis: FDS - SDF.
    pub fn calculate_error_matrix(
        &self,
        fock: &DMatrix<f64>,
        density: &DMatrix<f64>,
        overlap: &DMatrix<f64>,
    ) -> DMatrix<f64> {
        let fds = fock * density * overlap;
        let sdf = overlap * density * fock;
        fds - sdf
    }

    /// Push a Fock matrix into the subspace, evicting the oldest entry once
    /// the history is full.
    pub fn update(
        &mut self,
        fock_matrix: DMatrix<f64>,
        density_matrix: &DMatrix<f64>,
        overlap_matrix: &DMatrix<f64>,
    ) {
        let error = self.calculate_error_matrix(&fock_matrix, density_matrix, overlap_matrix);

        if self.error_matrices.len() >= self.max_subspace_size {
            self.error_matrices.remove(0);
            self.fock_matrices.remove(0);
        }

        self.error_matrices.push(error);
        self.fock_matrices.push(fock_matrix);
    }

    /// Solve the DIIS equations and return the extrapolated Fock matrix.
    /// None when the subspace is empty or the B matrix is singular.
    pub fn extrapolate(&self) -> Option<DMatrix<f64>> {
        let n = self.error_matrices.len();
        if n == 0 {
            return None;
        }

        // B_ij = <e_i|e_j> bordered with the normalization constraint
        let mut b = DMatrix::zeros(n + 1, n + 1);
        for i in 0..n {
            for j in 0..n {
                b[(i, j)] = self.error_matrices[i]
                    .iter()
                    .zip(self.error_matrices[j].iter())
                    .map(|(x, y)| x * y)
                    .sum();
            }
            b[(i, n)] = -1.0;
            b[(n, i)] = -1.0;
        }

        let mut rhs = DVector::zeros(n + 1);
        rhs[n] = -1.0;

        let coeffs = b.lu().solve(&rhs)?;
        if coeffs.iter().any(|c| !c.is_finite()) {
            return None;
        }

        let mut fock = DMatrix::zeros(
            self.fock_matrices[0].nrows(),
            self.fock_matrices[0].ncols(),
        );
        for i in 0..n {
            fock += coeffs[i] * &self.fock_matrices[i];
        }
        Some(fock)
    }

    pub fn len(&self) -> usize {
        self.fock_matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fock_matrices.is_empty()
    }
}

/// Fix the arbitrary sign of each eigenvector so SCF iterations (and
/// restarts) produce reproducible coefficients: the largest-magnitude
/// component of every column is made positive.
pub fn align_eigenvectors(mut eigvecs: DMatrix<f64>) -> DMatrix<f64> {
    for j in 0..eigvecs.ncols() {
        let col = eigvecs.column(j);
        let max_val = col
            .iter()
            .copied()
            .max_by(|a, b| {
                a.abs()
                    .partial_cmp(&b.abs())
                    .unwrap_or(std::cmp::Ordering::Less)
            })
            .unwrap_or(0.0);
        if max_val < 0.0 {
            for i in 0..eigvecs.nrows() {
                eigvecs[(i, j)] = -eigvecs[(i, j)];
            }
        }
    }
    eigvecs
}
