//! Restricted Hartree-Fock.

use super::{align_eigenvectors, DIIS, SCF};
use basis::basis::{AOBasis, Basis};
use nalgebra::{DMatrix, DVector, Vector3};
use periodic_table_on_an_enum::Element;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Restricted (closed-shell) Hartree-Fock solver.
#[derive(Clone)]
pub struct SimpleSCF<B: AOBasis> {
    pub num_atoms: usize,
    pub num_basis: usize,
    pub ao_basis: Vec<Arc<Mutex<B>>>,
    mo_basis: Vec<Arc<B::BasisType>>,
    pub coords: Vec<Vector3<f64>>,
    pub elems: Vec<Element>,
    pub coeffs: DMatrix<f64>,
    pub density_mixing: f64,
    pub density_matrix: DMatrix<f64>,
    pub fock_matrix: DMatrix<f64>,
    pub h_core: DMatrix<f64>,
    pub overlap_matrix: DMatrix<f64>,
    pub e_level: DVector<f64>,
    pub max_cycle: usize,
    pub convergence_threshold: f64,
    pub diis: Option<DIIS>,
    pub charge: i32,
    converged: bool,
}

impl<B: AOBasis + Clone + Send> SimpleSCF<B>
where
    B::BasisType: Send + Sync,
{
    pub fn new() -> SimpleSCF<B> {
        SimpleSCF {
            num_atoms: 0,
            num_basis: 0,
            ao_basis: Vec::new(),
            mo_basis: Vec::new(),
            coords: Vec::new(),
            elems: Vec::new(),
            coeffs: DMatrix::zeros(0, 0),
            density_mixing: 0.5,
            density_matrix: DMatrix::zeros(0, 0),
            fock_matrix: DMatrix::zeros(0, 0),
            h_core: DMatrix::zeros(0, 0),
            overlap_matrix: DMatrix::zeros(0, 0),
            e_level: DVector::zeros(0),
            max_cycle: 100,
            convergence_threshold: 1e-8,
            diis: None,
            charge: 0,
            converged: false,
        }
    }

    pub fn set_convergence_threshold(&mut self, threshold: f64) {
        self.convergence_threshold = threshold;
    }

    pub fn set_charge(&mut self, charge: i32) {
        self.charge = charge;
    }

    pub fn enable_diis(&mut self, subspace_size: usize) {
        self.diis = Some(DIIS::new(subspace_size));
        info!("DIIS enabled with subspace size {}", subspace_size);
    }

    pub fn is_converged(&self) -> bool {
        self.converged
    }

    pub fn get_mo_basis(&self) -> &Vec<Arc<B::BasisType>> {
        &self.mo_basis
    }

    /// Number of electrons after applying the molecular charge.
    pub fn num_electrons(&self) -> usize {
        let nuclear: i64 = self
            .elems
            .iter()
            .map(|e| e.get_atomic_number() as i64)
            .sum();
        (nuclear - self.charge as i64).max(0) as usize
    }

    /// Doubly occupied orbitals of the closed-shell reference.
    pub fn num_occupied(&self) -> usize {
        self.num_electrons() / 2
    }

    pub fn nuclear_repulsion(&self) -> f64 {
        let mut energy = 0.0;
        for i in 0..self.num_atoms {
            for j in (i + 1)..self.num_atoms {
                let z_i = self.elems[i].get_atomic_number() as f64;
                let z_j = self.elems[j].get_atomic_number() as f64;
                let r_ij = (self.coords[i] - self.coords[j]).norm();
                if r_ij > 1e-10 {
                    energy += z_i * z_j / r_ij;
                }
            }
        }
        energy
    }

    /// Fock matrix in the MO basis, Cᵀ F C. Diagonal with the orbital
    /// energies once the SCF is converged.
    pub fn mo_fock_matrix(&self) -> DMatrix<f64> {
        self.coeffs.transpose() * &self.fock_matrix * &self.coeffs
    }

    /// Inverse square root of the overlap matrix by symmetric
    /// orthogonalization, discarding near-singular eigenvalues so linearly
    /// dependent basis sets do not blow up the transformation.
    pub fn orthogonalizer(&self) -> DMatrix<f64> {
        let eig = self.overlap_matrix.clone().symmetric_eigen();

        let threshold = 1e-10;
        let mut inv_sqrt_vals = DVector::from_element(eig.eigenvalues.len(), 0.0);
        for i in 0..eig.eigenvalues.len() {
            let val = eig.eigenvalues[i];
            if val > threshold {
                inv_sqrt_vals[i] = 1.0 / val.sqrt();
            }
        }

        let inv_sqrt_d = DMatrix::from_diagonal(&inv_sqrt_vals);
        &eig.eigenvectors * inv_sqrt_d * eig.eigenvectors.transpose()
    }

    pub fn update_fock_matrix(&mut self) {
        let mut g_matrix = DMatrix::zeros(self.num_basis, self.num_basis);
        let p = &self.density_matrix;

        let ij_pairs: Vec<(usize, usize)> = (0..self.num_basis)
            .flat_map(|i| (0..self.num_basis).map(move |j| (i, j)))
            .collect();

        let g_values: Vec<f64> = ij_pairs
            .par_iter()
            .map(|&(i, j)| {
                let mut g_ij = 0.0;
                for k in 0..self.num_basis {
                    for l in 0..self.num_basis {
                        let coulomb = B::BasisType::JKabcd(
                            &self.mo_basis[i],
                            &self.mo_basis[j],
                            &self.mo_basis[k],
                            &self.mo_basis[l],
                        );
                        let exchange = B::BasisType::JKabcd(
                            &self.mo_basis[i],
                            &self.mo_basis[k],
                            &self.mo_basis[j],
                            &self.mo_basis[l],
                        );
                        g_ij += p[(k, l)] * (coulomb - 0.5 * exchange);
                    }
                }
                g_ij
            })
            .collect();

        for (idx, &(i, j)) in ij_pairs.iter().enumerate() {
            g_matrix[(i, j)] = g_values[idx];
        }

        self.fock_matrix = &self.h_core + g_matrix;
    }

    /// Diagonalize a Fock matrix in the orthogonalized basis, storing
    /// aligned coefficients and sorted orbital energies.
    fn diagonalize_fock(&mut self, fock: &DMatrix<f64>) {
        let x = self.orthogonalizer();
        let f_prime = x.transpose() * fock * &x;
        let eig = f_prime.symmetric_eigen();

        let mut indices: Vec<usize> = (0..eig.eigenvalues.len()).collect();
        indices.sort_by(|&a, &b| {
            eig.eigenvalues[a]
                .partial_cmp(&eig.eigenvalues[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let sorted_eigenvalues =
            DVector::from_fn(eig.eigenvalues.len(), |i, _| eig.eigenvalues[indices[i]]);
        let sorted_eigenvectors = eig.eigenvectors.select_columns(&indices);

        self.coeffs = align_eigenvectors(x * sorted_eigenvectors);
        self.e_level = sorted_eigenvalues;
    }
}

impl<B: AOBasis + Clone + Send> Default for SimpleSCF<B>
where
    B::BasisType: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<B: AOBasis + Clone + Send> SCF for SimpleSCF<B>
where
    B::BasisType: Send + Sync,
{
    type BasisType = B;

    fn init_basis(&mut self, elems: &[Element], basis: HashMap<&str, &B>) {
        self.elems = elems.to_vec();
        self.num_atoms = elems.len();
        self.ao_basis.clear();
        for elem in elems {
            let b = *basis
                .get(elem.get_symbol())
                .unwrap_or_else(|| panic!("no basis registered for {}", elem.get_symbol()));
            self.ao_basis.push(Arc::new(Mutex::new((*b).clone())));
        }
    }

    fn init_geometry(&mut self, coords: &[Vector3<f64>], elems: &[Element]) {
        assert_eq!(coords.len(), elems.len());
        self.coords = coords.to_vec();
        for i in 0..self.num_atoms {
            self.ao_basis[i].lock().unwrap().set_center(coords[i]);
        }

        self.mo_basis.clear();
        self.num_basis = 0;
        for ao in &self.ao_basis {
            let ao_locked = ao.lock().unwrap();
            self.mo_basis.extend(ao_locked.get_basis());
            self.num_basis += ao_locked.basis_size();
        }

        self.density_matrix = DMatrix::zeros(self.num_basis, self.num_basis);
        self.fock_matrix = DMatrix::zeros(self.num_basis, self.num_basis);
        self.h_core = DMatrix::zeros(self.num_basis, self.num_basis);
        self.coeffs = DMatrix::zeros(self.num_basis, self.num_basis);
        self.e_level = DVector::zeros(self.num_basis);
        self.overlap_matrix = DMatrix::zeros(self.num_basis, self.num_basis);
    }

    fn init_density_matrix(&mut self) {
        let ij_pairs: Vec<(usize, usize)> = (0..self.num_basis)
            .flat_map(|i| (0..self.num_basis).map(move |j| (i, j)))
            .collect();

        let overlap_values: Vec<f64> = ij_pairs
            .par_iter()
            .map(|&(i, j)| B::BasisType::Sab(&self.mo_basis[i], &self.mo_basis[j]))
            .collect();

        let kinetic_values: Vec<f64> = ij_pairs
            .par_iter()
            .map(|&(i, j)| B::BasisType::Tab(&self.mo_basis[i], &self.mo_basis[j]))
            .collect();

        let nuclear_values: Vec<f64> = ij_pairs
            .par_iter()
            .map(|&(i, j)| {
                let mut nuclear_sum = 0.0;
                for k in 0..self.num_atoms {
                    nuclear_sum += B::BasisType::Vab(
                        &self.mo_basis[i],
                        &self.mo_basis[j],
                        self.coords[k],
                        self.elems[k].get_atomic_number() as u32,
                    );
                }
                nuclear_sum
            })
            .collect();

        for (idx, &(i, j)) in ij_pairs.iter().enumerate() {
            self.overlap_matrix[(i, j)] = overlap_values[idx];
            self.h_core[(i, j)] = kinetic_values[idx] + nuclear_values[idx];
        }

        // core guess: diagonalize H_core for the starting density
        let h_core = self.h_core.clone();
        self.diagonalize_fock(&h_core);
        self.update_density_matrix();
    }

    fn update_density_matrix(&mut self) {
        let n_occ = self.num_occupied();
        let occupied_coeffs = self.coeffs.columns(0, n_occ);
        let new_density = 2.0 * &occupied_coeffs * occupied_coeffs.transpose();

        if self.density_matrix.iter().all(|&x| x == 0.0) {
            self.density_matrix = new_density;
        } else {
            self.density_matrix = self.density_mixing * new_density
                + (1.0 - self.density_mixing) * self.density_matrix.clone();
        }
    }

    fn init_fock_matrix(&mut self) {
        self.fock_matrix = self.h_core.clone();
        self.update_fock_matrix();
    }

    fn scf_cycle(&mut self) {
        let mut old_energy = 0.0;
        self.converged = false;

        for cycle in 0..self.max_cycle {
            self.update_fock_matrix();

            // DIIS extrapolation replaces plain density mixing once the
            // subspace holds at least two iterations
            let fock = match self.diis.as_mut() {
                Some(diis) => {
                    diis.update(
                        self.fock_matrix.clone(),
                        &self.density_matrix,
                        &self.overlap_matrix,
                    );
                    if diis.len() > 1 {
                        diis.extrapolate().unwrap_or_else(|| self.fock_matrix.clone())
                    } else {
                        self.fock_matrix.clone()
                    }
                }
                None => self.fock_matrix.clone(),
            };

            self.diagonalize_fock(&fock);
            self.update_density_matrix();

            let total_energy = self.calculate_total_energy();
            let energy_change = total_energy - old_energy;

            info!(
                "Cycle {}: E = {:.12} au, dE = {:.12} au",
                cycle, total_energy, energy_change
            );

            if energy_change.abs() < self.convergence_threshold {
                info!("SCF converged in {} cycles.", cycle + 1);
                self.converged = true;
                break;
            }
            old_energy = total_energy;
        }

        if !self.converged {
            info!(
                "SCF did not converge within {} cycles (threshold {:.2e})",
                self.max_cycle, self.convergence_threshold
            );
        }
    }

    fn calculate_total_energy(&self) -> f64 {
        // E_elec = Tr(P H_core) + 0.5 Tr(P G) with G = F - H_core
        let mut one_electron_energy = 0.0;
        let mut two_electron_energy = 0.0;
        for i in 0..self.num_basis {
            for j in 0..self.num_basis {
                let p_ij = self.density_matrix[(i, j)];
                one_electron_energy += p_ij * self.h_core[(i, j)];
                two_electron_energy +=
                    0.5 * p_ij * (self.fock_matrix[(i, j)] - self.h_core[(i, j)]);
            }
        }

        let total_energy = one_electron_energy + two_electron_energy + self.nuclear_repulsion();
        if total_energy.is_finite() {
            total_energy
        } else {
            0.0
        }
    }
}
