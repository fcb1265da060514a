//! Dense full CI solver over spatial MO integrals.

use super::determinant::{
    occupation_strings, occupied_orbitals, single_excitation_sign, Determinant,
};
use crate::cholesky_impl::SpatialEri;
use crate::fcidump;
use color_eyre::eyre::{eyre, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::path::Path;
use tracing::info;

/// Full CI over all determinants with fixed (nalpha, nbeta).
pub struct FullCi {
    pub norb: usize,
    pub nalpha: usize,
    pub nbeta: usize,
    /// One-electron MO integrals h_pq.
    h1: DMatrix<f64>,
    /// Two-electron MO integrals (pq|rs), chemists' notation.
    eri: SpatialEri,
    /// Core (nuclear repulsion) energy added to every eigenvalue.
    pub core_energy: f64,
}

impl FullCi {
    pub fn new(
        h1: DMatrix<f64>,
        eri: SpatialEri,
        nalpha: usize,
        nbeta: usize,
        core_energy: f64,
    ) -> Self {
        assert_eq!(h1.nrows(), h1.ncols());
        assert_eq!(h1.nrows(), eri.n);
        let norb = h1.nrows();
        assert!(nalpha <= norb && nbeta <= norb);

        FullCi {
            norb,
            nalpha,
            nbeta,
            h1,
            eri,
            core_energy,
        }
    }

    /// Load integrals from an FCIDUMP file; electron counts come from the
    /// NELEC / MS2 header fields.
    pub fn from_fcidump<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dump = fcidump::read_fcidump(path)?;
        let nelec = dump.nelec as i64;
        let ms2 = dump.ms2 as i64;
        if (nelec + ms2) % 2 != 0 || ms2.abs() > nelec {
            return Err(eyre!("inconsistent NELEC={} and MS2={}", nelec, ms2));
        }
        let nalpha = ((nelec + ms2) / 2) as usize;
        let nbeta = dump.nelec - nalpha;
        Ok(FullCi::new(
            dump.h1,
            dump.eri,
            nalpha,
            nbeta,
            dump.core_energy,
        ))
    }

    /// Size of the determinant space.
    pub fn dimension(&self) -> usize {
        binomial(self.norb, self.nalpha) * binomial(self.norb, self.nbeta)
    }

    /// Every determinant of the space, beta strings fastest.
    pub fn determinants(&self) -> Vec<Determinant> {
        let alpha_strings = occupation_strings(self.norb, self.nalpha);
        let beta_strings = occupation_strings(self.norb, self.nbeta);
        let mut dets = Vec::with_capacity(alpha_strings.len() * beta_strings.len());
        for &alpha in &alpha_strings {
            for &beta in &beta_strings {
                dets.push(Determinant::new(alpha, beta));
            }
        }
        dets
    }

    fn diagonal_element(&self, det: &Determinant) -> f64 {
        let alpha_occ = occupied_orbitals(det.alpha);
        let beta_occ = occupied_orbitals(det.beta);

        let mut energy = 0.0;
        for &p in alpha_occ.iter().chain(beta_occ.iter()) {
            energy += self.h1[(p, p)];
        }

        // same-spin pairs: Coulomb minus exchange
        for occ in [&alpha_occ, &beta_occ] {
            for (idx, &p) in occ.iter().enumerate() {
                for &q in &occ[idx + 1..] {
                    energy += self.eri.get(p, p, q, q) - self.eri.get(p, q, q, p);
                }
            }
        }

        // opposite-spin pairs: Coulomb only
        for &p in &alpha_occ {
            for &q in &beta_occ {
                energy += self.eri.get(p, p, q, q);
            }
        }

        energy
    }

    /// ⟨bra|H|ket⟩ where the strings differ by one excitation in the spin
    /// channel given by (`bra_string`, `ket_string`); `same_occ` are the
    /// orbitals of that channel in the bra, `other_occ` of the other spin.
    fn single_element(
        &self,
        bra_string: u64,
        ket_string: u64,
        same_occ: &[usize],
        other_occ: &[usize],
    ) -> f64 {
        let hole = (bra_string & !ket_string).trailing_zeros() as usize;
        let particle = (ket_string & !bra_string).trailing_zeros() as usize;
        let sign = single_excitation_sign(bra_string, hole, particle);

        let mut value = self.h1[(hole, particle)];
        for &r in same_occ {
            if r == hole {
                continue;
            }
            value += self.eri.get(hole, particle, r, r) - self.eri.get(hole, r, r, particle);
        }
        for &r in other_occ {
            value += self.eri.get(hole, particle, r, r);
        }
        sign * value
    }

    /// Same-spin double excitation.
    fn double_same_spin_element(&self, bra_string: u64, ket_string: u64) -> f64 {
        let holes = occupied_orbitals(bra_string & !ket_string);
        let particles = occupied_orbitals(ket_string & !bra_string);
        let (p, q) = (holes[0], holes[1]);
        let (r, s) = (particles[0], particles[1]);

        // apply the two singles in sequence for the phase
        let sign1 = single_excitation_sign(bra_string, p, r);
        let intermediate = bra_string & !(1u64 << p) | (1u64 << r);
        let sign2 = single_excitation_sign(intermediate, q, s);

        sign1 * sign2 * (self.eri.get(p, r, q, s) - self.eri.get(p, s, q, r))
    }

    /// One alpha and one beta single excitation.
    fn double_mixed_spin_element(&self, bra: &Determinant, ket: &Determinant) -> f64 {
        let alpha_hole = (bra.alpha & !ket.alpha).trailing_zeros() as usize;
        let alpha_particle = (ket.alpha & !bra.alpha).trailing_zeros() as usize;
        let beta_hole = (bra.beta & !ket.beta).trailing_zeros() as usize;
        let beta_particle = (ket.beta & !bra.beta).trailing_zeros() as usize;

        let sign = single_excitation_sign(bra.alpha, alpha_hole, alpha_particle)
            * single_excitation_sign(bra.beta, beta_hole, beta_particle);

        sign * self.eri.get(alpha_hole, alpha_particle, beta_hole, beta_particle)
    }

    /// Slater-Condon matrix element between two determinants.
    pub fn hamiltonian_element(&self, bra: &Determinant, ket: &Determinant) -> f64 {
        let da = (bra.alpha ^ ket.alpha).count_ones() / 2;
        let db = (bra.beta ^ ket.beta).count_ones() / 2;

        match (da, db) {
            (0, 0) => self.diagonal_element(bra),
            (1, 0) => self.single_element(
                bra.alpha,
                ket.alpha,
                &occupied_orbitals(bra.alpha),
                &occupied_orbitals(bra.beta),
            ),
            (0, 1) => self.single_element(
                bra.beta,
                ket.beta,
                &occupied_orbitals(bra.beta),
                &occupied_orbitals(bra.alpha),
            ),
            (2, 0) => self.double_same_spin_element(bra.alpha, ket.alpha),
            (0, 2) => self.double_same_spin_element(bra.beta, ket.beta),
            (1, 1) => self.double_mixed_spin_element(bra, ket),
            _ => 0.0,
        }
    }

    /// Assemble the dense Hamiltonian, parallel over rows.
    pub fn build_hamiltonian(&self) -> DMatrix<f64> {
        let dets = self.determinants();
        let dim = dets.len();

        info!("Building FCI Hamiltonian: {} determinants", dim);
        let rows: Vec<Vec<f64>> = (0..dim)
            .into_par_iter()
            .map(|i| {
                (0..dim)
                    .map(|j| self.hamiltonian_element(&dets[i], &dets[j]))
                    .collect()
            })
            .collect();

        let mut h = DMatrix::zeros(dim, dim);
        for (i, row) in rows.iter().enumerate() {
            for (j, &val) in row.iter().enumerate() {
                h[(i, j)] = val;
            }
        }
        h
    }

    /// Lowest `nroots` total energies (electronic plus core).
    pub fn solve(&self, nroots: usize) -> Vec<f64> {
        let h = self.build_hamiltonian();

        info!("Diagonalizing FCI Hamiltonian ({} x {})", h.nrows(), h.ncols());
        let eigen = h.symmetric_eigen();
        let mut eigenvalues: Vec<f64> = eigen.eigenvalues.iter().copied().collect();
        eigenvalues.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        eigenvalues
            .into_iter()
            .take(nroots)
            .map(|e| e + self.core_energy)
            .collect()
    }
}

fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: usize = 1;
    for i in 0..k {
        result = result * (n - i) / (i + 1);
    }
    result
}
