//! Core CCSD implementation.

use crate::cholesky_impl::{CholeskyVectors, SpatialEri};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::info;

/// Spin-orbital CCSD solver.
///
/// Spin orbitals interleave spin over the energy-sorted spatial orbitals:
/// spin orbital P lives in spatial orbital P/2 with spin P%2, so the first
/// 2·nocc spin orbitals are the occupied ones.
pub struct Ccsd {
    /// Number of spin orbitals (2 × spatial orbitals).
    pub nso: usize,
    /// Occupied spin orbitals.
    pub no: usize,
    /// Virtual spin orbitals.
    pub nv: usize,

    /// Diagonal spin-orbital Fock elements (orbital energies).
    fock: Vec<f64>,

    /// Antisymmetrized integrals ⟨pq||rs⟩ over spin orbitals.
    ints: Vec<f64>,

    /// T1 amplitudes t_i^a.
    pub t1: DMatrix<f64>,

    /// T2 amplitudes t_ij^ab, flat over (i, j, a, b).
    pub t2: Vec<f64>,

    pub max_iterations: usize,
    pub convergence_threshold: f64,
    pub correlation_energy: Option<f64>,
}

impl Ccsd {
    /// Build the solver from MO-basis data: orbital energies, the full
    /// 4-index MO integrals (chemists' notation) and the number of doubly
    /// occupied spatial orbitals.
    pub fn new(
        orbital_energies: &DVector<f64>,
        eri_mo: &SpatialEri,
        nocc_spatial: usize,
        max_iterations: usize,
        convergence_threshold: f64,
    ) -> Self {
        let nmo = eri_mo.n;
        assert_eq!(orbital_energies.len(), nmo);
        let nso = 2 * nmo;
        let no = 2 * nocc_spatial;
        let nv = nso - no;

        info!("===========================================");
        info!("     CCSD Initialization");
        info!("===========================================");
        info!("Spatial orbitals: {}", nmo);
        info!("Occupied spin orbitals: {}", no);
        info!("Virtual spin orbitals: {}", nv);
        info!("Max iterations: {}", max_iterations);
        info!("Convergence threshold: {:.2e}", convergence_threshold);

        let mut fock = vec![0.0; nso];
        for p in 0..nso {
            fock[p] = orbital_energies[p / 2];
        }

        // ⟨pq||rs⟩ = (pr|qs)δ(σp,σr)δ(σq,σs) − (ps|qr)δ(σp,σs)δ(σq,σr)
        let mut ints = vec![0.0; nso * nso * nso * nso];
        for p in 0..nso {
            for q in 0..nso {
                for r in 0..nso {
                    for s in 0..nso {
                        let mut value = 0.0;
                        if p % 2 == r % 2 && q % 2 == s % 2 {
                            value += eri_mo.get(p / 2, r / 2, q / 2, s / 2);
                        }
                        if p % 2 == s % 2 && q % 2 == r % 2 {
                            value -= eri_mo.get(p / 2, s / 2, q / 2, r / 2);
                        }
                        ints[((p * nso + q) * nso + r) * nso + s] = value;
                    }
                }
            }
        }

        let t2_size = no * no * nv * nv;
        info!(
            "Amplitude storage: T1 {} x {}, T2 {:.2} MB",
            no,
            nv,
            (t2_size * 8) as f64 / 1_048_576.0
        );
        info!("===========================================");

        Ccsd {
            nso,
            no,
            nv,
            fock,
            ints,
            t1: DMatrix::zeros(no, nv),
            t2: vec![0.0; t2_size],
            max_iterations,
            convergence_threshold,
            correlation_energy: None,
        }
    }

    /// Convenience constructor from MO-basis Cholesky vectors.
    pub fn from_cholesky(
        orbital_energies: &DVector<f64>,
        cholesky_mo: &CholeskyVectors,
        nocc_spatial: usize,
        max_iterations: usize,
        convergence_threshold: f64,
    ) -> Self {
        let eri_mo = cholesky_mo.reconstruct_full();
        Ccsd::new(
            orbital_energies,
            &eri_mo,
            nocc_spatial,
            max_iterations,
            convergence_threshold,
        )
    }

    #[inline]
    fn ints(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        self.ints[((p * self.nso + q) * self.nso + r) * self.nso + s]
    }

    #[inline]
    fn t2_get(&self, i: usize, j: usize, a: usize, b: usize) -> f64 {
        self.t2[((i * self.no + j) * self.nv + a) * self.nv + b]
    }

    #[inline]
    fn denom1(&self, i: usize, a: usize) -> f64 {
        self.fock[i] - self.fock[self.no + a]
    }

    #[inline]
    fn denom2(&self, i: usize, j: usize, a: usize, b: usize) -> f64 {
        self.fock[i] + self.fock[j] - self.fock[self.no + a] - self.fock[self.no + b]
    }

    /// Effective doubles including disconnected singles,
    /// τ_ij^ab = t_ij^ab + t_i^a t_j^b − t_i^b t_j^a.
    #[inline]
    fn tau(&self, i: usize, j: usize, a: usize, b: usize) -> f64 {
        self.t2_get(i, j, a, b) + self.t1[(i, a)] * self.t1[(j, b)]
            - self.t1[(i, b)] * self.t1[(j, a)]
    }

    /// τ̃_ij^ab = t_ij^ab + ½(t_i^a t_j^b − t_i^b t_j^a).
    #[inline]
    fn tau_tilde(&self, i: usize, j: usize, a: usize, b: usize) -> f64 {
        self.t2_get(i, j, a, b)
            + 0.5 * (self.t1[(i, a)] * self.t1[(j, b)] - self.t1[(i, b)] * self.t1[(j, a)])
    }

    /// Seed T2 with the MP2 amplitudes and return the MP2 energy.
    pub fn initialize_mp2(&mut self) -> f64 {
        let (no, nv) = (self.no, self.nv);
        let mut energy = 0.0;
        for i in 0..no {
            for j in 0..no {
                for a in 0..nv {
                    for b in 0..nv {
                        let denom = self.denom2(i, j, a, b);
                        if denom.abs() > 1e-10 {
                            let amplitude = self.ints(i, j, no + a, no + b) / denom;
                            self.t2[((i * no + j) * nv + a) * nv + b] = amplitude;
                            energy += 0.25 * self.ints(i, j, no + a, no + b) * amplitude;
                        }
                    }
                }
            }
        }
        energy
    }

    /// CCSD correlation energy of the current amplitudes:
    /// E = ¼ Σ ⟨ij||ab⟩ t_ij^ab + ½ Σ ⟨ij||ab⟩ t_i^a t_j^b.
    pub fn compute_energy(&self) -> f64 {
        let (no, nv) = (self.no, self.nv);
        let mut energy = 0.0;
        for i in 0..no {
            for j in 0..no {
                for a in 0..nv {
                    for b in 0..nv {
                        let integral = self.ints(i, j, no + a, no + b);
                        energy += 0.25 * integral * self.t2_get(i, j, a, b);
                        energy += 0.5 * integral * self.t1[(i, a)] * self.t1[(j, b)];
                    }
                }
            }
        }
        energy
    }

    /// One iteration of the amplitude equations; returns the updated
    /// amplitudes without touching the stored ones.
    fn amplitude_update(&self) -> (DMatrix<f64>, Vec<f64>) {
        let (no, nv) = (self.no, self.nv);

        // one-particle intermediates
        let mut fae = vec![0.0; nv * nv];
        for a in 0..nv {
            for e in 0..nv {
                let mut value = 0.0;
                for m in 0..no {
                    for f in 0..nv {
                        value += self.t1[(m, f)] * self.ints(m, no + a, no + f, no + e);
                        for n in 0..no {
                            value -= 0.5
                                * self.tau_tilde(m, n, a, f)
                                * self.ints(m, n, no + e, no + f);
                        }
                    }
                }
                fae[a * nv + e] = value;
            }
        }

        let mut fmi = vec![0.0; no * no];
        for m in 0..no {
            for i in 0..no {
                let mut value = 0.0;
                for n in 0..no {
                    for e in 0..nv {
                        value += self.t1[(n, e)] * self.ints(m, n, i, no + e);
                        for f in 0..nv {
                            value +=
                                0.5 * self.tau_tilde(i, n, e, f) * self.ints(m, n, no + e, no + f);
                        }
                    }
                }
                fmi[m * no + i] = value;
            }
        }

        let mut fme = vec![0.0; no * nv];
        for m in 0..no {
            for e in 0..nv {
                let mut value = 0.0;
                for n in 0..no {
                    for f in 0..nv {
                        value += self.t1[(n, f)] * self.ints(m, n, no + e, no + f);
                    }
                }
                fme[m * nv + e] = value;
            }
        }

        // two-particle intermediates
        let mut wmnij = vec![0.0; no * no * no * no];
        for m in 0..no {
            for n in 0..no {
                for i in 0..no {
                    for j in 0..no {
                        let mut value = self.ints(m, n, i, j);
                        for e in 0..nv {
                            value += self.t1[(j, e)] * self.ints(m, n, i, no + e);
                            value -= self.t1[(i, e)] * self.ints(m, n, j, no + e);
                            for f in 0..nv {
                                value += 0.25
                                    * self.tau(i, j, e, f)
                                    * self.ints(m, n, no + e, no + f);
                            }
                        }
                        wmnij[((m * no + n) * no + i) * no + j] = value;
                    }
                }
            }
        }

        let mut wabef = vec![0.0; nv * nv * nv * nv];
        for a in 0..nv {
            for b in 0..nv {
                for e in 0..nv {
                    for f in 0..nv {
                        let mut value = self.ints(no + a, no + b, no + e, no + f);
                        for m in 0..no {
                            value -= self.t1[(m, b)] * self.ints(no + a, m, no + e, no + f);
                            value += self.t1[(m, a)] * self.ints(no + b, m, no + e, no + f);
                            for n in 0..no {
                                value += 0.25
                                    * self.tau(m, n, a, b)
                                    * self.ints(m, n, no + e, no + f);
                            }
                        }
                        wabef[((a * nv + b) * nv + e) * nv + f] = value;
                    }
                }
            }
        }

        let mut wmbej = vec![0.0; no * nv * nv * no];
        for m in 0..no {
            for b in 0..nv {
                for e in 0..nv {
                    for j in 0..no {
                        let mut value = self.ints(m, no + b, no + e, j);
                        for f in 0..nv {
                            value += self.t1[(j, f)] * self.ints(m, no + b, no + e, no + f);
                        }
                        for n in 0..no {
                            value -= self.t1[(n, b)] * self.ints(m, n, no + e, j);
                            for f in 0..nv {
                                value -= (0.5 * self.t2_get(j, n, f, b)
                                    + self.t1[(j, f)] * self.t1[(n, b)])
                                    * self.ints(m, n, no + e, no + f);
                            }
                        }
                        wmbej[((m * nv + b) * nv + e) * no + j] = value;
                    }
                }
            }
        }

        // T1 equations
        let mut new_t1 = DMatrix::zeros(no, nv);
        for i in 0..no {
            for a in 0..nv {
                let mut rhs = 0.0;
                for e in 0..nv {
                    rhs += self.t1[(i, e)] * fae[a * nv + e];
                }
                for m in 0..no {
                    rhs -= self.t1[(m, a)] * fmi[m * no + i];
                    for e in 0..nv {
                        rhs += self.t2_get(i, m, a, e) * fme[m * nv + e];
                    }
                }
                for n in 0..no {
                    for f in 0..nv {
                        rhs -= self.t1[(n, f)] * self.ints(n, no + a, i, no + f);
                    }
                }
                for m in 0..no {
                    for e in 0..nv {
                        for f in 0..nv {
                            rhs -= 0.5
                                * self.t2_get(i, m, e, f)
                                * self.ints(m, no + a, no + e, no + f);
                        }
                        for n in 0..no {
                            rhs -= 0.5 * self.t2_get(m, n, a, e) * self.ints(n, m, no + e, i);
                        }
                    }
                }

                let denom = self.denom1(i, a);
                new_t1[(i, a)] = if denom.abs() > 1e-10 {
                    rhs / denom
                } else {
                    self.t1[(i, a)]
                };
            }
        }

        // T2 equations, parallel over the (i, j) pairs
        let pairs: Vec<(usize, usize)> = (0..no)
            .flat_map(|i| (0..no).map(move |j| (i, j)))
            .collect();

        let blocks: Vec<Vec<f64>> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let mut block = vec![0.0; nv * nv];
                for a in 0..nv {
                    for b in 0..nv {
                        let mut rhs = self.ints(i, j, no + a, no + b);

                        // P_(ab) Σ_e t_ij^ae (F_be − ½ Σ_m t_m^b F_me)
                        for e in 0..nv {
                            let mut g_be = fae[b * nv + e];
                            let mut g_ae = fae[a * nv + e];
                            for m in 0..no {
                                g_be -= 0.5 * self.t1[(m, b)] * fme[m * nv + e];
                                g_ae -= 0.5 * self.t1[(m, a)] * fme[m * nv + e];
                            }
                            rhs += self.t2_get(i, j, a, e) * g_be;
                            rhs -= self.t2_get(i, j, b, e) * g_ae;
                        }

                        // −P_(ij) Σ_m t_im^ab (F_mj + ½ Σ_e t_j^e F_me)
                        for m in 0..no {
                            let mut h_mj = fmi[m * no + j];
                            let mut h_mi = fmi[m * no + i];
                            for e in 0..nv {
                                h_mj += 0.5 * self.t1[(j, e)] * fme[m * nv + e];
                                h_mi += 0.5 * self.t1[(i, e)] * fme[m * nv + e];
                            }
                            rhs -= self.t2_get(i, m, a, b) * h_mj;
                            rhs += self.t2_get(j, m, a, b) * h_mi;
                        }

                        // ½ Σ_mn τ_mn^ab W_mnij
                        for m in 0..no {
                            for n in 0..no {
                                rhs += 0.5
                                    * self.tau(m, n, a, b)
                                    * wmnij[((m * no + n) * no + i) * no + j];
                            }
                        }

                        // ½ Σ_ef τ_ij^ef W_abef
                        for e in 0..nv {
                            for f in 0..nv {
                                rhs += 0.5
                                    * self.tau(i, j, e, f)
                                    * wabef[((a * nv + b) * nv + e) * nv + f];
                            }
                        }

                        // P_(ij) P_(ab) Σ_me (t_im^ae W_mbej − t_i^e t_m^a ⟨mb||ej⟩)
                        for m in 0..no {
                            for e in 0..nv {
                                rhs += self.t2_get(i, m, a, e)
                                    * wmbej[((m * nv + b) * nv + e) * no + j]
                                    - self.t1[(i, e)]
                                        * self.t1[(m, a)]
                                        * self.ints(m, no + b, no + e, j);
                                rhs -= self.t2_get(j, m, a, e)
                                    * wmbej[((m * nv + b) * nv + e) * no + i]
                                    - self.t1[(j, e)]
                                        * self.t1[(m, a)]
                                        * self.ints(m, no + b, no + e, i);
                                rhs -= self.t2_get(i, m, b, e)
                                    * wmbej[((m * nv + a) * nv + e) * no + j]
                                    - self.t1[(i, e)]
                                        * self.t1[(m, b)]
                                        * self.ints(m, no + a, no + e, j);
                                rhs += self.t2_get(j, m, b, e)
                                    * wmbej[((m * nv + a) * nv + e) * no + i]
                                    - self.t1[(j, e)]
                                        * self.t1[(m, b)]
                                        * self.ints(m, no + a, no + e, i);
                            }
                        }

                        // P_(ij) Σ_e t_i^e ⟨ab||ej⟩
                        for e in 0..nv {
                            rhs += self.t1[(i, e)] * self.ints(no + a, no + b, no + e, j);
                            rhs -= self.t1[(j, e)] * self.ints(no + a, no + b, no + e, i);
                        }

                        // −P_(ab) Σ_m t_m^a ⟨mb||ij⟩
                        for m in 0..no {
                            rhs -= self.t1[(m, a)] * self.ints(m, no + b, i, j);
                            rhs += self.t1[(m, b)] * self.ints(m, no + a, i, j);
                        }

                        let denom = self.denom2(i, j, a, b);
                        block[a * nv + b] = if denom.abs() > 1e-10 {
                            rhs / denom
                        } else {
                            self.t2_get(i, j, a, b)
                        };
                    }
                }
                block
            })
            .collect();

        let mut new_t2 = vec![0.0; no * no * nv * nv];
        for (&(i, j), block) in pairs.iter().zip(&blocks) {
            let offset = (i * no + j) * nv * nv;
            new_t2[offset..offset + nv * nv].copy_from_slice(block);
        }

        (new_t1, new_t2)
    }

    fn rms_change(&self, new_t1: &DMatrix<f64>, new_t2: &[f64]) -> f64 {
        let mut sum_sq = 0.0;
        let mut count = 0usize;

        for i in 0..self.no {
            for a in 0..self.nv {
                let diff = new_t1[(i, a)] - self.t1[(i, a)];
                sum_sq += diff * diff;
                count += 1;
            }
        }
        for (new, old) in new_t2.iter().zip(&self.t2) {
            let diff = new - old;
            sum_sq += diff * diff;
            count += 1;
        }

        (sum_sq / count as f64).sqrt()
    }

    /// Iterate the amplitude equations to convergence and return the CCSD
    /// correlation energy.
    pub fn solve(&mut self) -> f64 {
        info!("===========================================");
        info!("     Starting CCSD Iterations");
        info!("===========================================");

        let mp2_energy = self.initialize_mp2();
        info!("MP2 correlation energy: {:.12} Eh", mp2_energy);
        info!("");
        info!("{:>5} {:>18} {:>18} {:>15}", "Iter", "E_corr", "dE", "RMS(T)");

        let mut old_energy = mp2_energy;
        for iteration in 0..self.max_iterations {
            let (new_t1, new_t2) = self.amplitude_update();
            let rms = self.rms_change(&new_t1, &new_t2);

            self.t1 = new_t1;
            self.t2 = new_t2;

            let new_energy = self.compute_energy();
            let delta_e = new_energy - old_energy;

            info!(
                "{:5} {:18.12} {:18.12} {:15.10}",
                iteration + 1,
                new_energy,
                delta_e,
                rms
            );

            if rms < self.convergence_threshold && delta_e.abs() < self.convergence_threshold {
                info!("CCSD converged in {} iterations", iteration + 1);
                self.correlation_energy = Some(new_energy);
                return new_energy;
            }
            old_energy = new_energy;
        }

        info!(
            "CCSD did not converge within {} iterations",
            self.max_iterations
        );
        self.correlation_energy = Some(old_energy);
        old_energy
    }

    pub fn get_correlation_energy(&self) -> Option<f64> {
        self.correlation_energy
    }

    /// T1 diagnostic ||T1|| / sqrt(N_elec); values above ~0.02 flag
    /// multireference character.
    pub fn t1_diagnostic(&self) -> f64 {
        let t1_norm: f64 = self.t1.iter().map(|x| x * x).sum::<f64>().sqrt();
        t1_norm / (self.no as f64).sqrt()
    }

    /// Print a result block against the reference energy.
    pub fn print_summary(&self, hf_energy: f64) {
        info!("===========================================");
        info!("        CCSD Results Summary");
        info!("===========================================");
        info!("Hartree-Fock energy:       {:.12} Eh", hf_energy);
        if let Some(corr) = self.correlation_energy {
            info!("CCSD correlation energy:   {:.12} Eh", corr);
            info!("Total CCSD energy:         {:.12} Eh", hf_energy + corr);
        } else {
            info!("CCSD correlation energy not yet calculated.");
        }
        info!("===========================================");
    }
}
