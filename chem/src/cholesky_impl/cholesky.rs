//! Pivoted incomplete Cholesky decomposition of the ERI supermatrix.

use crate::io::StoredTensor;
use basis::basis::Basis;
use color_eyre::eyre::{eyre, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::info;

/// Dense 4-index tensor of spatial-orbital integrals (pq|rs), chemists'
/// notation, row-major over (p, q, r, s).
#[derive(Debug, Clone)]
pub struct SpatialEri {
    pub n: usize,
    data: Vec<f64>,
}

impl SpatialEri {
    pub fn zeros(n: usize) -> Self {
        SpatialEri {
            n,
            data: vec![0.0; n * n * n * n],
        }
    }

    #[inline]
    pub fn get(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        self.data[((p * self.n + q) * self.n + r) * self.n + s]
    }

    #[inline]
    pub fn set(&mut self, p: usize, q: usize, r: usize, s: usize, value: f64) {
        self.data[((p * self.n + q) * self.n + r) * self.n + s] = value;
    }

    pub fn to_stored(&self) -> StoredTensor {
        StoredTensor {
            dims: vec![self.n, self.n, self.n, self.n],
            data: self.data.clone(),
        }
    }

    pub fn from_stored(tensor: &StoredTensor) -> Result<Self> {
        if tensor.dims.len() != 4 || tensor.dims.iter().any(|&d| d != tensor.dims[0]) {
            return Err(eyre!(
                "expected a hypercubic rank-4 tensor, found dims {:?}",
                tensor.dims
            ));
        }
        Ok(SpatialEri {
            n: tensor.dims[0],
            data: tensor.data.clone(),
        })
    }
}

/// Cholesky vectors L^x_pq, stored flat as [x][p][q].
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyVectors {
    pub nbf: usize,
    data: Vec<f64>,
}

impl CholeskyVectors {
    fn from_raw(nbf: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len() % (nbf * nbf), 0);
        CholeskyVectors { nbf, data }
    }

    pub fn count(&self) -> usize {
        if self.nbf == 0 {
            0
        } else {
            self.data.len() / (self.nbf * self.nbf)
        }
    }

    #[inline]
    pub fn get(&self, x: usize, p: usize, q: usize) -> f64 {
        self.data[(x * self.nbf + p) * self.nbf + q]
    }

    /// One vector as a matrix over (p, q).
    pub fn vector(&self, x: usize) -> DMatrix<f64> {
        let n = self.nbf;
        DMatrix::from_fn(n, n, |p, q| self.get(x, p, q))
    }

    /// Transform every vector to the MO basis: B^x = Cᵀ L^x C.
    pub fn transform(&self, coeffs: &DMatrix<f64>) -> CholeskyVectors {
        let nmo = coeffs.ncols();
        let count = self.count();
        let mut data = vec![0.0; count * nmo * nmo];

        for x in 0..count {
            let transformed = coeffs.transpose() * self.vector(x) * coeffs;
            for p in 0..nmo {
                for q in 0..nmo {
                    data[(x * nmo + p) * nmo + q] = transformed[(p, q)];
                }
            }
        }
        CholeskyVectors::from_raw(nmo, data)
    }

    /// Single integral (pq|rs) = Σ_x L^x_pq L^x_rs.
    pub fn reconstruct(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        let n2 = self.nbf * self.nbf;
        let pq = p * self.nbf + q;
        let rs = r * self.nbf + s;
        (0..self.count())
            .map(|x| self.data[x * n2 + pq] * self.data[x * n2 + rs])
            .sum()
    }

    /// Assemble the full 4-index tensor, the original driver's
    /// full_v2(p, q, r, s) = Σ_x B^x_pq B^x_rs contraction.
    pub fn reconstruct_full(&self) -> SpatialEri {
        let n = self.nbf;
        let n2 = n * n;
        let count = self.count();

        let data: Vec<f64> = (0..n2)
            .into_par_iter()
            .flat_map_iter(|pq| {
                (0..n2).map(move |rs| {
                    (0..count)
                        .map(|x| self.data[x * n2 + pq] * self.data[x * n2 + rs])
                        .sum()
                })
            })
            .collect();

        SpatialEri { n, data }
    }

    pub fn to_stored(&self) -> StoredTensor {
        StoredTensor {
            dims: vec![self.count(), self.nbf, self.nbf],
            data: self.data.clone(),
        }
    }

    pub fn from_stored(tensor: &StoredTensor) -> Result<Self> {
        if tensor.dims.len() != 3 || tensor.dims[1] != tensor.dims[2] {
            return Err(eyre!(
                "expected a [count, nbf, nbf] tensor, found dims {:?}",
                tensor.dims
            ));
        }
        Ok(CholeskyVectors {
            nbf: tensor.dims[1],
            data: tensor.data.clone(),
        })
    }
}

/// Driver for the pivoted decomposition.
pub struct CholeskyEri {
    pub threshold: f64,
    pub max_vectors: Option<usize>,
}

impl CholeskyEri {
    pub fn new(threshold: f64, max_vectors: Option<usize>) -> Self {
        CholeskyEri {
            threshold,
            max_vectors,
        }
    }

    /// Decompose the AO ERI supermatrix over the given basis functions.
    ///
    /// Only the diagonal and one pivot column per iteration are ever
    /// evaluated; the full 4-index tensor is never formed.
    pub fn decompose<Bs>(&self, ao_basis: &[Arc<Bs>]) -> CholeskyVectors
    where
        Bs: Basis + Send + Sync,
    {
        let n = ao_basis.len();
        let n2 = n * n;
        let cap = self.max_vectors.unwrap_or(n2).min(n2);

        info!(
            "Cholesky decomposition: {} basis functions, threshold {:.2e}, max vectors {}",
            n, self.threshold, cap
        );

        // residual diagonal D_pq = (pq|pq) - Σ_x (L^x_pq)²
        let mut diag: Vec<f64> = (0..n2)
            .into_par_iter()
            .map(|pq| {
                let (p, q) = (pq / n, pq % n);
                Bs::JKabcd(&ao_basis[p], &ao_basis[q], &ao_basis[p], &ao_basis[q])
            })
            .collect();

        let mut vectors: Vec<f64> = Vec::new();
        let mut count = 0;

        while count < cap {
            let (pivot, max_diag) = diag
                .iter()
                .copied()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                .unwrap_or((0, 0.0));

            if max_diag <= self.threshold {
                break;
            }

            let (r, s) = (pivot / n, pivot % n);

            // pivot column (pq|rs) over all pq
            let column: Vec<f64> = (0..n2)
                .into_par_iter()
                .map(|pq| {
                    let (p, q) = (pq / n, pq % n);
                    Bs::JKabcd(&ao_basis[p], &ao_basis[q], &ao_basis[r], &ao_basis[s])
                })
                .collect();

            // subtract what the previous vectors already resolve
            let norm = max_diag.sqrt();
            let mut new_vector = vec![0.0; n2];
            for pq in 0..n2 {
                let mut residual = column[pq];
                for x in 0..count {
                    residual -= vectors[x * n2 + pq] * vectors[x * n2 + pivot];
                }
                new_vector[pq] = residual / norm;
            }

            for pq in 0..n2 {
                diag[pq] -= new_vector[pq] * new_vector[pq];
                if diag[pq] < 0.0 {
                    diag[pq] = 0.0;
                }
            }

            vectors.extend_from_slice(&new_vector);
            count += 1;
        }

        info!("Cholesky decomposition finished with {} vectors", count);
        CholeskyVectors::from_raw(n, vectors)
    }
}
