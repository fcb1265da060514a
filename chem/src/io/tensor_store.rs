//! Restart tensors on disk.
//!
//! Intermediate tensors (the MO Fock matrix, the Cholesky vectors, the SCF
//! core Hamiltonian) are written between method stages so a later run can
//! pick up without redoing the decomposition. Tensors are stored as a
//! dimensioned flat array, pickled with serde-pickle.

use color_eyre::eyre::{eyre, Result, WrapErr};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A dense tensor of arbitrary rank, row-major.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredTensor {
    pub dims: Vec<usize>,
    pub data: Vec<f64>,
}

impl StoredTensor {
    pub fn new(dims: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let expected: usize = dims.iter().product();
        if expected != data.len() {
            return Err(eyre!(
                "tensor data length {} does not match dims {:?}",
                data.len(),
                dims
            ));
        }
        Ok(StoredTensor { dims, data })
    }

    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        let mut data = Vec::with_capacity(matrix.nrows() * matrix.ncols());
        for i in 0..matrix.nrows() {
            for j in 0..matrix.ncols() {
                data.push(matrix[(i, j)]);
            }
        }
        StoredTensor {
            dims: vec![matrix.nrows(), matrix.ncols()],
            data,
        }
    }

    pub fn to_matrix(&self) -> Result<DMatrix<f64>> {
        if self.dims.len() != 2 {
            return Err(eyre!("expected a rank-2 tensor, found dims {:?}", self.dims));
        }
        let (rows, cols) = (self.dims[0], self.dims[1]);
        Ok(DMatrix::from_fn(rows, cols, |i, j| self.data[i * cols + j]))
    }
}

/// Pickle a tensor to `path`.
pub fn write_to_disk<P: AsRef<Path>>(path: P, tensor: &StoredTensor) -> Result<()> {
    let bytes = serde_pickle::to_vec(tensor, serde_pickle::SerOptions::new())
        .wrap_err("Failed to serialize restart tensor")?;
    fs::write(path.as_ref(), bytes)
        .wrap_err_with(|| format!("Failed to write tensor file: {}", path.as_ref().display()))
}

/// Read a pickled tensor back from `path`.
pub fn read_from_disk<P: AsRef<Path>>(path: P) -> Result<StoredTensor> {
    let bytes = fs::read(path.as_ref())
        .wrap_err_with(|| format!("Failed to read tensor file: {}", path.as_ref().display()))?;
    serde_pickle::from_slice(&bytes, serde_pickle::DeOptions::new())
        .wrap_err_with(|| format!("Corrupt tensor file: {}", path.as_ref().display()))
}

/// Plain-text count file (one integer), used for the Cholesky vector count.
pub fn write_count_file<P: AsRef<Path>>(path: P, count: usize) -> Result<()> {
    fs::write(path.as_ref(), format!("{}\n", count))
        .wrap_err_with(|| format!("Failed to write count file: {}", path.as_ref().display()))
}

pub fn read_count_file<P: AsRef<Path>>(path: P) -> Result<usize> {
    let text = fs::read_to_string(path.as_ref())
        .wrap_err_with(|| format!("Failed to read count file: {}", path.as_ref().display()))?;
    text.trim()
        .parse::<usize>()
        .wrap_err_with(|| format!("Malformed count file: {}", path.as_ref().display()))
}
