//! Electronic-structure method drivers: restricted Hartree-Fock, Cholesky
//! decomposition of the two-electron integrals, CCSD, full CI, and FCIDUMP
//! generation, sequenced by the application layer in `app`.

pub mod app;
pub mod ccsd_impl;
pub mod cholesky_impl;
pub mod config;
pub mod fci_impl;
pub mod fcidump;
pub mod io;
pub mod scf_impl;

pub use ccsd_impl::Ccsd;
pub use cholesky_impl::{CholeskyEri, CholeskyVectors, SpatialEri};
pub use fci_impl::{Determinant, FullCi};
pub use scf_impl::{SimpleSCF, DIIS, SCF};
