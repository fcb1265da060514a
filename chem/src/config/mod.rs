//! Configuration management for the method drivers.
//!
//! Every section mirrors the YAML input: optional fields that are filled in
//! by `with_defaults()`, plus accessor helpers on `Config` so callers never
//! unwrap options themselves.

mod args;

pub use args::Args;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level configuration for a calculation.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub geometry: Vec<Atom>,
    #[serde(default)]
    pub basis_sets: HashMap<String, String>,
    pub basis_name: Option<String>,
    /// Prefix for restart and FCIDUMP files, e.g. the molecule name.
    pub output_file_prefix: Option<String>,
    pub charge: Option<i32>,
    #[serde(default)]
    pub scf_params: ScfParams,
    pub cholesky: Option<CholeskyParams>,
    pub ccsd: Option<CcsdParams>,
    pub fci: Option<FciParams>,
}

/// Atomic position (Bohr).
#[derive(Debug, Deserialize, Serialize)]
pub struct Atom {
    pub element: String,
    pub coords: [f64; 3],
}

/// SCF-specific parameters.
#[derive(Debug, Deserialize, Serialize)]
pub struct ScfParams {
    pub density_mixing: Option<f64>,
    pub max_cycle: Option<usize>,
    pub diis_subspace_size: Option<usize>,
    pub convergence_threshold: Option<f64>,
}

impl Default for ScfParams {
    fn default() -> Self {
        ScfParams {
            density_mixing: Some(0.5),
            max_cycle: Some(100),
            diis_subspace_size: Some(8),
            convergence_threshold: Some(1e-8),
        }
    }
}

impl ScfParams {
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.density_mixing.is_none() {
            self.density_mixing = defaults.density_mixing;
        }
        if self.max_cycle.is_none() {
            self.max_cycle = defaults.max_cycle;
        }
        if self.diis_subspace_size.is_none() {
            self.diis_subspace_size = defaults.diis_subspace_size;
        }
        if self.convergence_threshold.is_none() {
            self.convergence_threshold = defaults.convergence_threshold;
        }
        self
    }
}

/// Cholesky decomposition of the two-electron integrals.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CholeskyParams {
    /// Diagonal screening threshold; decomposition stops once every
    /// remaining diagonal element is below it.
    pub threshold: Option<f64>,
    /// Hard cap on the number of Cholesky vectors.
    pub max_vectors: Option<usize>,
    /// Persist the MO Fock matrix and Cholesky vectors for restart.
    pub write_restart: Option<bool>,
    /// Reuse restart files when they exist instead of re-decomposing.
    pub read_restart: Option<bool>,
}

impl Default for CholeskyParams {
    fn default() -> Self {
        CholeskyParams {
            threshold: Some(1e-6),
            max_vectors: None,
            write_restart: Some(false),
            read_restart: Some(false),
        }
    }
}

impl CholeskyParams {
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.threshold.is_none() {
            self.threshold = defaults.threshold;
        }
        if self.write_restart.is_none() {
            self.write_restart = defaults.write_restart;
        }
        if self.read_restart.is_none() {
            self.read_restart = defaults.read_restart;
        }
        self
    }
}

/// CCSD calculation parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CcsdParams {
    pub enabled: Option<bool>,
    pub max_iterations: Option<usize>,
    pub convergence_threshold: Option<f64>,
}

impl Default for CcsdParams {
    fn default() -> Self {
        CcsdParams {
            enabled: Some(false),
            max_iterations: Some(60),
            convergence_threshold: Some(1e-7),
        }
    }
}

impl CcsdParams {
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.enabled.is_none() {
            self.enabled = defaults.enabled;
        }
        if self.max_iterations.is_none() {
            self.max_iterations = defaults.max_iterations;
        }
        if self.convergence_threshold.is_none() {
            self.convergence_threshold = defaults.convergence_threshold;
        }
        self
    }
}

/// Full CI parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FciParams {
    pub enabled: Option<bool>,
    /// Run the determinant solver on the generated FCIDUMP file. When
    /// false only the file is produced.
    pub solve: Option<bool>,
    pub nroots: Option<usize>,
    /// Guard on the determinant space the dense solver is allowed to hold.
    pub max_determinants: Option<usize>,
}

impl Default for FciParams {
    fn default() -> Self {
        FciParams {
            enabled: Some(false),
            solve: Some(true),
            nroots: Some(1),
            max_determinants: Some(2000),
        }
    }
}

impl FciParams {
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.enabled.is_none() {
            self.enabled = defaults.enabled;
        }
        if self.solve.is_none() {
            self.solve = defaults.solve;
        }
        if self.nroots.is_none() {
            self.nroots = defaults.nroots;
        }
        if self.max_determinants.is_none() {
            self.max_determinants = defaults.max_determinants;
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections.
    pub fn with_defaults(mut self) -> Self {
        self.scf_params = self.scf_params.with_defaults();
        if let Some(cholesky) = self.cholesky.take() {
            self.cholesky = Some(cholesky.with_defaults());
        }
        if let Some(ccsd) = self.ccsd.take() {
            self.ccsd = Some(ccsd.with_defaults());
        }
        if let Some(fci) = self.fci.take() {
            self.fci = Some(fci.with_defaults());
        }
        self
    }

    pub fn charge(&self) -> i32 {
        self.charge.unwrap_or(0)
    }

    pub fn basis_name(&self) -> String {
        self.basis_name
            .clone()
            .unwrap_or_else(|| "sto-3g".to_string())
    }

    pub fn output_file_prefix(&self) -> String {
        self.output_file_prefix
            .clone()
            .unwrap_or_else(|| "chem".to_string())
    }

    pub fn is_diis_enabled(&self) -> bool {
        self.scf_params.diis_subspace_size.unwrap_or(0) > 0
    }

    pub fn cholesky_threshold(&self) -> f64 {
        self.cholesky
            .as_ref()
            .and_then(|c| c.threshold)
            .unwrap_or(1e-6)
    }

    pub fn cholesky_max_vectors(&self) -> Option<usize> {
        self.cholesky.as_ref().and_then(|c| c.max_vectors)
    }

    pub fn cholesky_write_restart(&self) -> bool {
        self.cholesky
            .as_ref()
            .and_then(|c| c.write_restart)
            .unwrap_or(false)
    }

    pub fn cholesky_read_restart(&self) -> bool {
        self.cholesky
            .as_ref()
            .and_then(|c| c.read_restart)
            .unwrap_or(false)
    }

    pub fn is_ccsd_enabled(&self) -> bool {
        self.ccsd.as_ref().and_then(|c| c.enabled).unwrap_or(false)
    }

    pub fn ccsd_max_iterations(&self) -> usize {
        self.ccsd
            .as_ref()
            .and_then(|c| c.max_iterations)
            .unwrap_or(60)
    }

    pub fn ccsd_convergence_threshold(&self) -> f64 {
        self.ccsd
            .as_ref()
            .and_then(|c| c.convergence_threshold)
            .unwrap_or(1e-7)
    }

    pub fn is_fci_enabled(&self) -> bool {
        self.fci.as_ref().and_then(|f| f.enabled).unwrap_or(false)
    }

    pub fn fci_solve(&self) -> bool {
        self.fci.as_ref().and_then(|f| f.solve).unwrap_or(true)
    }

    pub fn fci_nroots(&self) -> usize {
        self.fci.as_ref().and_then(|f| f.nroots).unwrap_or(1)
    }

    pub fn fci_max_determinants(&self) -> usize {
        self.fci
            .as_ref()
            .and_then(|f| f.max_determinants)
            .unwrap_or(2000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let yaml = r#"
geometry:
  - element: H
    coords: [0.0, 0.0, 0.0]
  - element: H
    coords: [0.0, 0.0, 1.4]
basis_name: sto-3g
scf_params:
  max_cycle: 42
fci:
  enabled: true
"#;
        let config: Config = serde_yml::from_str::<Config>(yaml).unwrap().with_defaults();
        assert_eq!(config.scf_params.max_cycle, Some(42));
        assert_eq!(config.scf_params.density_mixing, Some(0.5));
        assert!(config.is_fci_enabled());
        assert!(config.fci_solve());
        assert!(!config.is_ccsd_enabled());
        assert_eq!(config.fci_nroots(), 1);
        assert_eq!(config.basis_name(), "sto-3g");
        assert_eq!(config.charge(), 0);
    }

    #[test]
    fn cholesky_restart_flags_default_off() {
        let yaml = r#"
geometry:
  - element: H
    coords: [0.0, 0.0, 0.0]
cholesky:
  threshold: 1.0e-8
"#;
        let config: Config = serde_yml::from_str::<Config>(yaml).unwrap().with_defaults();
        assert_eq!(config.cholesky_threshold(), 1e-8);
        assert!(!config.cholesky_write_restart());
        assert!(!config.cholesky_read_restart());
        assert_eq!(config.cholesky_max_vectors(), None);
    }
}
