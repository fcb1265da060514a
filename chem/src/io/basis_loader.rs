//! Basis set loading.
//!
//! Looks for NWChem-format files in a local basis directory first
//! (`<dir>/<basis>.<symbol>.nwchem`), then falls back to the Basis Set
//! Exchange REST API.

use basis::cgto::NwchemBasis;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_BASIS_DIRS: &[&str] = &["basis_sets", "tests/basis_sets"];

fn local_candidates(basis_dir: Option<&str>, basis_name: &str, symbol: &str) -> Vec<PathBuf> {
    let file = format!(
        "{}.{}.nwchem",
        basis_name.to_lowercase(),
        symbol.to_lowercase()
    );
    basis_dir
        .into_iter()
        .chain(DEFAULT_BASIS_DIRS.iter().copied())
        .map(|dir| Path::new(dir).join(&file))
        .collect()
}

/// Fetch one element's basis from a local basis directory or the Basis Set
/// Exchange.
pub fn fetch_basis(
    atomic_symbol: &str,
    basis_name: &str,
    basis_dir: Option<&str>,
) -> Result<NwchemBasis> {
    for candidate in local_candidates(basis_dir, basis_name, atomic_symbol) {
        if candidate.exists() {
            info!(
                "Loading {} basis for {} from {}",
                basis_name,
                atomic_symbol,
                candidate.display()
            );
            let text = fs::read_to_string(&candidate).wrap_err_with(|| {
                format!("Failed to read basis set file: {}", candidate.display())
            })?;
            return NwchemBasis::parse_nwchem(basis_name, &text).wrap_err_with(|| {
                format!("Failed to parse basis set file: {}", candidate.display())
            });
        }
    }

    let url = format!(
        "https://www.basissetexchange.org/api/basis/{}/format/nwchem?elements={}",
        basis_name, atomic_symbol
    );
    info!(
        "No local basis file found, fetching {} for {} from the Basis Set Exchange",
        basis_name, atomic_symbol
    );
    let response = reqwest::blocking::get(&url)
        .wrap_err_with(|| format!("Failed to fetch basis set for {}", atomic_symbol))?;
    let text = response
        .text()
        .wrap_err("Failed to read response from the basis set API")?;
    NwchemBasis::parse_nwchem(basis_name, &text)
        .wrap_err_with(|| format!("Failed to parse basis set response for {}", atomic_symbol))
}
