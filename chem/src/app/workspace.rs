use crate::app::basis::BasisMap;
use ::basis::basis::AOBasis;
use color_eyre::eyre::{Result, WrapErr};
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use std::fs;
use std::path::PathBuf;

/// In-memory representation of everything needed to run a calculation.
#[derive(Clone)]
pub struct CalculationWorkspace<B: AOBasis + 'static> {
    pub elements: Vec<Element>,
    pub coords: Vec<Vector3<f64>>,
    pub basis: BasisMap<B>,
}

impl<B: AOBasis> CalculationWorkspace<B> {
    pub fn new(elements: Vec<Element>, coords: Vec<Vector3<f64>>, basis: BasisMap<B>) -> Self {
        Self {
            elements,
            coords,
            basis,
        }
    }

    pub fn basis_map(&self) -> BasisMap<B> {
        self.basis.clone()
    }
}

/// On-disk layout of restart and FCIDUMP files:
///
/// ```text
/// <prefix>.<basis>_files/restricted/
///     scf/<prefix>.<basis>.hcore
///     <prefix>.<basis>.f1_mo
///     <prefix>.<basis>.cholv2
///     <prefix>.<basis>.cholcount
///     fci/<prefix>.<basis>.fcidump
/// ```
#[derive(Debug, Clone)]
pub struct FileLayout {
    out_fp: String,
    files_dir: PathBuf,
}

impl FileLayout {
    pub fn new(prefix: &str, basis_name: &str) -> Self {
        Self::rooted(&PathBuf::new(), prefix, basis_name)
    }

    /// Layout under an explicit root directory instead of the working
    /// directory.
    pub fn rooted(root: &std::path::Path, prefix: &str, basis_name: &str) -> Self {
        let out_fp = format!("{}.{}", prefix, basis_name);
        let files_dir = root
            .join(format!("{}_files", out_fp))
            .join("restricted");
        FileLayout { out_fp, files_dir }
    }

    pub fn files_dir(&self) -> &PathBuf {
        &self.files_dir
    }

    pub fn scf_dir(&self) -> PathBuf {
        self.files_dir.join("scf")
    }

    pub fn fci_dir(&self) -> PathBuf {
        self.files_dir.join("fci")
    }

    pub fn hcore_file(&self) -> PathBuf {
        self.scf_dir().join(format!("{}.hcore", self.out_fp))
    }

    pub fn f1_file(&self) -> PathBuf {
        self.files_dir.join(format!("{}.f1_mo", self.out_fp))
    }

    pub fn v2_file(&self) -> PathBuf {
        self.files_dir.join(format!("{}.cholv2", self.out_fp))
    }

    pub fn chol_count_file(&self) -> PathBuf {
        self.files_dir.join(format!("{}.cholcount", self.out_fp))
    }

    pub fn fcidump_file(&self) -> PathBuf {
        self.fci_dir().join(format!("{}.fcidump", self.out_fp))
    }

    pub fn ensure_scf_dir(&self) -> Result<()> {
        fs::create_dir_all(self.scf_dir())
            .wrap_err_with(|| format!("Failed to create {}", self.scf_dir().display()))
    }

    pub fn ensure_fci_dir(&self) -> Result<()> {
        fs::create_dir_all(self.fci_dir())
            .wrap_err_with(|| format!("Failed to create {}", self.fci_dir().display()))
    }
}

#[cfg(test)]
mod tests {
    use super::FileLayout;

    #[test]
    fn file_layout_paths() {
        let layout = FileLayout::new("h2o", "sto-3g");
        assert_eq!(
            layout.hcore_file().to_str().unwrap(),
            "h2o.sto-3g_files/restricted/scf/h2o.sto-3g.hcore"
        );
        assert_eq!(
            layout.f1_file().to_str().unwrap(),
            "h2o.sto-3g_files/restricted/h2o.sto-3g.f1_mo"
        );
        assert_eq!(
            layout.v2_file().to_str().unwrap(),
            "h2o.sto-3g_files/restricted/h2o.sto-3g.cholv2"
        );
        assert_eq!(
            layout.fcidump_file().to_str().unwrap(),
            "h2o.sto-3g_files/restricted/fci/h2o.sto-3g.fcidump"
        );
    }
}
