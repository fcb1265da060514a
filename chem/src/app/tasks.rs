//! Follow-up method drivers: Cholesky decomposition with restart, CCSD,
//! FCIDUMP generation, and the determinant FCI solver.

use crate::app::report::report_fci_summary;
use crate::app::workspace::FileLayout;
use crate::ccsd_impl::Ccsd;
use crate::cholesky_impl::{CholeskyEri, CholeskyVectors, SpatialEri};
use crate::config::{Args, Config};
use crate::fci_impl::FullCi;
use crate::fcidump::write_fcidump;
use crate::io::{read_count_file, read_from_disk, write_count_file, write_to_disk, StoredTensor};
use crate::scf_impl::{SimpleSCF, SCF};
use ::basis::cgto::NwchemBasis;
use color_eyre::eyre::{eyre, Result};
use nalgebra::{DMatrix, DVector};
use std::path::PathBuf;
use tracing::info;

pub fn run_followups(
    scf: &SimpleSCF<NwchemBasis>,
    args: &Args,
    config: &Config,
    layout: &FileLayout,
) -> Result<()> {
    if !config.is_ccsd_enabled() && !config.is_fci_enabled() {
        return Ok(());
    }

    let (f1_mo, cholesky_mo) = ensure_cholesky(scf, args, config, layout)?;

    if config.is_ccsd_enabled() {
        run_ccsd(scf, config, &f1_mo, &cholesky_mo);
    }

    if config.is_fci_enabled() {
        run_fci(scf, args, config, layout, &cholesky_mo)?;
    }

    Ok(())
}

/// Produce the MO Fock matrix and MO-basis Cholesky vectors, reading the
/// restart files when asked to (and they exist), writing them when asked.
pub fn ensure_cholesky(
    scf: &SimpleSCF<NwchemBasis>,
    args: &Args,
    config: &Config,
    layout: &FileLayout,
) -> Result<(DMatrix<f64>, CholeskyVectors)> {
    let read_restart = args.read_restart || config.cholesky_read_restart();
    let write_restart = args.write_restart || config.cholesky_write_restart();

    let f1_file = layout.f1_file();
    let v2_file = layout.v2_file();
    let restart = read_restart && f1_file.exists() && v2_file.exists();

    if restart {
        info!(
            "Restarting from {} and {}",
            f1_file.display(),
            v2_file.display()
        );
        let f1_mo = read_from_disk(&f1_file)?.to_matrix()?;
        let vectors = CholeskyVectors::from_stored(&read_from_disk(&v2_file)?)?;
        let recorded = read_count_file(layout.chol_count_file())?;
        if recorded != vectors.count() {
            return Err(eyre!(
                "Cholesky restart is inconsistent: count file says {}, tensor holds {}",
                recorded,
                vectors.count()
            ));
        }
        info!("Restored {} Cholesky vectors", vectors.count());
        return Ok((f1_mo, vectors));
    }

    let decomposer = CholeskyEri::new(config.cholesky_threshold(), config.cholesky_max_vectors());
    let ao_vectors = decomposer.decompose(scf.get_mo_basis());
    let mo_vectors = ao_vectors.transform(&scf.coeffs);
    let f1_mo = scf.mo_fock_matrix();

    if write_restart {
        write_to_disk(&f1_file, &StoredTensor::from_matrix(&f1_mo))?;
        write_to_disk(&v2_file, &mo_vectors.to_stored())?;
        write_count_file(layout.chol_count_file(), mo_vectors.count())?;
        info!(
            "Cholesky restart files written under {}",
            layout.files_dir().display()
        );
    }

    Ok((f1_mo, mo_vectors))
}

fn run_ccsd(
    scf: &SimpleSCF<NwchemBasis>,
    config: &Config,
    f1_mo: &DMatrix<f64>,
    cholesky_mo: &CholeskyVectors,
) {
    info!("===========================================");
    info!("       Starting CCSD Calculation");
    info!("===========================================");

    // orbital energies from the (possibly restarted) MO Fock matrix
    let orbital_energies = DVector::from_fn(f1_mo.nrows(), |p, _| f1_mo[(p, p)]);

    let mut ccsd = Ccsd::from_cholesky(
        &orbital_energies,
        cholesky_mo,
        scf.num_occupied(),
        config.ccsd_max_iterations(),
        config.ccsd_convergence_threshold(),
    );
    ccsd.solve();
    ccsd.print_summary(scf.calculate_total_energy());

    let t1_diag = ccsd.t1_diagnostic();
    info!("T1 diagnostic: {:.6}", t1_diag);
    if t1_diag > 0.02 {
        info!("WARNING: T1 diagnostic > 0.02 suggests multireference character");
    }
}

/// Transform the stored core Hamiltonian to the MO basis and write the
/// FCIDUMP file; returns its path.
pub fn generate_fcidump(
    scf: &SimpleSCF<NwchemBasis>,
    layout: &FileLayout,
    full_v2: &SpatialEri,
) -> Result<PathBuf> {
    let hcore = read_from_disk(layout.hcore_file())?.to_matrix()?;
    let hcore_mo = scf.coeffs.transpose() * hcore * &scf.coeffs;

    layout.ensure_fci_dir()?;
    let path = layout.fcidump_file();
    write_fcidump(
        &path,
        &hcore_mo,
        full_v2,
        scf.num_electrons(),
        0,
        scf.nuclear_repulsion(),
    )?;
    Ok(path)
}

fn run_fci(
    scf: &SimpleSCF<NwchemBasis>,
    args: &Args,
    config: &Config,
    layout: &FileLayout,
    cholesky_mo: &CholeskyVectors,
) -> Result<()> {
    info!("===========================================");
    info!("       Starting FCI Calculation");
    info!("===========================================");
    info!(
        "#occupied, #virtual = {}, {}",
        scf.num_occupied(),
        scf.num_basis - scf.num_occupied()
    );

    let full_v2 = cholesky_mo.reconstruct_full();
    let path = generate_fcidump(scf, layout, &full_v2)?;
    info!("FCIDUMP written to {}", path.display());

    if args.fcidump_only || !config.fci_solve() {
        info!("Skipping the determinant solver");
        return Ok(());
    }

    let fci = FullCi::from_fcidump(&path)?;
    let dimension = fci.dimension();
    let guard = config.fci_max_determinants();
    if dimension > guard {
        return Err(eyre!(
            "FCI space has {} determinants, above the configured limit of {}; \
             raise fci.max_determinants to force the dense solver",
            dimension,
            guard
        ));
    }

    let roots = fci.solve(config.fci_nroots());
    report_fci_summary(scf.calculate_total_energy(), &roots);
    Ok(())
}
