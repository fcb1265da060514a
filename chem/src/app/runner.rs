use crate::app::workspace::{CalculationWorkspace, FileLayout};
use crate::config::{Args, Config};
use crate::io::{write_to_disk, StoredTensor};
use crate::scf_impl::{SimpleSCF, SCF};
use ::basis::cgto::NwchemBasis;
use color_eyre::eyre::Result;
use tracing::info;

/// Run the restricted SCF stage and persist the core Hamiltonian for the
/// downstream FCIDUMP generation.
pub fn run_restricted(
    workspace: &CalculationWorkspace<NwchemBasis>,
    args: &Args,
    config: &Config,
    layout: &FileLayout,
) -> Result<SimpleSCF<NwchemBasis>> {
    let mut scf = SimpleSCF::<NwchemBasis>::new();
    configure(&mut scf, args, config);

    info!("Initializing SCF calculation...");
    scf.init_basis(&workspace.elements, workspace.basis_map());
    scf.init_geometry(&workspace.coords, &workspace.elements);
    scf.init_density_matrix();
    scf.init_fock_matrix();

    info!("Starting SCF cycle...");
    scf.scf_cycle();

    layout.ensure_scf_dir()?;
    write_to_disk(layout.hcore_file(), &StoredTensor::from_matrix(&scf.h_core))?;
    info!("Core Hamiltonian written to {}", layout.hcore_file().display());

    Ok(scf)
}

fn configure(scf: &mut SimpleSCF<NwchemBasis>, args: &Args, config: &Config) {
    scf.density_mixing = args
        .density_mixing
        .or(config.scf_params.density_mixing)
        .unwrap_or(scf.density_mixing);
    scf.max_cycle = args
        .max_cycle
        .or(config.scf_params.max_cycle)
        .unwrap_or(scf.max_cycle);
    let convergence = args
        .convergence_threshold
        .or(config.scf_params.convergence_threshold)
        .unwrap_or(scf.convergence_threshold);
    scf.set_convergence_threshold(convergence);
    scf.set_charge(args.charge.or(config.charge).unwrap_or(0));

    if let Some(diis_size) = resolve_diis_size(args, config) {
        info!("Enabling DIIS acceleration with subspace size {}", diis_size);
        scf.enable_diis(diis_size);
    } else {
        info!("DIIS acceleration disabled");
    }
}

fn resolve_diis_size(args: &Args, config: &Config) -> Option<usize> {
    let size = args
        .diis_subspace_size
        .or(config.scf_params.diis_subspace_size)
        .unwrap_or(0);
    if size > 0 {
        Some(size)
    } else {
        None
    }
}
