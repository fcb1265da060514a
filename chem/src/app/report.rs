use crate::scf_impl::SimpleSCF;
use crate::scf_impl::SCF;
use ::basis::cgto::NwchemBasis;
use tracing::info;

pub fn report_scf_summary(scf: &SimpleSCF<NwchemBasis>) {
    info!("SCF calculation finished.");

    info!("Final Energy Levels:");
    for (i, energy) in scf.e_level.iter().enumerate() {
        let occupation = if i < scf.num_occupied() { 2 } else { 0 };
        info!(
            "  Level {:>3} (occ {}): {:.8} au",
            i + 1,
            occupation,
            energy
        );
    }

    info!("Nuclear repulsion:         {:.10} au", scf.nuclear_repulsion());
    info!(
        "Hartree-Fock Total Energy: {:.10} au",
        scf.calculate_total_energy()
    );
}

pub fn report_fci_summary(hf_energy: f64, roots: &[f64]) {
    info!("===========================================");
    info!("        FCI Results Summary");
    info!("===========================================");
    info!("Hartree-Fock energy:   {:.10} au", hf_energy);
    for (i, &energy) in roots.iter().enumerate() {
        if i == 0 {
            info!(
                "Root {:>2}: {:.10} au (correlation {:.10} au)",
                i,
                energy,
                energy - hf_energy
            );
        } else {
            info!(
                "Root {:>2}: {:.10} au (excitation {:.6} au)",
                i,
                energy,
                energy - roots[0]
            );
        }
    }
    info!("===========================================");
}
