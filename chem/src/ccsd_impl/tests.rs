use super::Ccsd;
use crate::cholesky_impl::CholeskyEri;
use crate::fci_impl::FullCi;
use crate::scf_impl::{SimpleSCF, SCF};
use basis::cgto::NwchemBasis;
use nalgebra::{DVector, Vector3};
use periodic_table_on_an_enum::Element;
use std::collections::HashMap;

const STO3G_H: &str = r#"
H    S
      3.42525091             0.15432897
      0.62391373             0.53532814
      0.16885540             0.44463454
"#;

fn converged_h2() -> SimpleSCF<NwchemBasis> {
    let h_basis = NwchemBasis::parse_nwchem("sto-3g", STO3G_H).unwrap();
    let elems = vec![
        Element::from_symbol("H").unwrap(),
        Element::from_symbol("H").unwrap(),
    ];
    let coords = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.4)];

    let mut basis_map: HashMap<&str, &NwchemBasis> = HashMap::new();
    basis_map.insert("H", Box::leak(Box::new(h_basis)));

    let mut scf = SimpleSCF::<NwchemBasis>::new();
    scf.init_basis(&elems, basis_map);
    scf.init_geometry(&coords, &elems);
    scf.init_density_matrix();
    scf.init_fock_matrix();
    scf.scf_cycle();
    assert!(scf.is_converged());
    scf
}

fn h2_mo_integrals(
    scf: &SimpleSCF<NwchemBasis>,
) -> (DVector<f64>, crate::cholesky_impl::SpatialEri) {
    let vectors = CholeskyEri::new(1e-10, None).decompose(scf.get_mo_basis());
    let mo_vectors = vectors.transform(&scf.coeffs);
    (scf.e_level.clone(), mo_vectors.reconstruct_full())
}

#[test]
fn dimensions_and_initial_amplitudes() {
    let scf = converged_h2();
    let (energies, eri) = h2_mo_integrals(&scf);
    let ccsd = Ccsd::new(&energies, &eri, scf.num_occupied(), 50, 1e-8);

    assert_eq!(ccsd.nso, 4);
    assert_eq!(ccsd.no, 2);
    assert_eq!(ccsd.nv, 2);
    assert!(ccsd.t1.iter().all(|&x| x == 0.0));
    assert!(ccsd.t2.iter().all(|&x| x == 0.0));
    assert!(ccsd.correlation_energy.is_none());
}

#[test]
fn mp2_guess_energy_is_negative() {
    let scf = converged_h2();
    let (energies, eri) = h2_mo_integrals(&scf);
    let mut ccsd = Ccsd::new(&energies, &eri, scf.num_occupied(), 50, 1e-8);

    let mp2 = ccsd.initialize_mp2();
    assert!(mp2 < 0.0, "MP2 correlation energy {} should be negative", mp2);
    assert!(mp2 > -0.1, "MP2 correlation energy {} is implausibly large", mp2);
}

#[test]
fn ccsd_recovers_fci_for_two_electrons() {
    // For a two-electron system CCSD is exact, so the correlation energy
    // must match full CI to tight tolerance.
    let scf = converged_h2();
    let (energies, eri) = h2_mo_integrals(&scf);
    let nocc = scf.num_occupied();

    let mut ccsd = Ccsd::new(&energies, &eri, nocc, 100, 1e-10);
    let ccsd_corr = ccsd.solve();

    let hf_energy = scf.calculate_total_energy();
    let h1 = scf.coeffs.transpose() * &scf.h_core * &scf.coeffs;
    let fci = FullCi::new(h1, eri, 1, 1, scf.nuclear_repulsion());
    let fci_energy = fci.solve(1)[0];
    let fci_corr = fci_energy - hf_energy;

    assert!(
        (ccsd_corr - fci_corr).abs() < 1e-6,
        "CCSD {} vs FCI {} correlation",
        ccsd_corr,
        fci_corr
    );
    assert!(ccsd.get_correlation_energy().is_some());
}

#[test]
fn t1_diagnostic_is_small_for_h2() {
    let scf = converged_h2();
    let (energies, eri) = h2_mo_integrals(&scf);
    let mut ccsd = Ccsd::new(&energies, &eri, scf.num_occupied(), 100, 1e-9);
    ccsd.solve();

    // closed-shell H2 at equilibrium is thoroughly single-reference
    assert!(ccsd.t1_diagnostic() < 0.02);
}
