use super::{align_eigenvectors, SimpleSCF, DIIS, SCF};
use basis::cgto::NwchemBasis;
use nalgebra::{DMatrix, Vector3};
use periodic_table_on_an_enum::Element;
use std::collections::HashMap;

const STO3G_H: &str = r#"
H    S
      3.42525091             0.15432897
      0.62391373             0.53532814
      0.16885540             0.44463454
"#;

fn h2_scf(bond_length: f64) -> SimpleSCF<NwchemBasis> {
    let h_basis = NwchemBasis::parse_nwchem("sto-3g", STO3G_H).unwrap();
    let elems = vec![
        Element::from_symbol("H").unwrap(),
        Element::from_symbol("H").unwrap(),
    ];
    let coords = vec![
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(0.0, 0.0, bond_length),
    ];

    let mut basis_map: HashMap<&str, &NwchemBasis> = HashMap::new();
    let leaked: &'static NwchemBasis = Box::leak(Box::new(h_basis));
    basis_map.insert("H", leaked);

    let mut scf = SimpleSCF::<NwchemBasis>::new();
    scf.init_basis(&elems, basis_map);
    scf.init_geometry(&coords, &elems);
    scf.init_density_matrix();
    scf.init_fock_matrix();
    scf
}

#[test]
fn h2_sto3g_ground_state_energy() {
    let mut scf = h2_scf(1.4);
    scf.scf_cycle();

    assert!(scf.is_converged(), "H2/STO-3G should converge");
    let energy = scf.calculate_total_energy();
    // Szabo & Ostlund give -1.1167 Eh for H2/STO-3G at R = 1.4 a0
    assert!(
        (energy + 1.1167).abs() < 0.05,
        "H2 energy {} deviates from reference",
        energy
    );
}

#[test]
fn h2_occupation_and_electron_count() {
    let scf = h2_scf(1.4);
    assert_eq!(scf.num_electrons(), 2);
    assert_eq!(scf.num_occupied(), 1);
    assert_eq!(scf.num_basis, 2);

    let mut cation = h2_scf(1.4);
    cation.set_charge(2);
    assert_eq!(cation.num_electrons(), 0);
    assert_eq!(cation.num_occupied(), 0);
}

#[test]
fn nuclear_repulsion_of_h2() {
    let scf = h2_scf(1.4);
    assert!((scf.nuclear_repulsion() - 1.0 / 1.4).abs() < 1e-12);
}

#[test]
fn scf_with_diis_matches_plain_scf() {
    let mut plain = h2_scf(1.4);
    plain.scf_cycle();

    let mut accelerated = h2_scf(1.4);
    accelerated.enable_diis(8);
    accelerated.scf_cycle();

    let e_plain = plain.calculate_total_energy();
    let e_diis = accelerated.calculate_total_energy();
    assert!(
        (e_plain - e_diis).abs() < 1e-6,
        "plain {} vs DIIS {}",
        e_plain,
        e_diis
    );
}

#[test]
fn mo_fock_matrix_is_diagonal_after_convergence() {
    let mut scf = h2_scf(1.4);
    scf.scf_cycle();

    let f_mo = scf.mo_fock_matrix();
    for i in 0..scf.num_basis {
        assert!(
            (f_mo[(i, i)] - scf.e_level[i]).abs() < 1e-5,
            "diagonal {} vs orbital energy {}",
            f_mo[(i, i)],
            scf.e_level[i]
        );
        for j in 0..scf.num_basis {
            if i != j {
                assert!(f_mo[(i, j)].abs() < 1e-5, "off-diagonal {}", f_mo[(i, j)]);
            }
        }
    }
}

#[test]
fn diis_single_entry_extrapolates_to_itself() {
    let mut diis = DIIS::new(4);
    let fock = DMatrix::from_row_slice(2, 2, &[1.0, 0.2, 0.2, -0.5]);
    let density = DMatrix::identity(2, 2);
    let overlap = DMatrix::identity(2, 2);

    diis.update(fock.clone(), &density, &overlap);
    let extrapolated = diis.extrapolate().unwrap();
    assert!((extrapolated - fock).norm() < 1e-12);
}

#[test]
fn diis_error_vanishes_for_commuting_matrices() {
    let diis = DIIS::new(4);
    let fock = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 2.0]);
    let density = DMatrix::from_row_slice(2, 2, &[0.3, 0.0, 0.0, 0.7]);
    let overlap = DMatrix::identity(2, 2);

    let error = diis.calculate_error_matrix(&fock, &density, &overlap);
    assert!(error.norm() < 1e-14);
}

#[test]
fn diis_subspace_is_bounded() {
    let mut diis = DIIS::new(2);
    let density = DMatrix::identity(2, 2);
    let overlap = DMatrix::identity(2, 2);
    for k in 0..5 {
        let fock = DMatrix::from_row_slice(2, 2, &[k as f64, 0.1, 0.1, -(k as f64)]);
        diis.update(fock, &density, &overlap);
    }
    assert_eq!(diis.len(), 2);
}

#[test]
fn eigenvector_alignment_flips_negative_columns() {
    let vecs = DMatrix::from_row_slice(2, 2, &[-0.9, 0.3, 0.1, 0.8]);
    let aligned = align_eigenvectors(vecs);
    assert!(aligned[(0, 0)] > 0.0);
    assert!(aligned[(1, 1)] > 0.0);
}
