use super::{CholeskyEri, CholeskyVectors};
use basis::basis::Basis;
use basis::cgto::NwchemBasis;
use basis::gto::Gto;
use nalgebra::{DMatrix, Vector3};
use std::sync::Arc;

const STO3G_H: &str = r#"
H    S
      3.42525091             0.15432897
      0.62391373             0.53532814
      0.16885540             0.44463454
"#;

/// Four s-type primitives spread along the z axis: a small but nontrivial
/// ERI supermatrix for the decomposition to chew on.
fn primitive_chain() -> Vec<Arc<Gto>> {
    [0.0, 0.9, 1.7, 2.8]
        .iter()
        .enumerate()
        .map(|(i, &z)| {
            let alpha = 0.6 + 0.3 * i as f64;
            Arc::new(Gto::new(
                alpha,
                Vector3::new(0, 0, 0),
                Vector3::new(0.0, 0.0, z),
            ))
        })
        .collect()
}

fn h2_shells() -> Vec<Arc<basis::cgto::ContractedGto>> {
    let mut left = NwchemBasis::parse_nwchem("sto-3g", STO3G_H).unwrap();
    let mut right = left.clone();
    use basis::basis::AOBasis;
    left.set_center(Vector3::new(0.0, 0.0, 0.0));
    right.set_center(Vector3::new(0.0, 0.0, 1.4));
    let mut shells = left.get_basis();
    shells.extend(right.get_basis());
    shells
}

#[test]
fn reconstruction_error_is_bounded_by_threshold() {
    let ao = primitive_chain();
    let threshold = 1e-8;
    let vectors = CholeskyEri::new(threshold, None).decompose(&ao);

    let n = ao.len();
    for p in 0..n {
        for q in 0..n {
            for r in 0..n {
                for s in 0..n {
                    let exact = Gto::JKabcd(&ao[p], &ao[q], &ao[r], &ao[s]);
                    let approx = vectors.reconstruct(p, q, r, s);
                    // off-diagonal errors are bounded by the residual
                    // diagonal through Cauchy-Schwarz
                    assert!(
                        (exact - approx).abs() < 1e-6,
                        "({} {}|{} {}): exact {} approx {}",
                        p,
                        q,
                        r,
                        s,
                        exact,
                        approx
                    );
                }
            }
        }
    }
}

#[test]
fn vector_count_is_capped() {
    let ao = primitive_chain();
    let vectors = CholeskyEri::new(1e-12, Some(3)).decompose(&ao);
    assert_eq!(vectors.count(), 3);
}

#[test]
fn loose_threshold_needs_fewer_vectors() {
    let ao = primitive_chain();
    let tight = CholeskyEri::new(1e-10, None).decompose(&ao);
    let loose = CholeskyEri::new(1e-2, None).decompose(&ao);
    assert!(loose.count() < tight.count());
    assert!(tight.count() <= ao.len() * ao.len());
}

#[test]
fn contracted_h2_decomposition_reconstructs_integrals() {
    use basis::cgto::ContractedGto;
    let shells = h2_shells();
    let vectors = CholeskyEri::new(1e-8, None).decompose(&shells);

    let n = shells.len();
    for p in 0..n {
        for q in 0..n {
            let exact = ContractedGto::JKabcd(&shells[p], &shells[q], &shells[p], &shells[q]);
            let approx = vectors.reconstruct(p, q, p, q);
            assert!(
                (exact - approx).abs() < 1e-6,
                "diagonal ({}{}|{}{}) {} vs {}",
                p,
                q,
                p,
                q,
                exact,
                approx
            );
        }
    }
}

#[test]
fn identity_transform_is_a_no_op() {
    let ao = primitive_chain();
    let vectors = CholeskyEri::new(1e-8, None).decompose(&ao);
    let transformed = vectors.transform(&DMatrix::identity(ao.len(), ao.len()));
    assert_eq!(transformed.count(), vectors.count());
    for x in 0..vectors.count() {
        for p in 0..ao.len() {
            for q in 0..ao.len() {
                assert!((transformed.get(x, p, q) - vectors.get(x, p, q)).abs() < 1e-12);
            }
        }
    }
}

#[test]
fn full_reconstruction_matches_pointwise() {
    let ao = primitive_chain();
    let vectors = CholeskyEri::new(1e-8, None).decompose(&ao);
    let full = vectors.reconstruct_full();
    let n = ao.len();
    for p in 0..n {
        for q in 0..n {
            for r in 0..n {
                for s in 0..n {
                    assert!(
                        (full.get(p, q, r, s) - vectors.reconstruct(p, q, r, s)).abs() < 1e-12
                    );
                }
            }
        }
    }
}

#[test]
fn stored_tensor_round_trip() {
    let ao = primitive_chain();
    let vectors = CholeskyEri::new(1e-8, None).decompose(&ao);
    let restored = CholeskyVectors::from_stored(&vectors.to_stored()).unwrap();
    assert_eq!(restored, vectors);
}
