use crate::basis::Basis;
use crate::gto::{Gto, Gto1d};
use crate::helper::{boys_function, simpson_integration, simpson_integration_3d};
use nalgebra::Vector3;
use std::f64::consts::PI;

#[test]
fn gto1d_is_normalized() {
    for l in 0..3 {
        let gto = Gto1d::new(1.3, l, 0.5);
        let integrand = |x: f64| gto.evaluate(x).powi(2);
        let integral = simpson_integration(integrand, -10.0, 10.0, 10_000);
        assert!(
            (integral - 1.0).abs() < 1e-5,
            "l = {}: norm integral {}",
            l,
            integral
        );
    }
}

#[test]
fn gto1d_overlap_matches_quadrature() {
    let a = Gto1d::new(1.2, 1, 1.0);
    let b = Gto1d::new(0.8, 1, 3.0);
    let numeric = simpson_integration(|x| a.evaluate(x) * b.evaluate(x), -10.0, 10.0, 10_000);
    let analytic = Gto1d::overlap(&a, &b);
    assert!(
        (numeric - analytic).abs() < 1e-5,
        "numeric {} analytic {}",
        numeric,
        analytic
    );
}

#[test]
fn gto_is_normalized_3d() {
    let gto = Gto::new(0.9, Vector3::new(1, 0, 1), Vector3::new(0.0, 0.0, 0.0));
    let integrand = |x, y, z| gto.evaluate(&Vector3::new(x, y, z)).powi(2);
    let lower = Vector3::new(-8.0, -8.0, -8.0);
    let upper = Vector3::new(8.0, 8.0, 8.0);
    let integral = simpson_integration_3d(integrand, lower, upper, 120, 120, 120);
    assert!(
        (integral - 1.0).abs() < 1e-3,
        "norm integral {}",
        integral
    );
}

#[test]
fn gto_overlap_matches_quadrature() {
    let a = Gto::new(1.1, Vector3::new(0, 0, 0), Vector3::new(0.0, 0.0, 0.0));
    let b = Gto::new(0.7, Vector3::new(0, 0, 1), Vector3::new(0.0, 0.0, 1.1));
    let numeric = simpson_integration_3d(
        |x, y, z| {
            let r = Vector3::new(x, y, z);
            a.evaluate(&r) * b.evaluate(&r)
        },
        Vector3::new(-8.0, -8.0, -8.0),
        Vector3::new(8.0, 8.0, 8.0),
        120,
        120,
        120,
    );
    let analytic = Gto::Sab(&a, &b);
    assert!(
        (numeric - analytic).abs() < 1e-3,
        "numeric {} analytic {}",
        numeric,
        analytic
    );
}

#[test]
fn boys_function_limits() {
    // F_n(0) = 1/(2n+1)
    assert!((boys_function(0, 0.0) - 1.0).abs() < 1e-12);
    assert!((boys_function(1, 0.0) - 1.0 / 3.0).abs() < 1e-12);
    assert!((boys_function(4, 0.0) - 1.0 / 9.0).abs() < 1e-12);

    // F_0(x) = sqrt(pi/x)/2 * erf(sqrt(x))
    for &x in &[0.1, 1.0, 10.0, 40.0] {
        let reference = 0.5 * (PI / x).sqrt() * libm::erf(x.sqrt());
        assert!(
            (boys_function(0, x) - reference).abs() < 1e-10,
            "x = {}",
            x
        );
    }

    // downward consistency: F_n(x) = (2x F_{n+1}(x) + exp(-x)) / (2n+1)
    for &x in &[0.5, 5.0, 20.0] {
        for n in 0..4 {
            let lhs = boys_function(n, x);
            let rhs = (2.0 * x * boys_function(n + 1, x) + (-x).exp()) / (2.0 * n as f64 + 1.0);
            assert!((lhs - rhs).abs() < 1e-10, "n = {}, x = {}", n, x);
        }
    }
}

#[test]
fn eri_symmetries() {
    let s = Gto::new(1.0, Vector3::new(0, 0, 0), Vector3::new(0.0, 0.0, 0.0));
    let p = Gto::new(0.8, Vector3::new(0, 0, 1), Vector3::new(0.0, 0.0, 1.0));

    let ssss = Gto::JKabcd(&s, &s, &s, &s);
    assert!(ssss > 0.0);

    // 8-fold permutational symmetry of a real ERI
    let abab = Gto::JKabcd(&s, &p, &s, &p);
    assert!((abab - Gto::JKabcd(&p, &s, &p, &s)).abs() < 1e-10);
    assert!((Gto::JKabcd(&s, &s, &p, &p) - Gto::JKabcd(&p, &p, &s, &s)).abs() < 1e-10);

    // self-repulsion dominates the mixed integral (Cauchy-Schwarz)
    let pppp = Gto::JKabcd(&p, &p, &p, &p);
    assert!(abab * abab <= ssss * pppp + 1e-12);
}

#[test]
fn eri_scaling_law_for_s_functions() {
    // a normalized s primitive has 1/sqrt(alpha) as its only length scale,
    // so the self-repulsion scales as (aa|aa)(alpha) = sqrt(alpha) (aa|aa)(1)
    let reference = {
        let s = Gto::new(1.0, Vector3::new(0, 0, 0), Vector3::zeros());
        Gto::JKabcd(&s, &s, &s, &s)
    };
    for &alpha in &[0.25, 2.0, 9.0] {
        let s = Gto::new(alpha, Vector3::new(0, 0, 0), Vector3::zeros());
        let val = Gto::JKabcd(&s, &s, &s, &s);
        assert!(
            (val - alpha.sqrt() * reference).abs() < 1e-10 * val.abs().max(1.0),
            "alpha = {}: {} vs scaled {}",
            alpha,
            val,
            alpha.sqrt() * reference
        );
    }
}

#[test]
fn kinetic_matches_quadrature_for_s_functions() {
    // For two s primitives the kinetic integral has the closed form
    // T = q (3 - 2 q R^2) S where q = ab/(a+b) and S is the overlap.
    let a = Gto::new(0.9, Vector3::new(0, 0, 0), Vector3::new(0.0, 0.0, 0.0));
    let b = Gto::new(0.6, Vector3::new(0, 0, 0), Vector3::new(0.0, 0.0, 0.8));
    let q = a.alpha * b.alpha / (a.alpha + b.alpha);
    let r2 = (a.center - b.center).norm_squared();
    let expected = q * (3.0 - 2.0 * q * r2) * Gto::Sab(&a, &b);
    let actual = Gto::Tab(&a, &b);
    assert!(
        (actual - expected).abs() < 1e-10,
        "analytic {} closed form {}",
        actual,
        expected
    );
}

#[test]
fn nuclear_attraction_is_negative_and_symmetric() {
    let a = Gto::new(1.0, Vector3::new(0, 0, 0), Vector3::new(0.0, 0.0, 0.0));
    let b = Gto::new(0.5, Vector3::new(0, 0, 0), Vector3::new(0.0, 0.0, 1.2));
    let nucleus = Vector3::new(0.0, 0.0, 0.6);

    let vab = Gto::Vab(&a, &b, nucleus, 1);
    let vba = Gto::Vab(&b, &a, nucleus, 1);
    assert!(vab < 0.0);
    assert!((vab - vba).abs() < 1e-10);

    // attraction scales linearly with nuclear charge
    let v8 = Gto::Vab(&a, &b, nucleus, 8);
    assert!((v8 - 8.0 * vab).abs() < 1e-9);
}
