use libm::erf;
use nalgebra::Vector3;
use rayon::prelude::*;
use std::f64::consts::PI;

pub(crate) fn factorial(n: i32) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc * k as f64)
}

/// Boys function F_n(x) = ∫₀¹ t^{2n} exp(-x t²) dt.
///
/// Small arguments use the series
/// F_n(x) = e^{-x} Σ_k (2x)^k / [(2n+1)(2n+3)...(2n+2k+1)],
/// large arguments the erf asymptote for F_0 followed by upward recursion.
pub fn boys_function(n: i32, x: f64) -> f64 {
    assert!(n >= 0, "Boys function order must be nonnegative");
    assert!(x >= 0.0, "Boys function argument must be nonnegative");
    let n = n as usize;

    if x < 1e-13 {
        return 1.0 / (2 * n + 1) as f64;
    }

    if x > 35.0 {
        // exp(-x) is negligible, so the recursion is numerically safe
        let mut f = 0.5 * (PI / x).sqrt() * erf(x.sqrt());
        let damp = (-x).exp();
        for m in 0..n {
            f = ((2 * m + 1) as f64 * f - damp) / (2.0 * x);
        }
        return f;
    }

    let mut sum = 0.0;
    let mut term = 1.0 / (2 * n + 1) as f64;
    for k in 1..=500 {
        sum += term;
        term *= 2.0 * x / (2 * (n + k) + 1) as f64;
        if term < 1e-17 {
            break;
        }
    }
    (-x).exp() * (sum + term)
}

/// Simpson's rule quadrature on [a, b], used by the integral tests.
pub(crate) fn simpson_integration<F>(f: F, a: f64, b: f64, n: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let n = if n % 2 == 0 { n } else { n + 1 };
    let h = (b - a) / n as f64;

    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + i as f64 * h;
        sum += if i % 2 == 0 { 2.0 * f(x) } else { 4.0 * f(x) };
    }
    sum * h / 3.0
}

fn simpson_weight(i: usize, n: usize) -> f64 {
    if i == 0 || i == n {
        1.0
    } else if i % 2 == 1 {
        4.0
    } else {
        2.0
    }
}

/// Simpson's rule over the box [a, b] in three dimensions, parallelized
/// over the outer axis. Quadrature counts are rounded up to even numbers.
pub(crate) fn simpson_integration_3d<F>(
    f: F,
    a: Vector3<f64>,
    b: Vector3<f64>,
    nx: usize,
    ny: usize,
    nz: usize,
) -> f64
where
    F: Fn(f64, f64, f64) -> f64 + Sync,
{
    let nx = if nx % 2 == 0 { nx } else { nx + 1 };
    let ny = if ny % 2 == 0 { ny } else { ny + 1 };
    let nz = if nz % 2 == 0 { nz } else { nz + 1 };

    let hx = (b.x - a.x) / nx as f64;
    let hy = (b.y - a.y) / ny as f64;
    let hz = (b.z - a.z) / nz as f64;

    let sum: f64 = (0..=nx)
        .into_par_iter()
        .map(|i| {
            let x = a.x + i as f64 * hx;
            let wx = simpson_weight(i, nx);
            let mut plane = 0.0;
            for j in 0..=ny {
                let y = a.y + j as f64 * hy;
                let wy = simpson_weight(j, ny);
                let mut row = 0.0;
                for k in 0..=nz {
                    let z = a.z + k as f64 * hz;
                    row += simpson_weight(k, nz) * f(x, y, z);
                }
                plane += wy * row;
            }
            wx * plane
        })
        .sum();

    sum * hx * hy * hz / 27.0
}
