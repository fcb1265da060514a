//! Primitive Cartesian Gaussians and their analytic integrals.
//!
//! Overlap, kinetic, nuclear attraction and electron repulsion integrals are
//! evaluated through the Hermite expansion of Gaussian products and the Boys
//! function, following Helgaker, Jørgensen and Taylor, ch. 9.

use crate::basis::Basis;
use crate::helper::{boys_function, factorial};
use itertools::iproduct;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One Cartesian axis of a primitive Gaussian: x^l exp(-alpha (x-X)^2).
#[derive(Debug, Serialize, Deserialize, Copy, Clone)]
pub struct Gto1d {
    pub alpha: f64,
    pub l: i32,
    pub center: f64,
    pub norm: f64,
}

impl Gto1d {
    pub fn new(alpha: f64, l: i32, center: f64) -> Self {
        let norm = Gto1d::compute_norm(alpha, l);
        Self {
            alpha,
            l,
            center,
            norm,
        }
    }

    /// N² = 2^(3l) l! α^l sqrt(2α/π) / (2l)!
    fn compute_norm(alpha: f64, l: i32) -> f64 {
        let numerator = 2.0_f64.powi(3 * l) * factorial(l) * alpha.powi(l);
        let denominator = factorial(2 * l);
        let factor = (2.0 * alpha / PI).sqrt();
        (numerator * factor / denominator).sqrt()
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let x = x - self.center;
        self.norm * x.powi(self.l) * (-self.alpha * x.powi(2)).exp()
    }

    /// Hermite expansion coefficient E_t^{ij} for the product of two 1d
    /// Gaussians with exponents `a`, `b` separated by `qx`.
    pub fn hermite_expansion(i: i32, j: i32, t: i32, qx: f64, a: f64, b: f64) -> f64 {
        let p = a + b;
        let q = a * b / p;

        if t < 0 || t > i + j || i < 0 || j < 0 {
            0.0
        } else if i == 0 && j == 0 && t == 0 {
            (-q * qx.powi(2)).exp()
        } else if j == 0 {
            // decrement i
            Gto1d::hermite_expansion(i - 1, j, t - 1, qx, a, b) / (2.0 * p)
                - Gto1d::hermite_expansion(i - 1, j, t, qx, a, b) * q * qx / a
                + Gto1d::hermite_expansion(i - 1, j, t + 1, qx, a, b) * ((t + 1) as f64)
        } else {
            // decrement j
            Gto1d::hermite_expansion(i, j - 1, t - 1, qx, a, b) / (2.0 * p)
                + Gto1d::hermite_expansion(i, j - 1, t, qx, a, b) * q * qx / b
                + Gto1d::hermite_expansion(i, j - 1, t + 1, qx, a, b) * ((t + 1) as f64)
        }
    }

    /// Overlap between two 1d primitives.
    pub(crate) fn overlap(a: &Gto1d, b: &Gto1d) -> f64 {
        let p = a.alpha + b.alpha;
        let qx = a.center - b.center;
        Gto1d::hermite_expansion(a.l, b.l, 0, qx, a.alpha, b.alpha) * (PI / p).sqrt()
            * a.norm
            * b.norm
    }

    /// Kinetic energy between two 1d primitives, via the Laplacian acting
    /// on the ket.
    pub(crate) fn kinetic(a: &Gto1d, b: &Gto1d) -> f64 {
        let p = a.alpha + b.alpha;
        let qx = a.center - b.center;
        let norm = a.norm * b.norm * (PI / p).sqrt();

        let term1 = b.l as f64
            * (b.l as f64 - 1.0)
            * Gto1d::hermite_expansion(a.l, b.l - 2, 0, qx, a.alpha, b.alpha);
        let term2 = -2.0
            * b.alpha
            * (2.0 * b.l as f64 + 1.0)
            * Gto1d::hermite_expansion(a.l, b.l, 0, qx, a.alpha, b.alpha);
        let term3 =
            4.0 * b.alpha.powi(2) * Gto1d::hermite_expansion(a.l, b.l + 2, 0, qx, a.alpha, b.alpha);

        -0.5 * norm * (term1 + term2 + term3)
    }
}

/// Primitive Cartesian Gaussian in three dimensions.
#[derive(Debug, Serialize, Deserialize, Copy, Clone)]
pub struct Gto {
    pub alpha: f64,
    pub l_xyz: Vector3<i32>,
    pub center: Vector3<f64>,
    pub norm: f64,
    pub axes: [Gto1d; 3],
}

impl Gto {
    pub fn new(alpha: f64, l_xyz: Vector3<i32>, center: Vector3<f64>) -> Self {
        let axes = [
            Gto1d::new(alpha, l_xyz.x, center.x),
            Gto1d::new(alpha, l_xyz.y, center.y),
            Gto1d::new(alpha, l_xyz.z, center.z),
        ];
        let norm = axes[0].norm * axes[1].norm * axes[2].norm;
        Self {
            alpha,
            l_xyz,
            center,
            norm,
            axes,
        }
    }

    /// Gaussian product rule: the product of two primitives is a primitive
    /// at the exponent-weighted center.
    pub(crate) fn product(a: &Gto, b: &Gto) -> Gto {
        let center = (a.center * a.alpha + b.center * b.alpha) / (a.alpha + b.alpha);
        Gto::new(a.alpha + b.alpha, a.l_xyz + b.l_xyz, center)
    }

    /// Hermite Coulomb integral R_{tuv}^n by downward recursion on the
    /// Cartesian orders, raising the Boys order at each step.
    pub fn hermite_coulomb(
        t: i32,
        u: i32,
        v: i32,
        n: i32,
        p: f64,
        pc: Vector3<f64>,
        rpc: f64,
    ) -> f64 {
        let mut val = 0.0;
        if t == 0 && u == 0 && v == 0 {
            val += (-2.0 * p).powi(n) * boys_function(n, p * rpc * rpc);
        } else if t == 0 && u == 0 {
            if v > 1 {
                val += (v as f64 - 1.0) * Gto::hermite_coulomb(t, u, v - 2, n + 1, p, pc, rpc);
            }
            val += pc.z * Gto::hermite_coulomb(t, u, v - 1, n + 1, p, pc, rpc);
        } else if t == 0 {
            if u > 1 {
                val += (u as f64 - 1.0) * Gto::hermite_coulomb(t, u - 2, v, n + 1, p, pc, rpc);
            }
            val += pc.y * Gto::hermite_coulomb(t, u - 1, v, n + 1, p, pc, rpc);
        } else {
            if t > 1 {
                val += (t as f64 - 1.0) * Gto::hermite_coulomb(t - 2, u, v, n + 1, p, pc, rpc);
            }
            val += pc.x * Gto::hermite_coulomb(t - 1, u, v, n + 1, p, pc, rpc);
        }
        val
    }
}

impl Basis for Gto {
    fn evaluate(&self, r: &Vector3<f64>) -> f64 {
        self.axes[0].evaluate(r.x) * self.axes[1].evaluate(r.y) * self.axes[2].evaluate(r.z)
    }

    fn Sab(a: &Gto, b: &Gto) -> f64 {
        Gto1d::overlap(&a.axes[0], &b.axes[0])
            * Gto1d::overlap(&a.axes[1], &b.axes[1])
            * Gto1d::overlap(&a.axes[2], &b.axes[2])
    }

    fn Tab(a: &Gto, b: &Gto) -> f64 {
        Gto1d::kinetic(&a.axes[0], &b.axes[0])
            * Gto1d::overlap(&a.axes[1], &b.axes[1])
            * Gto1d::overlap(&a.axes[2], &b.axes[2])
            + Gto1d::kinetic(&a.axes[1], &b.axes[1])
                * Gto1d::overlap(&a.axes[0], &b.axes[0])
                * Gto1d::overlap(&a.axes[2], &b.axes[2])
            + Gto1d::kinetic(&a.axes[2], &b.axes[2])
                * Gto1d::overlap(&a.axes[0], &b.axes[0])
                * Gto1d::overlap(&a.axes[1], &b.axes[1])
    }

    fn Vab(a: &Gto, b: &Gto, center: Vector3<f64>, charge: u32) -> f64 {
        let c = Gto::product(a, b);
        let pc = c.center - center;
        let dab = a.center - b.center;

        let val: f64 = iproduct!(0..=c.l_xyz.x, 0..=c.l_xyz.y, 0..=c.l_xyz.z)
            .map(|(t, u, v)| {
                let e_x = Gto1d::hermite_expansion(a.l_xyz.x, b.l_xyz.x, t, dab.x, a.alpha, b.alpha);
                let e_y = Gto1d::hermite_expansion(a.l_xyz.y, b.l_xyz.y, u, dab.y, a.alpha, b.alpha);
                let e_z = Gto1d::hermite_expansion(a.l_xyz.z, b.l_xyz.z, v, dab.z, a.alpha, b.alpha);
                let r_tuv = Gto::hermite_coulomb(t, u, v, 0, c.alpha, pc, pc.norm());
                e_x * e_y * e_z * r_tuv
            })
            .sum();

        // attractive interaction, hence the sign
        -a.norm * b.norm * val * 2.0 * PI * (charge as f64) / c.alpha
    }

    fn JKabcd(a: &Gto, b: &Gto, c: &Gto, d: &Gto) -> f64 {
        let bra = Gto::product(a, b);
        let ket = Gto::product(c, d);
        let pq = bra.center - ket.center;
        let alpha = bra.alpha * ket.alpha / (bra.alpha + ket.alpha);

        let dab = a.center - b.center;
        let dcd = c.center - d.center;

        let val: f64 = iproduct!(
            0..=bra.l_xyz.x,
            0..=bra.l_xyz.y,
            0..=bra.l_xyz.z,
            0..=ket.l_xyz.x,
            0..=ket.l_xyz.y,
            0..=ket.l_xyz.z
        )
        .map(|(t, u, v, tau, nu, phi)| {
            let e_ab = Gto1d::hermite_expansion(a.l_xyz.x, b.l_xyz.x, t, dab.x, a.alpha, b.alpha)
                * Gto1d::hermite_expansion(a.l_xyz.y, b.l_xyz.y, u, dab.y, a.alpha, b.alpha)
                * Gto1d::hermite_expansion(a.l_xyz.z, b.l_xyz.z, v, dab.z, a.alpha, b.alpha);
            let e_cd = Gto1d::hermite_expansion(c.l_xyz.x, d.l_xyz.x, tau, dcd.x, c.alpha, d.alpha)
                * Gto1d::hermite_expansion(c.l_xyz.y, d.l_xyz.y, nu, dcd.y, c.alpha, d.alpha)
                * Gto1d::hermite_expansion(c.l_xyz.z, d.l_xyz.z, phi, dcd.z, c.alpha, d.alpha);

            let r_tuv =
                Gto::hermite_coulomb(t + tau, u + nu, v + phi, 0, alpha, pq, pq.norm());

            // ket-side Hermite orders carry an alternating sign
            let sgn = if (tau + nu + phi) % 2 == 0 { 1.0 } else { -1.0 };
            e_ab * e_cd * sgn * r_tuv
        })
        .sum();

        a.norm * b.norm * c.norm * d.norm * val * 2.0 * PI.powf(2.5)
            / (bra.alpha * ket.alpha * (bra.alpha + ket.alpha).sqrt())
    }
}
