//! Real spherical harmonics.
//!
//! Components of degree `l` are ordered `m = -l, ..., l` and use the polar
//! axis `z`. For `m > 0` the component is `sqrt(2) N P_l^m(cos θ) cos(mφ)`,
//! for `m < 0` it is `sqrt(2) N P_l^|m|(cos θ) sin(|m|φ)`, where `P_l^m` are
//! associated Legendre functions without the Condon–Shortley phase. The
//! [`wigner_3j`](super::wigner_3j) tensors are expressed in this same basis.

use std::f64::consts::PI;

use ndarray::Array2;
use thiserror::Error;

use super::irreps::Irreps;
use super::parity::Parity;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("irreps '{0}' are neither all polar ((-1)^l) nor all axial (even) spherical harmonics")]
pub struct ParityConventionError(pub Irreps);

/// Overall scale of each degree-`l` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Orthonormal on the unit sphere.
    Integral,
    /// `|Y_l(r̂)|² = 2l + 1`: unit variance per component.
    #[default]
    Component,
    /// `|Y_l(r̂)| = 1`.
    Norm,
}

impl Normalization {
    fn factor(self, l: u32) -> f64 {
        match self {
            Normalization::Integral => 1.0,
            Normalization::Component => (4.0 * PI).sqrt(),
            Normalization::Norm => (4.0 * PI / (2 * l + 1) as f64).sqrt(),
        }
    }
}

/// Evaluates the harmonics described by `irreps` on each vector.
///
/// Returns an array of shape `[vectors.len(), irreps.dim()]`. With
/// `normalize` the vectors are projected onto the unit sphere first;
/// otherwise block `l` scales as `|r|^l`. A zero vector yields only the
/// degree-0 component.
///
/// Every block must either carry parity `(-1)^l` (harmonics of a polar
/// vector) or every block must be even (harmonics of an axial vector). The
/// values are identical in both conventions.
pub fn spherical_harmonics(
    irreps: &Irreps,
    vectors: &[[f64; 3]],
    normalize: bool,
    normalization: Normalization,
) -> Result<Array2<f64>, ParityConventionError> {
    check_parity_convention(irreps)?;

    let lmax = irreps.lmax().unwrap_or(0);
    let slices = irreps.slices();
    let mut out = Array2::zeros((vectors.len(), irreps.dim()));
    let mut by_degree: Vec<Vec<f64>> = Vec::with_capacity(lmax as usize + 1);

    for (row, vector) in vectors.iter().enumerate() {
        by_degree.clear();
        by_degree.extend((0..=lmax).map(|l| real_harmonics(l, *vector, normalize, normalization)));

        for (block, range) in irreps.iter().zip(&slices) {
            let values = &by_degree[block.ir.l as usize];
            let width = values.len();
            for copy in 0..block.mul as usize {
                let start = range.start + copy * width;
                for (k, value) in values.iter().enumerate() {
                    out[[row, start + k]] = *value;
                }
            }
        }
    }

    Ok(out)
}

fn check_parity_convention(irreps: &Irreps) -> Result<(), ParityConventionError> {
    let polar = irreps.iter().all(|b| b.ir.p == Parity::of_degree(b.ir.l));
    let axial = irreps.iter().all(|b| b.ir.p == Parity::Even);
    if polar || axial {
        Ok(())
    } else {
        Err(ParityConventionError(irreps.clone()))
    }
}

/// The `2l + 1` real harmonics of degree `l` at `vector`.
pub fn real_harmonics(l: u32, vector: [f64; 3], normalize: bool, normalization: Normalization) -> Vec<f64> {
    let dim = 2 * l as usize + 1;
    let scale = normalization.factor(l);
    let r = (vector[0].powi(2) + vector[1].powi(2) + vector[2].powi(2)).sqrt();

    if r == 0.0 {
        let mut values = vec![0.0; dim];
        if l == 0 {
            values[0] = scale * (1.0 / (4.0 * PI)).sqrt();
        }
        return values;
    }

    let (x, y, z) = (vector[0] / r, vector[1] / r, vector[2] / r);
    let radial = if normalize { 1.0 } else { r.powi(l as i32) };
    let l_i = l as i64;

    let mut values = vec![0.0; dim];
    // Re/Im of (x + iy)^m, built up incrementally.
    let (mut cos_m, mut sin_m) = (1.0, 0.0);
    for m in 0..=l_i {
        if m > 0 {
            let next_cos = cos_m * x - sin_m * y;
            sin_m = sin_m * x + cos_m * y;
            cos_m = next_cos;
        }

        let legendre = reduced_legendre(l_i, m, z);
        let norm = ((2 * l_i + 1) as f64 / (4.0 * PI) * factorial_ratio(l_i, m)).sqrt();
        let common = scale * radial * norm * legendre;

        if m == 0 {
            values[l as usize] = common;
        } else {
            let sqrt2 = std::f64::consts::SQRT_2;
            values[(l_i + m) as usize] = sqrt2 * common * cos_m;
            values[(l_i - m) as usize] = sqrt2 * common * sin_m;
        }
    }
    values
}

/// `P_l^m(z) / (1 - z²)^{m/2}` without the Condon–Shortley phase.
fn reduced_legendre(l: i64, m: i64, z: f64) -> f64 {
    // (2m - 1)!!
    let mut p_mm = 1.0;
    for k in 1..=m {
        p_mm *= (2 * k - 1) as f64;
    }
    if l == m {
        return p_mm;
    }

    let mut p_prev = p_mm;
    let mut p_curr = z * (2 * m + 1) as f64 * p_mm;
    for ll in (m + 2)..=l {
        let p_next =
            ((2 * ll - 1) as f64 * z * p_curr - (ll + m - 1) as f64 * p_prev) / (ll - m) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }
    p_curr
}

/// `(l - m)! / (l + m)!`
fn factorial_ratio(l: i64, m: i64) -> f64 {
    ((l - m + 1)..=(l + m)).fold(1.0, |acc, k| acc / k as f64)
}
