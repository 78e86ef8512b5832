//! Wigner 3-j coupling tensors in the real spherical-harmonics basis.

use std::collections::HashMap;
use std::f64::consts::FRAC_1_SQRT_2;
use std::ops::{Add, Mul};
use std::sync::{Arc, Mutex, OnceLock};

use ndarray::Array3;

static CACHE: OnceLock<Mutex<HashMap<(u32, u32, u32), Arc<Array3<f64>>>>> = OnceLock::new();

/// Real coupling tensor of shape `[2l1+1, 2l2+1, 2l3+1]` with unit Frobenius norm.
///
/// The contraction `Σ C[a,b,c] x_a y_b z_c` is invariant when `x`, `y`, `z`
/// rotate as real harmonics of degree `l1`, `l2`, `l3`. Returns all zeros
/// when `(l1, l2, l3)` violate the triangle condition.
pub fn wigner_3j(l1: u32, l2: u32, l3: u32) -> Arc<Array3<f64>> {
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard
        .entry((l1, l2, l3))
        .or_insert_with(|| Arc::new(real_coupling(l1, l2, l3)))
        .clone()
}

fn real_coupling(l1: u32, l2: u32, l3: u32) -> Array3<f64> {
    let (d1, d2, d3) = (2 * l1 as usize + 1, 2 * l2 as usize + 1, 2 * l3 as usize + 1);
    let mut out = Array3::zeros((d1, d2, d3));
    if l3 < l1.abs_diff(l2) || l3 > l1 + l2 {
        return out;
    }

    let (j1, j2, j3) = (l1 as i64, l2 as i64, l3 as i64);
    let mut complex = vec![Complex::ZERO; d1 * d2 * d3];

    for a in -j1..=j1 {
        for b in -j2..=j2 {
            for c in -j3..=j3 {
                let mut acc = Complex::ZERO;
                for (m1, u1) in basis_row(j1, a) {
                    for (m2, u2) in basis_row(j2, b) {
                        for (m3, u3) in basis_row(j3, c) {
                            let symbol = three_j_symbol(j1, j2, j3, m1, m2, m3);
                            if symbol != 0.0 {
                                acc = acc + u1.conj() * u2.conj() * u3.conj() * symbol;
                            }
                        }
                    }
                }
                let idx = ((a + j1) as usize * d2 + (b + j2) as usize) * d3 + (c + j3) as usize;
                complex[idx] = acc;
            }
        }
    }

    // The tensor is real up to a global factor of i.
    let max_re = complex.iter().fold(0.0f64, |m, z| m.max(z.re.abs()));
    let max_im = complex.iter().fold(0.0f64, |m, z| m.max(z.im.abs()));
    let use_real = max_re >= max_im;

    for (slot, z) in out.iter_mut().zip(&complex) {
        *slot = if use_real { z.re } else { z.im };
    }

    let norm = out.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        out.mapv_inplace(|v| v / norm);
    }
    out
}

/// Non-zero entries `(m, U[a, m])` of the unitary map from complex
/// (Condon–Shortley) harmonics to the real harmonics of this crate.
fn basis_row(l: i64, a: i64) -> Vec<(i64, Complex)> {
    debug_assert!(a.abs() <= l);
    let sign = if a.abs() % 2 == 0 { 1.0 } else { -1.0 };
    match a {
        0 => vec![(0, Complex::new(1.0, 0.0))],
        m if m > 0 => vec![
            (m, Complex::new(sign * FRAC_1_SQRT_2, 0.0)),
            (-m, Complex::new(FRAC_1_SQRT_2, 0.0)),
        ],
        m => {
            let k = -m;
            vec![
                (k, Complex::new(0.0, -sign * FRAC_1_SQRT_2)),
                (-k, Complex::new(0.0, FRAC_1_SQRT_2)),
            ]
        }
    }
}

/// Wigner 3-j symbol `(j1 j2 j3; m1 m2 m3)` via the Racah formula.
pub fn three_j_symbol(j1: i64, j2: i64, j3: i64, m1: i64, m2: i64, m3: i64) -> f64 {
    if m1 + m2 + m3 != 0
        || m1.abs() > j1
        || m2.abs() > j2
        || m3.abs() > j3
        || j3 < (j1 - j2).abs()
        || j3 > j1 + j2
    {
        return 0.0;
    }

    // Factorials overflow f64 past 170!, so every term is carried as a
    // logarithm and only the ratio against the prefactor is exponentiated.
    let ln_fact = ln_factorials((j1 + j2 + j3 + 1) as usize);
    let lf = |n: i64| ln_fact[n as usize];

    let ln_triangle =
        lf(j1 + j2 - j3) + lf(j1 - j2 + j3) + lf(-j1 + j2 + j3) - lf(j1 + j2 + j3 + 1);
    let ln_projections =
        lf(j1 + m1) + lf(j1 - m1) + lf(j2 + m2) + lf(j2 - m2) + lf(j3 + m3) + lf(j3 - m3);
    let ln_prefactor = 0.5 * (ln_triangle + ln_projections);

    let k_min = 0.max(j2 - j3 - m1).max(j1 - j3 + m2);
    let k_max = (j1 + j2 - j3).min(j1 - m1).min(j2 + m2);

    let mut sum = 0.0;
    for k in k_min..=k_max {
        let ln_denom = lf(k)
            + lf(j3 - j2 + k + m1)
            + lf(j3 - j1 + k - m2)
            + lf(j1 + j2 - j3 - k)
            + lf(j1 - k - m1)
            + lf(j2 - k + m2);
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        sum += sign * (ln_prefactor - ln_denom).exp();
    }

    let phase = if (j1 - j2 - m3).rem_euclid(2) == 0 { 1.0 } else { -1.0 };
    phase * sum
}

/// `ln k!` for `k` in `0..=n`.
fn ln_factorials(n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(n + 1);
    let mut acc = 0.0;
    table.push(acc);
    for k in 1..=n {
        acc += (k as f64).ln();
        table.push(acc);
    }
    table
}

#[derive(Debug, Clone, Copy)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    fn conj(self) -> Self {
        Self::new(self.re, -self.im)
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Mul<f64> for Complex {
    type Output = Complex;

    fn mul(self, rhs: f64) -> Complex {
        Complex::new(self.re * rhs, self.im * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::o3::spherical_harmonics::{Normalization, real_harmonics};

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn rotate(v: [f64; 3], axis: [f64; 3], angle: f64) -> [f64; 3] {
        let n = (axis[0].powi(2) + axis[1].powi(2) + axis[2].powi(2)).sqrt();
        let k = [axis[0] / n, axis[1] / n, axis[2] / n];
        let (s, c) = angle.sin_cos();
        let dot = k[0] * v[0] + k[1] * v[1] + k[2] * v[2];
        let cross = [
            k[1] * v[2] - k[2] * v[1],
            k[2] * v[0] - k[0] * v[2],
            k[0] * v[1] - k[1] * v[0],
        ];
        [
            v[0] * c + cross[0] * s + k[0] * dot * (1.0 - c),
            v[1] * c + cross[1] * s + k[1] * dot * (1.0 - c),
            v[2] * c + cross[2] * s + k[2] * dot * (1.0 - c),
        ]
    }

    fn contract(c: &Array3<f64>, x: &[f64], y: &[f64], z: &[f64]) -> f64 {
        let mut total = 0.0;
        for ((a, b, k), value) in c.indexed_iter() {
            total += value * x[a] * y[b] * z[k];
        }
        total
    }

    #[test]
    fn racah_formula_known_values() {
        assert!(approx_eq(three_j_symbol(1, 1, 0, 1, -1, 0), 1.0 / 3f64.sqrt(), 1e-12));
        assert!(approx_eq(three_j_symbol(1, 1, 0, 0, 0, 0), -1.0 / 3f64.sqrt(), 1e-12));
        // (2 2 2; 0 0 0) = -sqrt(2/35)
        assert!(approx_eq(three_j_symbol(2, 2, 2, 0, 0, 0), -(2.0f64 / 35.0).sqrt(), 1e-12));
        assert_eq!(three_j_symbol(1, 1, 3, 0, 0, 0), 0.0);
        assert_eq!(three_j_symbol(1, 1, 1, 1, 1, 0), 0.0);
    }

    #[test]
    fn high_degree_symbols_stay_finite() {
        // (j j 0; m -m 0) = (-1)^(j-m) / sqrt(2j + 1)
        for (j, m) in [(60i64, 0i64), (60, 17), (90, -45), (120, 120)] {
            let sign = if (j - m) % 2 == 0 { 1.0 } else { -1.0 };
            let expected = sign / ((2 * j + 1) as f64).sqrt();
            assert!(approx_eq(three_j_symbol(j, j, 0, m, -m, 0), expected, 1e-10));
        }

        let value = three_j_symbol(40, 40, 40, 3, -7, 4);
        assert!(value.is_finite());
        assert!(value.abs() <= 1.0);
    }

    #[test]
    fn complex_symbols_have_unit_norm() {
        let mut total = 0.0;
        for m1 in -2i64..=2 {
            for m2 in -1i64..=1 {
                for m3 in -3i64..=3 {
                    total += three_j_symbol(2, 1, 3, m1, m2, m3).powi(2);
                }
            }
        }
        assert!(approx_eq(total, 1.0, 1e-12));
    }

    #[test]
    fn vector_dot_product_coupling_is_identity() {
        let c = wigner_3j(1, 1, 0);
        let scale = c[[0, 0, 0]];
        assert!(approx_eq(scale.abs(), 1.0 / 3f64.sqrt(), 1e-12));
        for a in 0..3 {
            for b in 0..3 {
                let expected = if a == b { scale } else { 0.0 };
                assert!(approx_eq(c[[a, b, 0]], expected, 1e-12));
            }
        }
    }

    #[test]
    fn tensors_have_unit_norm_or_vanish() {
        for (l1, l2, l3) in [(1, 1, 1), (2, 1, 2), (2, 2, 4), (3, 2, 1), (6, 6, 6)] {
            let c = wigner_3j(l1, l2, l3);
            let norm: f64 = c.iter().map(|v| v * v).sum();
            assert!(approx_eq(norm, 1.0, 1e-10), "({l1},{l2},{l3})");
        }
        assert!(wigner_3j(1, 1, 3).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn coupling_is_rotation_invariant() {
        let u = [0.3, -0.7, 0.2];
        let v = [-0.5, 0.1, 0.9];
        let w = [0.8, 0.6, -0.4];
        let axis = [0.2, -0.4, 0.9];
        let angle = 1.234;

        for (l1, l2, l3) in [(1, 1, 1), (1, 1, 2), (2, 1, 1), (2, 2, 2), (3, 2, 1), (2, 3, 3)] {
            let c = wigner_3j(l1, l2, l3);
            let before = contract(
                &c,
                &real_harmonics(l1, u, true, Normalization::Component),
                &real_harmonics(l2, v, true, Normalization::Component),
                &real_harmonics(l3, w, true, Normalization::Component),
            );
            let after = contract(
                &c,
                &real_harmonics(l1, rotate(u, axis, angle), true, Normalization::Component),
                &real_harmonics(l2, rotate(v, axis, angle), true, Normalization::Component),
                &real_harmonics(l3, rotate(w, axis, angle), true, Normalization::Component),
            );
            assert!(approx_eq(before, after, 1e-10), "({l1},{l2},{l3}): {before} vs {after}");
        }
    }

    #[test]
    fn equal_degree_tensor_is_symmetric() {
        let c = wigner_3j(2, 2, 2);
        for ((a, b, k), value) in c.indexed_iter() {
            assert!(approx_eq(*value, c[[b, a, k]], 1e-12));
            assert!(approx_eq(*value, c[[a, k, b]], 1e-12));
        }
    }
}
