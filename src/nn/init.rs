//! Parameter initialisation.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;

/// Standard-normal vector of length `n`.
pub fn normal_vec(rng: &mut impl Rng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect()
}

/// Standard-normal matrix of shape `[rows, cols]`.
pub fn normal_matrix(rng: &mut impl Rng, rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| rng.sample::<f64, _>(StandardNormal))
}

/// Dense layer parameters drawn from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
pub fn linear_params(rng: &mut impl Rng, fan_in: usize, fan_out: usize) -> (Array2<f64>, Array1<f64>) {
    let bound = 1.0 / (fan_in.max(1) as f64).sqrt();
    let weight = Array2::from_shape_fn((fan_in, fan_out), |_| rng.random_range(-bound..=bound));
    let bias = Array1::from_shape_fn(fan_out, |_| rng.random_range(-bound..=bound));
    (weight, bias)
}
