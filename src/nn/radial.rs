//! Smooth radial basis on `[0, cutoff]`.

use ndarray::Array2;

/// Normalisation constant making the bump's second moment close to one.
const BUMP_SCALE: f64 = 1.14136;

fn soft_unit_step(x: f64) -> f64 {
    if x > 0.0 { (-1.0 / x).exp() } else { 0.0 }
}

/// Finite-support bump basis evaluated at each distance.
///
/// The `number` centres are the interior points of an even grid of
/// `number + 2` points on `[start, end]`. Every basis function vanishes
/// smoothly one grid step away from its centre, so the whole encoding is
/// zero at and beyond `end`. Values are scaled by `sqrt(number)`.
pub fn soft_one_hot_linspace(distances: &[f64], start: f64, end: f64, number: usize) -> Array2<f64> {
    let step = (end - start) / (number + 1) as f64;
    let norm = (number as f64).sqrt();
    Array2::from_shape_fn((distances.len(), number), |(e, k)| {
        let centre = start + step * (k + 1) as f64;
        let diff = (distances[e] - centre) / step;
        BUMP_SCALE * std::f64::consts::E.powi(2) * soft_unit_step(diff + 1.0) * soft_unit_step(1.0 - diff) * norm
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanishes_at_and_beyond_cutoff() {
        let out = soft_one_hot_linspace(&[3.0, 3.5, 10.0], 0.0, 3.0, 8);
        assert!(out.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn peaks_at_centres() {
        let number = 4;
        let step = 5.0 / (number + 1) as f64;
        let out = soft_one_hot_linspace(&[2.0 * step], 0.0, 5.0, number);
        let row = out.row(0);
        let best = (0..number).max_by(|&a, &b| row[a].total_cmp(&row[b])).unwrap();
        assert_eq!(best, 1);
        let peak = BUMP_SCALE * (number as f64).sqrt();
        assert!((row[1] - peak).abs() < 1e-12);
        assert_eq!(row[3], 0.0);
    }

    #[test]
    fn shape_and_non_negativity() {
        let out = soft_one_hot_linspace(&[0.1, 0.9, 1.7, 2.4], 0.0, 3.0, 6);
        assert_eq!(out.shape(), &[4, 6]);
        assert!(out.iter().all(|v| *v >= 0.0));
        assert!(out.row(1).sum() > 0.0);
    }
}
