//! Reductions of per-edge rows onto per-node rows.

use ndarray::{Array2, ArrayView2};

use super::error::Error;

fn check_index(index: &[usize], rows: usize, num_out: usize) -> Result<(), Error> {
    Error::check_dim("scatter index", rows, index.len())?;
    if let Some(bad) = index.iter().find(|&&i| i >= num_out) {
        return Err(Error::invalid_graph(format!(
            "scatter target {bad} out of range for {num_out} rows"
        )));
    }
    Ok(())
}

/// Sums row `k` of `src` into row `index[k]` of a `[num_out, cols]` output.
///
/// Rows that receive nothing stay zero.
pub fn scatter_sum(src: ArrayView2<f64>, index: &[usize], num_out: usize) -> Result<Array2<f64>, Error> {
    check_index(index, src.nrows(), num_out)?;
    let mut out = Array2::zeros((num_out, src.ncols()));
    for (row, &target) in src.rows().into_iter().zip(index) {
        let mut dst = out.row_mut(target);
        dst += &row;
    }
    Ok(out)
}

/// Like [`scatter_sum`] but divides each output row by the number of rows
/// it received. Empty rows stay zero.
pub fn scatter_mean(src: ArrayView2<f64>, index: &[usize], num_out: usize) -> Result<Array2<f64>, Error> {
    let mut out = scatter_sum(src, index, num_out)?;
    let mut counts = vec![0usize; num_out];
    for &target in index {
        counts[target] += 1;
    }
    for (mut row, &count) in out.rows_mut().into_iter().zip(&counts) {
        if count > 1 {
            row /= count as f64;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sum_accumulates_and_leaves_gaps_zero() {
        let src = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let out = scatter_sum(src.view(), &[2, 0, 2], 4).unwrap();
        assert_eq!(out, array![[3.0, 4.0], [0.0, 0.0], [6.0, 8.0], [0.0, 0.0]]);
    }

    #[test]
    fn mean_divides_by_count() {
        let src = array![[1.0], [3.0], [5.0]];
        let out = scatter_mean(src.view(), &[1, 1, 0], 3).unwrap();
        assert_eq!(out, array![[5.0], [2.0], [0.0]]);
    }

    #[test]
    fn rejects_bad_indices() {
        let src = array![[1.0], [2.0]];
        assert!(matches!(scatter_sum(src.view(), &[0], 2), Err(Error::DimensionMismatch { .. })));
        assert!(matches!(scatter_sum(src.view(), &[0, 2], 2), Err(Error::InvalidGraph(_))));
    }

    #[test]
    fn empty_input_gives_zeros() {
        let src = Array2::<f64>::zeros((0, 3));
        let out = scatter_sum(src.view(), &[], 2).unwrap();
        assert_eq!(out, Array2::<f64>::zeros((2, 3)));
    }
}
