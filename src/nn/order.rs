//! Steinhardt bond-orientational order parameters.
//!
//! For every node the harmonics of its incoming bond vectors are averaged
//! into `q_lm`, optionally averaged once more over neighbours, and reduced
//! to the rotation invariants
//!
//! - `q_l = sqrt(4π / (2l+1) Σ_m q_lm²)`
//! - `w_l = Σ C_lll q q q / (Σ_m q_lm²)^{3/2}`
//!
//! With orthonormal harmonics these are the usual `Q_l` and `Ŵ_l`.

use std::f64::consts::PI;

use ndarray::{Array2, Axis};
use tracing::warn;

use super::config::SteinhardtConfig;
use super::error::Error;
use super::scatter::scatter_mean;
use crate::graph::EdgeIndex;
use crate::o3::{Irrep, Irreps, Normalization, spherical_harmonics, wigner_3j};

/// Below this squared norm of `q_lm` a node counts as degenerate.
const DEGENERATE_NORM_SQ: f64 = 1e-20;

/// Per-node order parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderParameters {
    /// `q_l`, finite and non-negative.
    pub q: Vec<f64>,
    /// `w_l`; `NaN` for nodes whose `q_lm` vanish, see
    /// [`degenerate_nodes`](Self::degenerate_nodes).
    pub w: Vec<f64>,
}

impl OrderParameters {
    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// Nodes whose averaged harmonics vanish, leaving `w` undefined.
    ///
    /// Covers isolated nodes and neighbour shells whose degree-`l`
    /// harmonics cancel exactly.
    pub fn degenerate_nodes(&self) -> Vec<usize> {
        self.w
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_nan())
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Computes `q_l` and `w_l` for every node of a graph.
///
/// Bond harmonics are aggregated onto the destination of each edge.
///
/// # Errors
///
/// Returns [`InvalidGraph`](Error::InvalidGraph) for edges outside
/// `0..num_nodes` or an edge vector count differing from the edge count,
/// and [`InconsistentParity`](Error::InconsistentParity) for an odd parity
/// at even degree.
pub fn steinhardt(
    edge_index: &EdgeIndex,
    edge_vec: &[[f64; 3]],
    num_nodes: usize,
    config: &SteinhardtConfig,
) -> Result<OrderParameters, Error> {
    edge_index.validate(num_nodes)?;
    Error::check_dim("edge vectors", edge_index.len(), edge_vec.len())?;

    let l = config.degree;
    let irreps = Irreps::single(1, Irrep::new(l, config.parity));
    let sh = spherical_harmonics(&irreps, edge_vec, true, Normalization::Integral)?;

    let mut q_lm = scatter_mean(sh.view(), &edge_index.dst, num_nodes)?;
    if config.second_shell_average {
        let neighbours = q_lm.select(Axis(0), &edge_index.src);
        q_lm = scatter_mean(neighbours.view(), &edge_index.dst, num_nodes)?;
    }

    let (q, w) = invariants(&q_lm, l);
    let params = OrderParameters { q, w };

    let degenerate = params.degenerate_nodes();
    if !degenerate.is_empty() {
        warn!(
            degree = l,
            count = degenerate.len(),
            first = degenerate[0],
            "w is undefined for nodes with vanishing q_lm"
        );
    }
    Ok(params)
}

fn invariants(q_lm: &Array2<f64>, l: u32) -> (Vec<f64>, Vec<f64>) {
    let c = wigner_3j(l, l, l);
    let prefactor = 4.0 * PI / (2 * l + 1) as f64;
    q_lm.rows()
        .into_iter()
        .map(|row| {
            let norm_sq = row.iter().map(|v| v * v).sum::<f64>();
            let q = (prefactor * norm_sq).sqrt();
            if norm_sq < DEGENERATE_NORM_SQ {
                return (q, f64::NAN);
            }
            let contraction: f64 = c
                .indexed_iter()
                .filter(|(_, coeff)| **coeff != 0.0)
                .map(|((i, j, k), coeff)| coeff * row[i] * row[j] * row[k])
                .sum();
            (q, contraction / norm_sq.powf(1.5))
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::o3::Parity;

    /// Edges from each shell vertex into a centre node appended last.
    fn star(shell: &[[f64; 3]]) -> (EdgeIndex, Vec<[f64; 3]>, usize) {
        let centre = shell.len();
        let index = EdgeIndex::from_pairs((0..shell.len()).map(|i| (i, centre)));
        let vecs = shell.iter().map(|v| [-v[0], -v[1], -v[2]]).collect();
        (index, vecs, shell.len() + 1)
    }

    fn icosahedron() -> Vec<[f64; 3]> {
        let phi = (1.0 + 5f64.sqrt()) / 2.0;
        let mut out = Vec::new();
        for s1 in [1.0, -1.0] {
            for s2 in [1.0, -1.0] {
                out.push([0.0, s1, s2 * phi]);
                out.push([s1, s2 * phi, 0.0]);
                out.push([s2 * phi, 0.0, s1]);
            }
        }
        out
    }

    fn octahedron() -> Vec<[f64; 3]> {
        vec![
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ]
    }

    fn first_shell(degree: u32) -> SteinhardtConfig {
        SteinhardtConfig {
            degree,
            parity: Parity::Even,
            second_shell_average: false,
        }
    }

    #[test]
    fn icosahedral_shell() {
        let (index, vecs, n) = star(&icosahedron());
        let params = steinhardt(&index, &vecs, n, &first_shell(6)).unwrap();
        let centre = n - 1;
        assert!((params.q[centre] - 0.663325).abs() < 1e-5);
        assert!((params.w[centre] + 0.169754).abs() < 1e-5);
    }

    #[test]
    fn octahedral_shell() {
        let (index, vecs, n) = star(&octahedron());
        let centre = n - 1;
        let q4 = steinhardt(&index, &vecs, n, &first_shell(4)).unwrap();
        assert!((q4.q[centre] - 0.763763).abs() < 1e-5);
        assert!((q4.w[centre] - 0.159317).abs() < 1e-5);
        let q6 = steinhardt(&index, &vecs, n, &first_shell(6)).unwrap();
        assert!((q6.q[centre] - 0.353553).abs() < 1e-5);
        assert!((q6.w[centre] - 0.013161).abs() < 1e-5);
    }

    #[test]
    fn single_bond_has_unit_q() {
        let index = EdgeIndex::from_pairs([(0, 1)]);
        let params = steinhardt(&index, &[[0.3, -1.2, 0.7]], 2, &first_shell(6)).unwrap();
        assert!((params.q[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn nodes_without_neighbours_are_degenerate() {
        let (index, vecs, n) = star(&icosahedron());
        let params = steinhardt(&index, &vecs, n, &first_shell(6)).unwrap();
        assert_eq!(params.degenerate_nodes(), (0..n - 1).collect::<Vec<_>>());
        assert!(params.q[..n - 1].iter().all(|q| *q == 0.0));
    }

    #[test]
    fn cancelling_shell_is_degenerate() {
        let (index, vecs, n) = star(&icosahedron());
        let params = steinhardt(&index, &vecs, n, &first_shell(4)).unwrap();
        assert!(params.q[n - 1] < 1e-8);
        assert!(params.degenerate_nodes().contains(&(n - 1)));
    }

    #[test]
    fn second_shell_average_uses_neighbour_values() {
        // Two nodes bonded both ways: each node's second-shell value is its
        // neighbour's first-shell value.
        let index = EdgeIndex::from_pairs([(0, 1), (1, 0)]);
        let vecs = [[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]];
        let config = SteinhardtConfig { degree: 2, ..Default::default() };
        let smoothed = steinhardt(&index, &vecs, 2, &config).unwrap();
        let plain = steinhardt(&index, &vecs, 2, &first_shell(2)).unwrap();
        assert!((smoothed.q[0] - plain.q[1]).abs() < 1e-12);
        assert!((smoothed.q[1] - plain.q[0]).abs() < 1e-12);
    }

    #[test]
    fn high_degree_shell_keeps_finite_w() {
        let index = EdgeIndex::from_pairs([(0, 3), (1, 3), (2, 3)]);
        let vecs = [[1.0, 0.2, -0.3], [-0.4, 0.9, 0.1], [0.3, -0.5, 1.1]];
        let params = steinhardt(&index, &vecs, 4, &first_shell(40)).unwrap();
        assert!(params.q[3] > 0.0);
        assert!(params.w[3].is_finite());
        assert!(params.w[3].abs() <= 1.0 + 1e-6);
        assert_eq!(params.degenerate_nodes(), vec![0, 1, 2]);
    }

    #[test]
    fn rejects_invalid_inputs() {
        let index = EdgeIndex::from_pairs([(0, 3)]);
        assert!(matches!(
            steinhardt(&index, &[[1.0, 0.0, 0.0]], 2, &first_shell(6)),
            Err(Error::InvalidGraph(_))
        ));
        let index = EdgeIndex::from_pairs([(0, 1)]);
        assert!(steinhardt(&index, &[], 2, &first_shell(6)).is_err());
        let odd = SteinhardtConfig { parity: Parity::Odd, ..first_shell(6) };
        assert!(matches!(
            steinhardt(&index, &[[1.0, 0.0, 0.0]], 2, &odd),
            Err(Error::InconsistentParity(_))
        ));
    }
}
