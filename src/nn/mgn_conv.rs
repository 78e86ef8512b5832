//! MeshGraphNets node and edge processors.
//!
//! One convolution first updates every edge from its endpoints and its own
//! features, then updates every node from the sum of its updated edges.
//! Both updates are residual and layer-normalised. A single edge set is
//! supported.

use std::fmt;

use ndarray::{Array2, ArrayView2, Axis, concatenate};
use rand::Rng;

use super::activation::Activation;
use super::error::Error;
use super::mlp::{LayerNorm, Mlp};
use super::scatter::scatter_sum;
use crate::graph::EdgeIndex;

/// `LayerNorm(MLP(x_i ‖ x_j ‖ e)) + e`
#[derive(Debug, Clone)]
pub struct EdgeProcessor {
    mlp: Mlp,
    norm: LayerNorm,
}

impl EdgeProcessor {
    /// `hs` lists the input, hidden and output widths of the MLP.
    pub fn new(hs: &[usize], rng: &mut impl Rng) -> Result<Self, Error> {
        let mlp = Mlp::new(hs, Activation::Silu, rng)?;
        let norm = LayerNorm::new(mlp.out_features());
        Ok(Self { mlp, norm })
    }

    pub fn forward(
        &self,
        x_i: ArrayView2<f64>,
        x_j: ArrayView2<f64>,
        edge_attr: ArrayView2<f64>,
    ) -> Result<Array2<f64>, Error> {
        let input = concatenate(Axis(1), &[x_i.view(), x_j.view(), edge_attr.view()])
            .map_err(|e| Error::invalid_graph(format!("edge processor inputs: {e}")))?;
        let out = self.norm.forward(self.mlp.forward(input.view())?.view())?;
        Error::check_dim("edge processor residual", out.ncols(), edge_attr.ncols())?;
        Ok(out + edge_attr)
    }
}

/// `LayerNorm(MLP(x ‖ Σ_{edges into i} e)) + x`, summing over edges by
/// their first index.
#[derive(Debug, Clone)]
pub struct NodeProcessor {
    mlp: Mlp,
    norm: LayerNorm,
}

impl NodeProcessor {
    /// `hs` lists the input, hidden and output widths of the MLP.
    pub fn new(hs: &[usize], rng: &mut impl Rng) -> Result<Self, Error> {
        let mlp = Mlp::new(hs, Activation::Silu, rng)?;
        let norm = LayerNorm::new(mlp.out_features());
        Ok(Self { mlp, norm })
    }

    pub fn forward(
        &self,
        x: ArrayView2<f64>,
        edge_index: &EdgeIndex,
        edge_attr: ArrayView2<f64>,
    ) -> Result<Array2<f64>, Error> {
        let aggregated = scatter_sum(edge_attr, &edge_index.src, x.nrows())?;
        let input = concatenate(Axis(1), &[x.view(), aggregated.view()])
            .map_err(|e| Error::invalid_graph(format!("node processor inputs: {e}")))?;
        let out = self.norm.forward(self.mlp.forward(input.view())?.view())?;
        Error::check_dim("node processor residual", out.ncols(), x.ncols())?;
        Ok(out + x)
    }
}

/// Graph convolution equivalent to the MeshGraphNets processor block.
#[derive(Debug, Clone)]
pub struct MeshGraphNetsConv {
    node_dim: usize,
    edge_dim: usize,
    edge_processor: EdgeProcessor,
    node_processor: NodeProcessor,
}

impl MeshGraphNetsConv {
    /// Builds processors with three-layer MLPs:
    /// edges `[2n + e, e, e, e]`, nodes `[n + e, n, n, n]`.
    pub fn new(node_dim: usize, edge_dim: usize, rng: &mut impl Rng) -> Result<Self, Error> {
        if node_dim == 0 || edge_dim == 0 {
            return Err(Error::invalid_config(format!(
                "node_dim and edge_dim must be positive, got {node_dim} and {edge_dim}"
            )));
        }
        let edge_processor = EdgeProcessor::new(&[2 * node_dim + edge_dim, edge_dim, edge_dim, edge_dim], rng)?;
        let node_processor = NodeProcessor::new(&[node_dim + edge_dim, node_dim, node_dim, node_dim], rng)?;
        Ok(Self {
            node_dim,
            edge_dim,
            edge_processor,
            node_processor,
        })
    }

    pub fn node_dim(&self) -> usize {
        self.node_dim
    }

    pub fn edge_dim(&self) -> usize {
        self.edge_dim
    }

    /// Returns the updated `(node features, edge features)`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidGraph`](Error::InvalidGraph) for indices outside the
    /// node set and [`DimensionMismatch`](Error::DimensionMismatch) for
    /// feature widths other than `node_dim` / `edge_dim`.
    pub fn forward(
        &self,
        x: ArrayView2<f64>,
        edge_index: &EdgeIndex,
        edge_attr: ArrayView2<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>), Error> {
        Error::check_dim("node features", self.node_dim, x.ncols())?;
        Error::check_dim("edge features", self.edge_dim, edge_attr.ncols())?;
        Error::check_dim("edge feature rows", edge_index.len(), edge_attr.nrows())?;
        edge_index.validate(x.nrows())?;

        let x_i = x.select(Axis(0), &edge_index.src);
        let x_j = x.select(Axis(0), &edge_index.dst);
        let edge_attr = self.edge_processor.forward(x_i.view(), x_j.view(), edge_attr)?;
        let x = self.node_processor.forward(x, edge_index, edge_attr.view())?;
        Ok((x, edge_attr))
    }
}

impl fmt::Display for MeshGraphNetsConv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MeshGraphNetsConv(node_dim={}, edge_dim={})",
            self.node_dim, self.edge_dim
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn shapes_are_preserved() {
        let mut rng = StdRng::seed_from_u64(2);
        let conv = MeshGraphNetsConv::new(4, 3, &mut rng).unwrap();
        let x = Array2::from_shape_fn((3, 4), |(i, j)| (i as f64 - j as f64) * 0.3);
        let edges = EdgeIndex::from_pairs([(0, 1), (1, 2), (2, 0), (1, 0)]);
        let e = Array2::from_shape_fn((4, 3), |(i, j)| (i * j) as f64 * 0.1);

        let (x_out, e_out) = conv.forward(x.view(), &edges, e.view()).unwrap();
        assert_eq!(x_out.shape(), &[3, 4]);
        assert_eq!(e_out.shape(), &[4, 3]);
    }

    #[test]
    fn isolated_node_update_is_residual() {
        let mut rng = StdRng::seed_from_u64(2);
        let conv = MeshGraphNetsConv::new(2, 2, &mut rng).unwrap();
        let x = Array2::from_shape_fn((1, 2), |(_, j)| j as f64);
        let e = Array2::zeros((0, 2));
        let (x_out, e_out) = conv.forward(x.view(), &EdgeIndex::default(), e.view()).unwrap();
        assert_eq!(e_out.nrows(), 0);

        let expected = conv
            .node_processor
            .norm
            .forward(
                conv.node_processor
                    .mlp
                    .forward(ndarray::array![[0.0, 1.0, 0.0, 0.0]].view())
                    .unwrap()
                    .view(),
            )
            .unwrap()
            + &x;
        for (a, b) in x_out.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn edge_update_is_residual_over_concatenated_inputs() {
        let mut rng = StdRng::seed_from_u64(4);
        let processor = EdgeProcessor::new(&[5, 3, 1], &mut rng).unwrap();
        let x_i = ndarray::array![[0.5, -1.0], [2.0, 0.0]];
        let x_j = ndarray::array![[1.5, 0.25], [-0.5, 1.0]];
        let stacked = ndarray::array![[9.0, 0.1], [9.0, -0.2], [9.0, 0.4]];
        let e = stacked.slice(ndarray::s![1.., 1..]);

        let out = processor.forward(x_i.view(), x_j.view(), e).unwrap();

        let joined = ndarray::array![[0.5, -1.0, 1.5, 0.25, -0.2], [2.0, 0.0, -0.5, 1.0, 0.4]];
        let expected = processor
            .norm
            .forward(processor.mlp.forward(joined.view()).unwrap().view())
            .unwrap()
            + &e;
        for (a, b) in out.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_wrong_widths() {
        let mut rng = StdRng::seed_from_u64(2);
        let conv = MeshGraphNetsConv::new(2, 2, &mut rng).unwrap();
        let x = Array2::zeros((2, 3));
        let e = Array2::zeros((1, 2));
        let edges = EdgeIndex::from_pairs([(0, 1)]);
        assert!(matches!(
            conv.forward(x.view(), &edges, e.view()),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(MeshGraphNetsConv::new(0, 2, &mut rng).is_err());
    }

    #[test]
    fn display_names_dimensions() {
        let mut rng = StdRng::seed_from_u64(0);
        let conv = MeshGraphNetsConv::new(8, 5, &mut rng).unwrap();
        assert_eq!(conv.to_string(), "MeshGraphNetsConv(node_dim=8, edge_dim=5)");
    }
}
