//! Equivariant message-passing convolution.
//!
//! Node features are mixed with node attributes, coupled with the edge
//! spherical harmonics through a tensor product whose weights come from the
//! edge radial basis, summed onto destination nodes and mixed again. A
//! self-connection is blended in on every output channel it can reach.

use std::f64::consts::FRAC_PI_8;

use ndarray::{Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::activation::Activation;
use super::error::Error;
use super::layer::{Layer, MessageContext};
use super::mlp::RadialNet;
use super::scatter::scatter_sum;
use super::tensor_product::{FullyConnectedTensorProduct, Instruction, TensorProduct};
use crate::o3::{Irrep, Irreps, MulIr};

/// Everything needed to build one [`Interaction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSpec {
    pub irreps_in: Irreps,
    pub irreps_node: Irreps,
    pub irreps_edge: Irreps,
    pub irreps_out: Irreps,
    /// Radial network widths; the first entry is the number of radial basis
    /// functions, the tensor-product weight count is appended as the last.
    pub radial_neurons: Vec<usize>,
    /// Typical neighbour count; aggregated messages are divided by its
    /// square root.
    pub num_neighbors: f64,
}

impl InteractionSpec {
    /// Intermediate irreps and `uvu` instructions of the message tensor
    /// product.
    ///
    /// A path is kept when its output irrep appears in `irreps_out` or is
    /// the even scalar. The intermediate blocks are stably sorted by irrep
    /// and the instructions remapped accordingly.
    pub fn message_paths(&self) -> (Irreps, Vec<Instruction>) {
        let mut mid = Vec::new();
        let mut instructions = Vec::new();
        for (i, block_in) in self.irreps_in.iter().enumerate() {
            for (j, block_edge) in self.irreps_edge.iter().enumerate() {
                for ir_out in block_in.ir * block_edge.ir {
                    if self.irreps_out.contains(ir_out) || ir_out == Irrep::SCALAR_EVEN {
                        instructions.push(Instruction {
                            in1: i,
                            in2: j,
                            out: mid.len(),
                        });
                        mid.push(MulIr::new(block_in.mul, ir_out));
                    }
                }
            }
        }
        let (mid, perm) = Irreps::new(mid).sort();
        for ins in &mut instructions {
            ins.out = perm[ins.out];
        }
        (mid, instructions)
    }
}

/// Interaction layer producing features typed exactly by `irreps_out`.
#[derive(Debug, Clone)]
pub struct Interaction {
    spec: InteractionSpec,
    self_connection: FullyConnectedTensorProduct,
    lin1: FullyConnectedTensorProduct,
    tp: TensorProduct,
    radial: RadialNet,
    lin2: FullyConnectedTensorProduct,
    /// Per output column: weight of the self-connection and of the
    /// convolution branch.
    mix: Vec<(f64, f64)>,
}

impl Interaction {
    /// # Errors
    ///
    /// Returns [`InvalidConfig`](Error::InvalidConfig) for an empty radial
    /// network specification or a non-positive neighbour count.
    pub fn new(spec: &InteractionSpec, rng: &mut impl Rng) -> Result<Self, Error> {
        if spec.radial_neurons.is_empty() {
            return Err(Error::invalid_config("radial_neurons must name at least the basis size"));
        }
        if !(spec.num_neighbors > 0.0) {
            return Err(Error::invalid_config(format!(
                "num_neighbors must be positive, got {}",
                spec.num_neighbors
            )));
        }

        let self_connection =
            FullyConnectedTensorProduct::new(&spec.irreps_in, &spec.irreps_node, &spec.irreps_out, rng);
        let lin1 = FullyConnectedTensorProduct::new(&spec.irreps_in, &spec.irreps_node, &spec.irreps_in, rng);

        let (irreps_mid, instructions) = spec.message_paths();
        let tp = TensorProduct::new(&spec.irreps_in, &spec.irreps_edge, &irreps_mid, instructions)?;

        let mut neurons = spec.radial_neurons.clone();
        neurons.push(tp.weight_numel());
        let radial = RadialNet::new(&neurons, Activation::Silu, rng)?;

        let lin2 = FullyConnectedTensorProduct::new(&irreps_mid, &spec.irreps_node, &spec.irreps_out, rng);

        let (c_s, c_x) = (FRAC_PI_8.sin(), FRAC_PI_8.cos());
        let mix = self_connection
            .output_mask()
            .into_iter()
            .map(|reached| if reached { (c_s, c_x) } else { (0.0, 1.0) })
            .collect();

        Ok(Self {
            spec: spec.clone(),
            self_connection,
            lin1,
            tp,
            radial,
            lin2,
            mix,
        })
    }

    pub fn spec(&self) -> &InteractionSpec {
        &self.spec
    }

    pub fn irreps_mid(&self) -> &Irreps {
        self.tp.irreps_out()
    }

    pub fn num_basis(&self) -> usize {
        self.spec.radial_neurons[0]
    }
}

impl Layer for Interaction {
    fn irreps_in(&self) -> &Irreps {
        &self.spec.irreps_in
    }

    fn irreps_out(&self) -> &Irreps {
        &self.spec.irreps_out
    }

    fn forward(&self, x: ArrayView2<f64>, ctx: &MessageContext<'_>) -> Result<Array2<f64>, Error> {
        let num_nodes = ctx.num_nodes();
        Error::check_dim("interaction rows", num_nodes, x.nrows())?;
        Error::check_dim("edge harmonics rows", ctx.edge_index.len(), ctx.edge_sh.nrows())?;
        Error::check_dim("edge radial rows", ctx.edge_index.len(), ctx.edge_radial.nrows())?;

        let weights = self.radial.forward(ctx.edge_radial)?;
        let self_connection = self.self_connection.forward(x, ctx.node_attr)?;
        let features = self.lin1.forward(x, ctx.node_attr)?;

        let edge_features = features.select(Axis(0), &ctx.edge_index.src);
        let messages = self.tp.forward(edge_features.view(), ctx.edge_sh, weights.view())?;
        let mut aggregated = scatter_sum(messages.view(), &ctx.edge_index.dst, num_nodes)?;
        aggregated /= self.spec.num_neighbors.sqrt();

        let mut out = self.lin2.forward(aggregated.view(), ctx.node_attr)?;
        for (mut col, (sc_col, &(c_s, c_x))) in out
            .columns_mut()
            .into_iter()
            .zip(self_connection.columns().into_iter().zip(&self.mix))
        {
            col.zip_mut_with(&sc_col, |o, s| *o = c_s * s + c_x * *o);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeIndex;
    use crate::nn::radial::soft_one_hot_linspace;
    use crate::o3::{Normalization, spherical_harmonics};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn irreps(s: &str) -> Irreps {
        s.parse().unwrap()
    }

    fn spec(irreps_in: &str, irreps_out: &str) -> InteractionSpec {
        InteractionSpec {
            irreps_in: irreps(irreps_in),
            irreps_node: irreps("1x0e"),
            irreps_edge: irreps("1x0e + 1x1o + 1x2e"),
            irreps_out: irreps(irreps_out),
            radial_neurons: vec![8, 16],
            num_neighbors: 2.0,
        }
    }

    #[test]
    fn message_paths_keep_outputs_and_even_scalars() {
        let (mid, instructions) = spec("2x0e", "3x1o").message_paths();
        // 0e x 0e -> 0e (kept as even scalar), 0e x 1o -> 1o, 0e x 2e -> 2e dropped.
        assert_eq!(mid, irreps("2x0e + 2x1o"));
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[1], Instruction { in1: 0, in2: 1, out: 1 });
    }

    #[test]
    fn message_paths_are_sorted() {
        let (mid, instructions) = spec("2x1o + 3x0e", "1x0e + 1x1o").message_paths();
        let sorted = mid.sort().0;
        assert_eq!(mid, sorted);
        for ins in &instructions {
            assert!(ins.out < mid.len());
        }
    }

    fn context<'a>(
        edge_index: &'a EdgeIndex,
        node_attr: &'a Array2<f64>,
        sh: &'a Array2<f64>,
        radial: &'a Array2<f64>,
    ) -> MessageContext<'a> {
        MessageContext {
            node_attr: node_attr.view(),
            edge_index,
            edge_sh: sh.view(),
            edge_radial: radial.view(),
        }
    }

    #[test]
    fn output_shape_follows_irreps_out() {
        let mut rng = StdRng::seed_from_u64(11);
        let layer = Interaction::new(&spec("4x0e", "2x0e + 1x1o"), &mut rng).unwrap();

        let edge_index = EdgeIndex::from_pairs([(0, 1), (1, 0), (2, 1)]);
        let vectors = [[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [0.3, 0.8, -0.2]];
        let sh = spherical_harmonics(&layer.spec().irreps_edge, &vectors, true, Normalization::Component).unwrap();
        let lengths: Vec<f64> = vectors.iter().map(|v| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()).collect();
        let radial = soft_one_hot_linspace(&lengths, 0.0, 3.0, 8);
        let node_attr = Array2::ones((3, 1));
        let x = Array2::from_shape_fn((3, 4), |(i, j)| (i + j) as f64 * 0.1);

        let out = layer.forward(x.view(), &context(&edge_index, &node_attr, &sh, &radial)).unwrap();
        assert_eq!(out.shape(), &[3, 5]);
    }

    #[test]
    fn isolated_nodes_keep_only_self_connection() {
        let mut rng = StdRng::seed_from_u64(3);
        let layer = Interaction::new(&spec("2x0e", "2x0e"), &mut rng).unwrap();
        let edge_index = EdgeIndex::default();
        let node_attr = Array2::ones((2, 1));
        let sh = Array2::zeros((0, 9));
        let radial = Array2::zeros((0, 8));
        let x = Array2::from_shape_fn((2, 2), |(i, j)| 1.0 + (i * 2 + j) as f64);

        let out = layer.forward(x.view(), &context(&edge_index, &node_attr, &sh, &radial)).unwrap();
        let sc = layer.self_connection.forward(x.view(), node_attr.view()).unwrap();
        for (o, s) in out.iter().zip(sc.iter()) {
            assert!((o - FRAC_PI_8.sin() * s).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_mismatched_edge_features() {
        let mut rng = StdRng::seed_from_u64(3);
        let layer = Interaction::new(&spec("2x0e", "2x0e"), &mut rng).unwrap();
        let edge_index = EdgeIndex::from_pairs([(0, 1)]);
        let node_attr = Array2::ones((2, 1));
        let sh = Array2::zeros((2, 9));
        let radial = Array2::zeros((1, 8));
        let x = Array2::zeros((2, 2));
        assert!(layer.forward(x.view(), &context(&edge_index, &node_attr, &sh, &radial)).is_err());
    }

    #[test]
    fn rejects_bad_spec() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut bad = spec("1x0e", "1x0e");
        bad.radial_neurons.clear();
        assert!(Interaction::new(&bad, &mut rng).is_err());
        let mut bad = spec("1x0e", "1x0e");
        bad.num_neighbors = 0.0;
        assert!(Interaction::new(&bad, &mut rng).is_err());
    }
}
