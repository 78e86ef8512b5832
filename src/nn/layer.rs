//! The layer capability shared by every feature transform, and ordered
//! composition of layers.

use std::fmt;

use ndarray::{Array2, ArrayView2};

use super::error::Error;
use crate::graph::EdgeIndex;
use crate::o3::Irreps;

/// Per-graph inputs reused unchanged by every layer of a network.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    /// `[num_nodes, irreps_node.dim()]`
    pub node_attr: ArrayView2<'a, f64>,
    pub edge_index: &'a EdgeIndex,
    /// Spherical harmonics of the edge vectors, `[num_edges, irreps_edge.dim()]`.
    pub edge_sh: ArrayView2<'a, f64>,
    /// Radial basis of the edge lengths, `[num_edges, num_basis]`.
    pub edge_radial: ArrayView2<'a, f64>,
}

impl MessageContext<'_> {
    pub fn num_nodes(&self) -> usize {
        self.node_attr.nrows()
    }
}

/// A transform of per-node features typed by `irreps_in` into per-node
/// features typed by `irreps_out`.
pub trait Layer: fmt::Debug + Send + Sync {
    fn irreps_in(&self) -> &Irreps;

    fn irreps_out(&self) -> &Irreps;

    fn forward(&self, x: ArrayView2<f64>, ctx: &MessageContext<'_>) -> Result<Array2<f64>, Error>;
}

/// Ordered list of layers applied one after another.
///
/// Every layer's `irreps_in` equals the previous layer's `irreps_out`.
#[derive(Debug)]
pub struct Sequential {
    irreps_in: Irreps,
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    /// An empty sequence acting as the identity on `irreps_in`.
    pub fn new(irreps_in: Irreps) -> Self {
        Self {
            irreps_in,
            layers: Vec::new(),
        }
    }

    /// Appends `layer`.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeMismatch`](Error::ShapeMismatch) if the layer does not
    /// accept the current output representation.
    pub fn push(&mut self, layer: Box<dyn Layer>) -> Result<(), Error> {
        let current = self.irreps_out();
        if layer.irreps_in() != current {
            return Err(Error::shape_mismatch(current, layer.irreps_in()));
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Builder form of [`push`](Self::push).
    pub fn then(mut self, layer: impl Layer + 'static) -> Result<Self, Error> {
        self.push(Box::new(layer))?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }
}

impl Layer for Sequential {
    fn irreps_in(&self) -> &Irreps {
        &self.irreps_in
    }

    fn irreps_out(&self) -> &Irreps {
        self.layers.last().map_or(&self.irreps_in, |l| l.irreps_out())
    }

    fn forward(&self, x: ArrayView2<f64>, ctx: &MessageContext<'_>) -> Result<Array2<f64>, Error> {
        Error::check_dim("sequential input", self.irreps_in.dim(), x.ncols())?;
        let mut h = x.to_owned();
        for layer in &self.layers {
            h = layer.forward(h.view(), ctx)?;
        }
        Ok(h)
    }
}
