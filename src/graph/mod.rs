//! Graph records consumed by the models.
//!
//! A [`Graph`] bundles per-node species, optional per-node attributes, the
//! connectivity and per-edge displacement vectors. Edges are directed
//! `src → dst`; messages flow from `src` into `dst`.

mod spatial;

pub use spatial::{SpatialGrid, radius_graph};

use ndarray::Array2;

use crate::nn::Error;

/// Directed connectivity as two equal-length index sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeIndex {
    pub src: Vec<usize>,
    pub dst: Vec<usize>,
}

impl EdgeIndex {
    /// # Errors
    ///
    /// Returns [`InvalidGraph`](Error::InvalidGraph) if the sequences differ
    /// in length.
    pub fn new(src: Vec<usize>, dst: Vec<usize>) -> Result<Self, Error> {
        if src.len() != dst.len() {
            return Err(Error::invalid_graph(format!(
                "edge index rows differ in length ({} vs {})",
                src.len(),
                dst.len()
            )));
        }
        Ok(Self { src, dst })
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let (src, dst) = pairs.into_iter().unzip();
        Self { src, dst }
    }

    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.src.iter().copied().zip(self.dst.iter().copied())
    }

    /// Checks that both rows have equal length and every index is below
    /// `num_nodes`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidGraph`](Error::InvalidGraph) on the first violation.
    pub fn validate(&self, num_nodes: usize) -> Result<(), Error> {
        if self.src.len() != self.dst.len() {
            return Err(Error::invalid_graph(format!(
                "edge index rows differ in length ({} vs {})",
                self.src.len(),
                self.dst.len()
            )));
        }
        if let Some((e, (s, d))) = self
            .iter()
            .enumerate()
            .find(|(_, (s, d))| *s >= num_nodes || *d >= num_nodes)
        {
            return Err(Error::invalid_graph(format!(
                "edge {e} ({s} -> {d}) references a node outside 0..{num_nodes}"
            )));
        }
        Ok(())
    }
}

/// Atomistic graph: one row per node, one displacement per edge.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub species: Vec<usize>,
    /// Per-node attributes; `None` means a uniform weight of one.
    pub node_attr: Option<Array2<f64>>,
    pub edge_index: EdgeIndex,
    /// `pos[dst] - pos[src]` for every edge.
    pub edge_vec: Vec<[f64; 3]>,
}

impl Graph {
    pub fn new(species: Vec<usize>, edge_index: EdgeIndex, edge_vec: Vec<[f64; 3]>) -> Self {
        Self {
            species,
            node_attr: None,
            edge_index,
            edge_vec,
        }
    }

    /// Builds a graph from positions by connecting all pairs within `cutoff`.
    pub fn from_positions(species: Vec<usize>, positions: &[[f64; 3]], cutoff: f64) -> Self {
        let (edge_index, edge_vec) = radius_graph(positions, cutoff);
        Self::new(species, edge_index, edge_vec)
    }

    pub fn with_node_attr(mut self, node_attr: Array2<f64>) -> Self {
        self.node_attr = Some(node_attr);
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.species.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_index.len()
    }

    /// Checks the record is internally consistent.
    ///
    /// `node_attr_dim` is the attribute width the consumer expects.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidGraph`](Error::InvalidGraph) for out-of-range edge
    /// indices, an edge vector count that differs from the edge count, or
    /// attributes of the wrong shape.
    pub fn validate(&self, node_attr_dim: usize) -> Result<(), Error> {
        self.edge_index.validate(self.num_nodes())?;
        if self.edge_vec.len() != self.num_edges() {
            return Err(Error::invalid_graph(format!(
                "{} edge vectors for {} edges",
                self.edge_vec.len(),
                self.num_edges()
            )));
        }
        if let Some(attr) = &self.node_attr {
            let expected = [self.num_nodes(), node_attr_dim];
            if attr.shape() != expected {
                return Err(Error::invalid_graph(format!(
                    "node attributes have shape {:?}, expected {expected:?}",
                    attr.shape()
                )));
            }
        }
        Ok(())
    }

    /// Node attributes, or a column of ones per attribute channel.
    pub fn node_attr_or_ones(&self, dim: usize) -> Array2<f64> {
        match &self.node_attr {
            Some(attr) => attr.clone(),
            None => Array2::ones((self.num_nodes(), dim)),
        }
    }
}
