//! The NequIP interatomic network.

use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use super::assembler::{NetworkPlan, plan_layers};
use super::config::NequipConfig;
use super::error::Error;
use super::gate::Gate;
use super::interaction::Interaction;
use super::layer::{Layer, MessageContext, Sequential};
use super::mlp::Embedding;
use super::radial::soft_one_hot_linspace;
use crate::graph::Graph;
use crate::o3::{Irreps, Normalization, spherical_harmonics};

/// Equivariant message-passing network over atomistic graphs.
///
/// Built once from a [`NequipConfig`]: the representation chain is planned,
/// every interaction is paired with its gate, and all weights are drawn
/// from a generator seeded by `config.seed`.
///
/// # Examples
///
/// ```
/// use graphite::graph::Graph;
/// use graphite::nn::{NequIP, NequipConfig};
///
/// let config = NequipConfig {
///     irreps_in: "8x0e".parse().unwrap(),
///     irreps_hidden: "8x0e + 2x1e".parse().unwrap(),
///     num_convs: 2,
///     ..Default::default()
/// };
/// let model = NequIP::new(config).unwrap();
///
/// let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.2, 0.0]];
/// let graph = Graph::from_positions(vec![0, 0, 0], &positions, 3.0);
/// let out = model.forward(&graph).unwrap();
/// assert_eq!(out.shape(), &[3, 4]);
/// ```
#[derive(Debug)]
pub struct NequIP {
    config: NequipConfig,
    plan: NetworkPlan,
    embedding: Embedding,
    network: Sequential,
}

impl NequIP {
    /// # Errors
    ///
    /// Fails if the configuration is invalid, if the edge irreps are not
    /// spherical harmonics, or if the representation chain cannot be
    /// planned (see [`plan_layers`]).
    pub fn new(config: NequipConfig) -> Result<Self, Error> {
        config.validate()?;
        spherical_harmonics(&config.irreps_edge, &[], true, Normalization::Component)?;
        let plan = plan_layers(&config)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let embedding = Embedding::new(config.num_species, config.irreps_in.dim(), &mut rng);

        let mut network = Sequential::new(config.irreps_in.clone());
        for (index, layer) in plan.layers.iter().enumerate() {
            let interaction = Interaction::new(&layer.interaction, &mut rng)?;
            debug!(
                layer = index,
                irreps_mid = %interaction.irreps_mid(),
                "built interaction"
            );
            let gate = Gate::with_parity_activations(&layer.scalars, &layer.gates, &layer.gated)?;
            let block = Sequential::new(layer.interaction.irreps_in.clone())
                .then(interaction)?
                .then(gate)?;
            network.push(Box::new(block))?;
        }
        network.push(Box::new(Interaction::new(&plan.output, &mut rng)?))?;

        info!(
            layers = network.len(),
            irreps_in = %config.irreps_in,
            irreps_out = %config.irreps_out,
            seed = config.seed,
            "built NequIP"
        );

        Ok(Self {
            config,
            plan,
            embedding,
            network,
        })
    }

    pub fn config(&self) -> &NequipConfig {
        &self.config
    }

    pub fn plan(&self) -> &NetworkPlan {
        &self.plan
    }

    /// Composed `interaction → gate` blocks followed by the output
    /// interaction.
    pub fn layers(&self) -> &[Box<dyn Layer>] {
        self.network.layers()
    }

    pub fn irreps_out(&self) -> &Irreps {
        self.network.irreps_out()
    }

    /// Per-node outputs typed by `irreps_out`, one row per node.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidGraph`](Error::InvalidGraph) for malformed graphs or
    /// species outside the embedding table.
    pub fn forward(&self, graph: &Graph) -> Result<Array2<f64>, Error> {
        let node_dim = self.config.irreps_node.dim();
        graph.validate(node_dim)?;

        let x = self.embedding.forward(&graph.species)?;
        let node_attr = graph.node_attr_or_ones(node_dim);

        let lengths: Vec<f64> = graph
            .edge_vec
            .iter()
            .map(|v| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt())
            .collect();
        let edge_radial =
            soft_one_hot_linspace(&lengths, 0.0, self.config.max_radius, self.config.num_edge_basis());
        let edge_sh = spherical_harmonics(&self.config.irreps_edge, &graph.edge_vec, true, Normalization::Component)?;

        let ctx = MessageContext {
            node_attr: node_attr.view(),
            edge_index: &graph.edge_index,
            edge_sh: edge_sh.view(),
            edge_radial: edge_radial.view(),
        };
        self.network.forward(x.view(), &ctx)
    }
}
