//! Planning of the NequIP representation chain.
//!
//! The planner works on irreps alone. For every hidden layer it keeps the
//! requested hidden components that the current features can reach through
//! the edge harmonics, chooses a gate parity when higher-degree channels
//! need gating, and asks the layer's interaction for exactly the gate's
//! input representation. The gate's output becomes the next layer's input.

use tracing::{debug, info, warn};

use super::config::NequipConfig;
use super::error::Error;
use super::gate::Gate;
use super::interaction::InteractionSpec;
use super::layer::Layer;
use crate::o3::{Irrep, Irreps, MulIr, Parity};

/// `true` if some pair of labels of `irreps_in1` and `irreps_in2` couples
/// to `ir_out`. Empty inputs never produce a path.
pub fn tp_path_exists(irreps_in1: &Irreps, irreps_in2: &Irreps, ir_out: Irrep) -> bool {
    let irreps_in1 = irreps_in1.simplify();
    let irreps_in2 = irreps_in2.simplify();
    irreps_in1
        .iter()
        .any(|b1| irreps_in2.iter().any(|b2| (b1.ir * b2.ir).contains(ir_out)))
}

/// Splits the hidden irreps into realizable `(scalars, gated)` parts.
///
/// Components that `irreps × irreps_edge` cannot produce are dropped.
pub fn partition(irreps_hidden: &Irreps, irreps: &Irreps, irreps_edge: &Irreps) -> (Irreps, Irreps) {
    let reachable = |b: &MulIr| tp_path_exists(irreps, irreps_edge, b.ir);
    let scalars = irreps_hidden.filter(|b| b.ir.l == 0 && reachable(b));
    let gated = irreps_hidden.filter(|b| b.ir.l > 0 && reachable(b));
    (scalars, gated)
}

/// Parity of the gate scalars: even if `irreps_node × irreps_edge` reaches
/// `0e`, otherwise odd if it reaches `0o`.
///
/// # Errors
///
/// Returns [`GateParity`](Error::GateParity) when neither scalar is
/// reachable. `irreps_in` and `irreps_gated` only feed the message.
pub fn resolve_gate_parity(
    irreps_in: &Irreps,
    irreps_node: &Irreps,
    irreps_edge: &Irreps,
    irreps_gated: &Irreps,
) -> Result<Parity, Error> {
    [Parity::Even, Parity::Odd]
        .into_iter()
        .find(|&p| tp_path_exists(irreps_node, irreps_edge, Irrep::new(0, p)))
        .ok_or_else(|| Error::GateParity {
            irreps_in: irreps_in.clone(),
            irreps_node: irreps_node.clone(),
            irreps_edge: irreps_edge.clone(),
            irreps_gated: irreps_gated.clone(),
        })
}

/// One gate scalar of parity `p` per gated irrep copy, simplified.
pub fn gate_irreps(irreps_gated: &Irreps, parity: Option<Parity>) -> Irreps {
    match parity {
        Some(p) => irreps_gated
            .iter()
            .map(|b| MulIr::new(b.mul, Irrep::new(0, p)))
            .collect::<Irreps>()
            .simplify(),
        None => Irreps::empty(),
    }
}

/// Plan of one hidden layer: an interaction followed by a gate.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPlan {
    pub interaction: InteractionSpec,
    pub scalars: Irreps,
    pub gates: Irreps,
    pub gated: Irreps,
    /// `None` when no channel needs gating.
    pub gate_parity: Option<Parity>,
    /// Representation produced by the gate.
    pub irreps_out: Irreps,
}

/// The whole representation chain of a network.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkPlan {
    pub layers: Vec<LayerPlan>,
    /// Final interaction producing `irreps_out`.
    pub output: InteractionSpec,
}

impl NetworkPlan {
    /// Input representation of every interaction, first to last.
    pub fn irreps_chain(&self) -> impl Iterator<Item = &Irreps> {
        self.layers
            .iter()
            .map(|l| &l.interaction.irreps_in)
            .chain(std::iter::once(&self.output.irreps_in))
    }
}

/// Runs the representation-chain construction on a configuration.
///
/// # Errors
///
/// Returns [`GateParity`](Error::GateParity) if a hidden layer needs gates
/// that no scalar of `irreps_node × irreps_edge` can provide, or
/// [`InvalidGate`](Error::InvalidGate) if the gate cannot be formed.
pub fn plan_layers(config: &NequipConfig) -> Result<NetworkPlan, Error> {
    let spec = |irreps_in: &Irreps, irreps_out: &Irreps| InteractionSpec {
        irreps_in: irreps_in.clone(),
        irreps_node: config.irreps_node.clone(),
        irreps_edge: config.irreps_edge.clone(),
        irreps_out: irreps_out.clone(),
        radial_neurons: config.radial_neurons.clone(),
        num_neighbors: config.num_neighbors,
    };

    let mut irreps = config.irreps_in.clone();
    let mut layers = Vec::with_capacity(config.num_convs.saturating_sub(1));

    for index in 0..config.num_convs.saturating_sub(1) {
        let (scalars, gated) = partition(&config.irreps_hidden, &irreps, &config.irreps_edge);

        let dropped = config
            .irreps_hidden
            .filter(|b| !scalars.blocks().contains(b) && !gated.blocks().contains(b));
        if !dropped.is_empty() {
            debug!(layer = index, irreps = %irreps, dropped = %dropped, "hidden components not reachable");
        }
        if scalars.dim() + gated.dim() == 0 {
            warn!(layer = index, irreps = %irreps, "hidden layer realizes no components");
        }

        let gate_parity = if gated.dim() > 0 {
            Some(resolve_gate_parity(&irreps, &config.irreps_node, &config.irreps_edge, &gated)?)
        } else {
            None
        };
        let gates = gate_irreps(&gated, gate_parity);
        let gate = Gate::with_parity_activations(&scalars, &gates, &gated)?;

        let interaction = spec(&irreps, gate.irreps_in());
        let irreps_out = gate.irreps_out().clone();
        debug!(
            layer = index,
            irreps_in = %irreps,
            irreps_conv = %interaction.irreps_out,
            irreps_out = %irreps_out,
            "planned hidden layer"
        );

        irreps = irreps_out.clone();
        layers.push(LayerPlan {
            interaction,
            scalars,
            gates,
            gated,
            gate_parity,
            irreps_out,
        });
    }

    let output = spec(&irreps, &config.irreps_out);
    info!(
        layers = layers.len() + 1,
        irreps_in = %config.irreps_in,
        irreps_out = %config.irreps_out,
        "planned network"
    );
    Ok(NetworkPlan { layers, output })
}
