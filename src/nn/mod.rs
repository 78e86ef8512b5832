//! Neural-network layers and models.
//!
//! # Overview
//!
//! - [`NequIP`] — equivariant interatomic network built from a
//!   [`NequipConfig`], with its representation chain planned by
//!   [`plan_layers`]
//! - [`Interaction`] and [`Gate`] — the equivariant convolution and the gated
//!   nonlinearity, composed through the [`Layer`] trait and [`Sequential`]
//! - [`MeshGraphNetsConv`] — MeshGraphNets node/edge processors
//! - [`steinhardt`] — bond-orientational order parameters
//! - Building blocks: tensor products, MLPs, radial basis, scatter
//!   reductions

mod activation;
mod assembler;
mod config;
mod error;
mod gate;
mod init;
mod interaction;
mod layer;
mod mgn_conv;
mod mlp;
mod nequip;
mod order;
mod radial;
mod scatter;
mod tensor_product;

pub use activation::{Activation, gate_activation, scalar_activation};
pub use assembler::{
    LayerPlan, NetworkPlan, gate_irreps, partition, plan_layers, resolve_gate_parity,
    tp_path_exists,
};
pub use config::{NequipConfig, SteinhardtConfig};
pub use error::Error;
pub use gate::Gate;
pub use interaction::{Interaction, InteractionSpec};
pub use layer::{Layer, MessageContext, Sequential};
pub use mgn_conv::{EdgeProcessor, MeshGraphNetsConv, NodeProcessor};
pub use mlp::{Embedding, LayerNorm, Linear, Mlp, RadialNet};
pub use nequip::NequIP;
pub use order::{OrderParameters, steinhardt};
pub use radial::soft_one_hot_linspace;
pub use scatter::{scatter_mean, scatter_sum};
pub use tensor_product::{FullyConnectedTensorProduct, Instruction, TensorProduct};
