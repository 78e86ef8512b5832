//! Equivariant and message-passing graph networks for atomistic and mesh data,
//! with the representation theory of O(3) they are built on.
//!
//! # Features
//!
//! - **Irreps algebra** — Parities, irreducible representations of O(3) and
//!   their direct sums, with the coupling rules that decide which
//!   tensor-product paths exist
//! - **NequIP** — An equivariant interatomic network whose representation
//!   chain is planned layer by layer from the requested hidden irreps
//! - **MeshGraphNets** — Residual node and edge processors for mesh graphs
//! - **Order parameters** — Steinhardt `q_l` and `w_l` bond-orientational
//!   descriptors
//!
//! # Quick Start
//!
//! Planning a network only needs irreps; building it draws the weights:
//!
//! ```
//! use graphite::graph::Graph;
//! use graphite::nn::{NequIP, NequipConfig, plan_layers};
//!
//! let config = NequipConfig {
//!     irreps_in: "8x0e".parse()?,
//!     irreps_hidden: "16x0e + 4x1e".parse()?,
//!     irreps_out: "1x0e".parse()?,
//!     num_convs: 3,
//!     ..Default::default()
//! };
//!
//! // Every hidden layer gates its vector channels with even scalars.
//! let plan = plan_layers(&config)?;
//! assert_eq!(plan.layers.len(), 2);
//! assert_eq!(plan.layers[0].interaction.irreps_out.to_string(), "16x0e+4x0e+4x1e");
//! assert_eq!(plan.layers[0].irreps_out.to_string(), "16x0e+4x1e");
//!
//! let model = NequIP::new(config)?;
//! let positions = [[0.0, 0.0, 0.0], [0.96, 0.0, 0.0], [-0.24, 0.93, 0.0]];
//! let graph = Graph::from_positions(vec![0, 0, 0], &positions, 3.0);
//! let energies = model.forward(&graph)?;
//! assert_eq!(energies.shape(), &[3, 1]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Organization
//!
//! - [`o3`] — Parity, irreps, spherical harmonics and Wigner 3-j tensors
//! - [`nn`] — Layers, models, configuration and order parameters
//! - [`graph`] — Graph records and radius-graph construction
//! - [`io`] — XYZ structure input

pub mod graph;
pub mod io;
pub mod nn;
pub mod o3;

pub use nn::{MeshGraphNetsConv, NequIP, NequipConfig, OrderParameters, SteinhardtConfig, steinhardt};
pub use o3::{Irrep, Irreps, Parity};
