//! Representation theory of O(3).
//!
//! - [`Parity`] and [`Irrep`] label how a quantity transforms under
//!   rotations and inversion.
//! - [`Irreps`] describes the layout of a feature vector as a direct sum of
//!   irreps, with the coupling rules used to decide which tensor-product
//!   paths exist.
//! - [`spherical_harmonics`] and [`wigner_3j`] are the numeric primitives
//!   expressed in one shared real basis.

mod irrep;
mod irreps;
mod parity;
mod spherical_harmonics;
mod wigner;

pub use irrep::{Couplings, Irrep, ParseIrrepError};
pub use irreps::{Irreps, MulIr, ParseIrrepsError};
pub use parity::Parity;
pub use spherical_harmonics::{
    Normalization, ParityConventionError, real_harmonics, spherical_harmonics,
};
pub use wigner::{three_j_symbol, wigner_3j};
