//! Error types for model construction and evaluation.
//!
//! Construction errors are raised eagerly by the model builders and are
//! fatal: a network whose representation chain cannot be assembled is never
//! returned. Evaluation errors report inputs that do not match the shapes
//! the model was built for.

use thiserror::Error;

use crate::o3::{Irreps, ParityConventionError, ParseIrrepsError};

/// Errors that can occur while building or running a network.
#[derive(Debug, Error)]
pub enum Error {
    /// No scalar gate irrep is reachable for the gated channels of a layer.
    ///
    /// Occurs when neither `0e` nor `0o` appears in
    /// `irreps_node × irreps_edge` while the layer needs gates.
    #[error(
        "irreps={irreps_in} with irreps_node={irreps_node} times irreps_edge={irreps_edge} is unable to produce gates needed for irreps_gated={irreps_gated}"
    )]
    GateParity {
        /// Input irreps of the layer being built.
        irreps_in: Irreps,
        /// Node attribute irreps.
        irreps_node: Irreps,
        /// Edge (spherical harmonics) irreps.
        irreps_edge: Irreps,
        /// The gated channels that required gates.
        irreps_gated: Irreps,
    },

    /// Invalid model or layer configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Inconsistent gate definition.
    #[error("invalid gate: {0}")]
    InvalidGate(String),

    /// Two layers or a layer and its input disagree on the feature layout.
    #[error("irreps mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Irreps the consumer was built for.
        expected: Irreps,
        /// Irreps actually supplied.
        got: Irreps,
    },

    /// Input arrays do not match the declared feature dimension.
    #[error("dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Which input was checked.
        what: &'static str,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// The graph record is malformed (indices out of range, ragged arrays).
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// Spherical harmonics were requested with mixed parity conventions.
    #[error(transparent)]
    InconsistentParity(#[from] ParityConventionError),

    /// Failed to parse an irreps string.
    #[error("failed to parse irreps: {0}")]
    Irreps(#[from] ParseIrrepsError),

    /// Failed to parse a TOML configuration.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    /// Creates an [`InvalidConfig`](Error::InvalidConfig) error.
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig(details.into())
    }

    /// Creates an [`InvalidGraph`](Error::InvalidGraph) error.
    pub fn invalid_graph(details: impl Into<String>) -> Self {
        Self::InvalidGraph(details.into())
    }

    /// Creates a [`ShapeMismatch`](Error::ShapeMismatch) error.
    pub fn shape_mismatch(expected: &Irreps, got: &Irreps) -> Self {
        Self::ShapeMismatch {
            expected: expected.clone(),
            got: got.clone(),
        }
    }

    /// Checks `got == expected` for an input dimension.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionMismatch`](Error::DimensionMismatch) otherwise.
    pub fn check_dim(what: &'static str, expected: usize, got: usize) -> Result<(), Self> {
        if expected == got {
            Ok(())
        } else {
            Err(Self::DimensionMismatch {
                what,
                expected,
                got,
            })
        }
    }
}
