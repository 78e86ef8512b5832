//! Model and featurizer configuration.
//!
//! - [`NequipConfig`] — hyperparameters of the NequIP network
//! - [`SteinhardtConfig`] — settings of the Steinhardt order parameters

use serde::{Deserialize, Serialize};

use super::error::Error;
use crate::o3::{Irreps, Parity};

/// Hyperparameters of a [`NequIP`](super::NequIP) network.
///
/// Every field has a default, so a TOML document only needs the values it
/// changes.
///
/// # Examples
///
/// ```
/// use graphite::nn::NequipConfig;
///
/// let config = NequipConfig::from_toml_str(r#"
///     irreps_hidden = "32x0e + 8x1o"
///     num_convs = 2
/// "#).unwrap();
/// assert_eq!(config.num_convs, 2);
/// assert_eq!(config.irreps_out.to_string(), "4x0e");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NequipConfig {
    /// Irreps of the species embedding; must be scalar-only.
    pub irreps_in: Irreps,
    /// Requested irreps of the hidden layers.
    pub irreps_hidden: Irreps,
    pub irreps_out: Irreps,
    /// Irreps of the node attributes, constant through the network.
    pub irreps_node: Irreps,
    /// Irreps of the edge spherical harmonics.
    pub irreps_edge: Irreps,
    /// Number of interaction layers, including the output layer.
    pub num_convs: usize,
    /// Radial network widths; the first entry is the number of radial
    /// basis functions.
    pub radial_neurons: Vec<usize>,
    pub num_species: usize,
    /// Cutoff radius of the radial basis.
    pub max_radius: f64,
    /// Typical node degree, used to normalise aggregated messages.
    pub num_neighbors: f64,
    /// Seed of the parameter initialisation.
    pub seed: u64,
}

impl Default for NequipConfig {
    fn default() -> Self {
        let parse = |s: &str| s.parse::<Irreps>().unwrap_or_default();
        Self {
            irreps_in: parse("64x0e"),
            irreps_hidden: parse("128x0e + 16x1e"),
            irreps_out: parse("4x0e"),
            irreps_node: parse("1x0e"),
            irreps_edge: parse("1x0e + 1x1e + 1x2e"),
            num_convs: 3,
            radial_neurons: vec![16, 64],
            num_species: 1,
            max_radius: 3.15,
            num_neighbors: 12.0,
            seed: 0,
        }
    }
}

impl NequipConfig {
    /// Parses a TOML document, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigParse`](Error::ConfigParse) for malformed TOML or
    /// irreps strings.
    pub fn from_toml_str(toml: &str) -> Result<Self, Error> {
        Ok(toml::from_str(toml)?)
    }

    /// Number of radial basis functions on each edge.
    pub fn num_edge_basis(&self) -> usize {
        self.radial_neurons.first().copied().unwrap_or(0)
    }

    /// Checks the values the network builder relies on.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig`](Error::InvalidConfig) naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.num_convs == 0 {
            return Err(Error::invalid_config("num_convs must be at least 1"));
        }
        if self.radial_neurons.is_empty() || self.radial_neurons.contains(&0) {
            return Err(Error::invalid_config(format!(
                "radial_neurons must be non-empty with non-zero widths, got {:?}",
                self.radial_neurons
            )));
        }
        if !(self.max_radius > 0.0) {
            return Err(Error::invalid_config(format!(
                "max_radius must be positive, got {}",
                self.max_radius
            )));
        }
        if self.num_species == 0 {
            return Err(Error::invalid_config("num_species must be at least 1"));
        }
        if !(self.num_neighbors > 0.0) {
            return Err(Error::invalid_config(format!(
                "num_neighbors must be positive, got {}",
                self.num_neighbors
            )));
        }
        if self.irreps_in.is_empty() || !self.irreps_in.is_scalar() {
            return Err(Error::invalid_config(format!(
                "irreps_in must be a non-empty set of scalars, got '{}'",
                self.irreps_in
            )));
        }
        Ok(())
    }
}

/// Settings of [`steinhardt`](super::steinhardt).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteinhardtConfig {
    /// Spherical-harmonic degree `l`.
    pub degree: u32,
    /// Parity of the projected harmonics.
    pub parity: Parity,
    /// Average the per-node projections once more over neighbours.
    pub second_shell_average: bool,
}

impl Default for SteinhardtConfig {
    fn default() -> Self {
        Self {
            degree: 6,
            parity: Parity::Even,
            second_shell_average: true,
        }
    }
}
