//! Dense building blocks: linear layers, MLPs, layer normalisation,
//! the radial weight network and species embeddings.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use super::activation::Activation;
use super::error::Error;
use super::init::{linear_params, normal_matrix};

/// Affine map `x W + b`.
#[derive(Debug, Clone)]
pub struct Linear {
    weight: Array2<f64>,
    bias: Array1<f64>,
}

impl Linear {
    pub fn new(in_features: usize, out_features: usize, rng: &mut impl Rng) -> Self {
        let (weight, bias) = linear_params(rng, in_features, out_features);
        Self { weight, bias }
    }

    pub fn in_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn out_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn forward(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, Error> {
        Error::check_dim("linear input", self.in_features(), x.ncols())?;
        Ok(x.dot(&self.weight) + &self.bias)
    }
}

/// Multilayer perceptron over the widths `hs = [in, hidden..., out]`.
///
/// The activation follows every layer except the last.
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Linear>,
    act: Activation,
}

impl Mlp {
    /// # Errors
    ///
    /// Returns [`InvalidConfig`](Error::InvalidConfig) if fewer than two
    /// widths are given.
    pub fn new(hs: &[usize], act: Activation, rng: &mut impl Rng) -> Result<Self, Error> {
        if hs.len() < 2 {
            return Err(Error::invalid_config(format!(
                "an MLP needs at least an input and an output width, got {hs:?}"
            )));
        }
        let layers = hs.windows(2).map(|w| Linear::new(w[0], w[1], rng)).collect();
        Ok(Self { layers, act })
    }

    pub fn in_features(&self) -> usize {
        self.layers[0].in_features()
    }

    pub fn out_features(&self) -> usize {
        self.layers[self.layers.len() - 1].out_features()
    }

    pub fn forward(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, Error> {
        let act = self.act;
        let mut h = self.layers[0].forward(x)?;
        for layer in &self.layers[1..] {
            h.mapv_inplace(|v| act.apply(v));
            h = layer.forward(h.view())?;
        }
        Ok(h)
    }
}

/// Normalises each row to zero mean and unit variance, then applies a
/// learnable per-feature affine map (initialised to the identity).
#[derive(Debug, Clone)]
pub struct LayerNorm {
    gamma: Array1<f64>,
    beta: Array1<f64>,
    eps: f64,
}

impl LayerNorm {
    pub fn new(dim: usize) -> Self {
        Self {
            gamma: Array1::ones(dim),
            beta: Array1::zeros(dim),
            eps: 1e-5,
        }
    }

    pub fn forward(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, Error> {
        Error::check_dim("layer norm input", self.gamma.len(), x.ncols())?;
        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            let n = row.len().max(1) as f64;
            let mean = row.sum() / n;
            let var = row.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let inv_std = 1.0 / (var + self.eps).sqrt();
            for (k, v) in row.iter_mut().enumerate() {
                *v = (*v - mean) * inv_std * self.gamma[k] + self.beta[k];
            }
        }
        Ok(out)
    }
}

/// Bias-free fully connected network producing per-edge tensor-product
/// weights from radial features.
///
/// Each layer computes `act(h W / sqrt(fan_in))` with standard-normal `W`;
/// the last layer has no activation.
#[derive(Debug, Clone)]
pub struct RadialNet {
    weights: Vec<Array2<f64>>,
    act: Activation,
}

impl RadialNet {
    /// # Errors
    ///
    /// Returns [`InvalidConfig`](Error::InvalidConfig) for fewer than two
    /// widths or a zero input width.
    pub fn new(neurons: &[usize], act: Activation, rng: &mut impl Rng) -> Result<Self, Error> {
        if neurons.len() < 2 || neurons[0] == 0 {
            return Err(Error::invalid_config(format!(
                "radial network widths {neurons:?} need a non-zero input and an output"
            )));
        }
        let weights = neurons
            .windows(2)
            .map(|w| normal_matrix(rng, w[0], w[1]))
            .collect();
        Ok(Self { weights, act })
    }

    pub fn out_features(&self) -> usize {
        self.weights.last().map_or(0, |w| w.ncols())
    }

    pub fn forward(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, Error> {
        Error::check_dim("radial network input", self.weights[0].nrows(), x.ncols())?;
        let last = self.weights.len() - 1;
        let mut h = x.to_owned();
        for (idx, w) in self.weights.iter().enumerate() {
            let scale = 1.0 / (w.nrows().max(1) as f64).sqrt();
            h = h.dot(w) * scale;
            if idx < last {
                let act = self.act;
                h.mapv_inplace(|v| act.apply(v));
            }
        }
        Ok(h)
    }
}

/// Lookup table from species index to a feature row.
#[derive(Debug, Clone)]
pub struct Embedding {
    table: Array2<f64>,
}

impl Embedding {
    pub fn new(num_species: usize, dim: usize, rng: &mut impl Rng) -> Self {
        Self {
            table: normal_matrix(rng, num_species, dim),
        }
    }

    pub fn num_species(&self) -> usize {
        self.table.nrows()
    }

    pub fn dim(&self) -> usize {
        self.table.ncols()
    }

    /// # Errors
    ///
    /// Returns [`InvalidGraph`](Error::InvalidGraph) for an index outside
    /// the table.
    pub fn forward(&self, species: &[usize]) -> Result<Array2<f64>, Error> {
        if let Some(bad) = species.iter().find(|&&s| s >= self.num_species()) {
            return Err(Error::invalid_graph(format!(
                "species index {bad} out of range for {} species",
                self.num_species()
            )));
        }
        Ok(self.table.select(Axis(0), species))
    }
}
