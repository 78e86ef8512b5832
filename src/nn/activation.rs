use std::fmt;

use crate::o3::Parity;

/// Pointwise nonlinearity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Activation {
    /// `x * sigmoid(x)`.
    #[default]
    Silu,
    Tanh,
    Sigmoid,
    Identity,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Silu => x * sigmoid(x),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => sigmoid(x),
            Activation::Identity => x,
        }
    }

    /// `true` when `f(-x) = -f(x)`, i.e. the activation preserves odd parity.
    pub fn is_odd(self) -> bool {
        matches!(self, Activation::Tanh | Activation::Identity)
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Silu => write!(f, "silu"),
            Activation::Tanh => write!(f, "tanh"),
            Activation::Sigmoid => write!(f, "sigmoid"),
            Activation::Identity => write!(f, "identity"),
        }
    }
}

/// Activation applied to scalar channels of the given parity.
///
/// Odd scalars need an odd function to stay odd.
pub fn scalar_activation(parity: Parity) -> Activation {
    match parity {
        Parity::Even => Activation::Silu,
        Parity::Odd => Activation::Tanh,
    }
}

/// Activation applied to gate scalars of the given parity.
pub fn gate_activation(parity: Parity) -> Activation {
    match parity {
        Parity::Even => Activation::Sigmoid,
        Parity::Odd => Activation::Tanh,
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
