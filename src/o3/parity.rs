use std::fmt;
use std::ops::Mul;

/// Behaviour of a representation under spatial inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parity {
    /// Unchanged under inversion (`p = +1`).
    Even,
    /// Sign flip under inversion (`p = -1`).
    Odd,
}

impl Parity {
    /// Parity of the spherical harmonics of degree `l`, i.e. `(-1)^l`.
    pub fn of_degree(l: u32) -> Self {
        if l % 2 == 0 { Parity::Even } else { Parity::Odd }
    }

    pub fn sign(self) -> i32 {
        match self {
            Parity::Even => 1,
            Parity::Odd => -1,
        }
    }

    pub fn from_sign(sign: i32) -> Option<Self> {
        match sign {
            1 => Some(Parity::Even),
            -1 => Some(Parity::Odd),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Parity::Even => 'e',
            Parity::Odd => 'o',
        }
    }
}

impl Mul for Parity {
    type Output = Parity;

    fn mul(self, rhs: Parity) -> Parity {
        if self == rhs { Parity::Even } else { Parity::Odd }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}
