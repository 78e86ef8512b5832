use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

use thiserror::Error;

use super::parity::Parity;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid irreducible representation: '{0}'")]
pub struct ParseIrrepError(String);

/// Irreducible representation of O(3): a degree `l` and a parity `p`.
///
/// The textual form is `"<l><p>"` with `p` one of `e` (even), `o` (odd) or
/// `y` (the parity of the spherical harmonics of that degree, `(-1)^l`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Irrep {
    pub l: u32,
    pub p: Parity,
}

impl Irrep {
    pub const SCALAR_EVEN: Irrep = Irrep { l: 0, p: Parity::Even };
    pub const SCALAR_ODD: Irrep = Irrep { l: 0, p: Parity::Odd };

    pub fn new(l: u32, p: Parity) -> Self {
        Self { l, p }
    }

    /// Irrep of the spherical harmonics of degree `l`.
    pub fn spherical(l: u32) -> Self {
        Self::new(l, Parity::of_degree(l))
    }

    #[inline]
    pub fn dim(&self) -> usize {
        2 * self.l as usize + 1
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.l == 0
    }
}

/// The irreps reachable by coupling two irreps, in increasing degree.
#[derive(Debug, Clone)]
pub struct Couplings {
    next: u32,
    last: u32,
    p: Parity,
}

impl Couplings {
    pub fn contains(&self, ir: Irrep) -> bool {
        ir.p == self.p && (self.next..=self.last).contains(&ir.l)
    }
}

impl Iterator for Couplings {
    type Item = Irrep;

    fn next(&mut self) -> Option<Irrep> {
        if self.next > self.last {
            return None;
        }
        let ir = Irrep::new(self.next, self.p);
        self.next += 1;
        Some(ir)
    }
}

impl Mul for Irrep {
    type Output = Couplings;

    fn mul(self, rhs: Irrep) -> Couplings {
        Couplings {
            next: self.l.abs_diff(rhs.l),
            last: self.l + rhs.l,
            p: self.p * rhs.p,
        }
    }
}

impl fmt::Display for Irrep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.l, self.p)
    }
}

impl FromStr for Irrep {
    type Err = ParseIrrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ParseIrrepError(s.to_string());

        let mut chars = trimmed.chars();
        let letter = chars.next_back().ok_or_else(err)?;
        let l: u32 = chars.as_str().parse().map_err(|_| err())?;
        let p = match letter {
            'e' => Parity::Even,
            'o' => Parity::Odd,
            'y' => Parity::of_degree(l),
            _ => return Err(err()),
        };
        Ok(Irrep::new(l, p))
    }
}
