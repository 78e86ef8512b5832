use std::fmt;
use std::ops::{Add, Range};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::irrep::{Irrep, ParseIrrepError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIrrepsError {
    #[error("invalid multiplicity in '{0}'")]
    Multiplicity(String),

    #[error(transparent)]
    Irrep(#[from] ParseIrrepError),

    #[error("empty term in irreps '{0}'")]
    EmptyTerm(String),
}

/// A block of `mul` copies of the same irrep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MulIr {
    pub mul: u32,
    pub ir: Irrep,
}

impl MulIr {
    pub fn new(mul: u32, ir: Irrep) -> Self {
        Self { mul, ir }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.mul as usize * self.ir.dim()
    }
}

impl fmt::Display for MulIr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.mul, self.ir)
    }
}

/// Ordered direct sum of irreps, e.g. `"128x0e + 16x1o"`.
///
/// The order of the blocks is the memory layout of the features the value
/// describes: the first `blocks[0].dim()` columns belong to the first block,
/// and so on. Values are immutable; every operation returns a new `Irreps`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Irreps {
    blocks: Vec<MulIr>,
}

impl Irreps {
    pub fn new(blocks: Vec<MulIr>) -> Self {
        Self { blocks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A single block of `mul` copies of `ir`.
    pub fn single(mul: u32, ir: Irrep) -> Self {
        Self::new(vec![MulIr::new(mul, ir)])
    }

    /// Spherical harmonics up to degree `lmax`, one copy each (`1x0e + 1x1o + ...`).
    pub fn spherical_harmonics(lmax: u32) -> Self {
        Self::new((0..=lmax).map(|l| MulIr::new(1, Irrep::spherical(l))).collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MulIr> {
        self.blocks.iter()
    }

    pub fn blocks(&self) -> &[MulIr] {
        &self.blocks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// `true` when the value describes zero-dimensional features.
    pub fn is_empty(&self) -> bool {
        self.dim() == 0
    }

    /// Total feature dimension, `sum(mul * (2l + 1))`.
    pub fn dim(&self) -> usize {
        self.blocks.iter().map(MulIr::dim).sum()
    }

    /// Total number of irrep copies, `sum(mul)`.
    pub fn num_irreps(&self) -> usize {
        self.blocks.iter().map(|b| b.mul as usize).sum()
    }

    pub fn lmax(&self) -> Option<u32> {
        self.blocks.iter().map(|b| b.ir.l).max()
    }

    /// `true` when every block is a degree-0 irrep.
    pub fn is_scalar(&self) -> bool {
        self.blocks.iter().all(|b| b.ir.is_scalar())
    }

    pub fn contains(&self, ir: Irrep) -> bool {
        self.blocks.iter().any(|b| b.ir == ir && b.mul > 0)
    }

    /// Number of copies of `ir` across all blocks.
    pub fn count(&self, ir: Irrep) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.ir == ir)
            .map(|b| b.mul as usize)
            .sum()
    }

    /// Merges every duplicate label into one block, in order of first appearance.
    ///
    /// Blocks of multiplicity zero are dropped.
    pub fn simplify(&self) -> Self {
        let mut merged: Vec<MulIr> = Vec::with_capacity(self.blocks.len());
        for block in self.blocks.iter().filter(|b| b.mul > 0) {
            match merged.iter_mut().find(|m| m.ir == block.ir) {
                Some(existing) => existing.mul += block.mul,
                None => merged.push(*block),
            }
        }
        Self::new(merged)
    }

    /// Stable sort of the blocks by irrep.
    ///
    /// Returns the sorted value together with `perm`, where `perm[i]` is the
    /// new position of block `i`.
    pub fn sort(&self) -> (Self, Vec<usize>) {
        let mut order: Vec<usize> = (0..self.blocks.len()).collect();
        order.sort_by_key(|&i| self.blocks[i].ir);

        let mut perm = vec![0; self.blocks.len()];
        for (new_pos, &old_pos) in order.iter().enumerate() {
            perm[old_pos] = new_pos;
        }
        let sorted = order.iter().map(|&i| self.blocks[i]).collect();
        (Self::new(sorted), perm)
    }

    pub fn filter(&self, mut keep: impl FnMut(&MulIr) -> bool) -> Self {
        Self::new(self.blocks.iter().copied().filter(|b| keep(b)).collect())
    }

    /// Column ranges occupied by each block in a feature row.
    pub fn slices(&self) -> Vec<Range<usize>> {
        let mut offset = 0;
        self.blocks
            .iter()
            .map(|b| {
                let start = offset;
                offset += b.dim();
                start..offset
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Irreps {
    type Item = &'a MulIr;
    type IntoIter = std::slice::Iter<'a, MulIr>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl FromIterator<MulIr> for Irreps {
    fn from_iter<T: IntoIterator<Item = MulIr>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<Irrep> for Irreps {
    fn from(ir: Irrep) -> Self {
        Self::single(1, ir)
    }
}

impl Add for &Irreps {
    type Output = Irreps;

    fn add(self, rhs: &Irreps) -> Irreps {
        let mut blocks = self.blocks.clone();
        blocks.extend_from_slice(&rhs.blocks);
        Irreps::new(blocks)
    }
}

impl Add for Irreps {
    type Output = Irreps;

    fn add(mut self, rhs: Irreps) -> Irreps {
        self.blocks.extend(rhs.blocks);
        self
    }
}

impl fmt::Display for Irreps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                write!(f, "+")?;
            }
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

impl FromStr for Irreps {
    type Err = ParseIrrepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::empty());
        }

        s.split('+')
            .map(|term| {
                let term = term.trim();
                if term.is_empty() {
                    return Err(ParseIrrepsError::EmptyTerm(s.to_string()));
                }
                match term.split_once('x') {
                    Some((mul, ir)) => {
                        let mul: u32 = mul
                            .trim()
                            .parse()
                            .map_err(|_| ParseIrrepsError::Multiplicity(term.to_string()))?;
                        Ok(MulIr::new(mul, ir.parse()?))
                    }
                    None => Ok(MulIr::new(1, term.parse()?)),
                }
            })
            .collect()
    }
}

impl TryFrom<String> for Irreps {
    type Error = ParseIrrepsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Irreps> for String {
    fn from(value: Irreps) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::o3::Parity;

    fn irreps(s: &str) -> Irreps {
        s.parse().unwrap()
    }

    #[test]
    fn parses_common_forms() {
        let parsed = irreps("128x0e + 16x1o");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.blocks()[0], MulIr::new(128, Irrep::SCALAR_EVEN));
        assert_eq!(parsed.blocks()[1], MulIr::new(16, Irrep::new(1, Parity::Odd)));

        assert_eq!(irreps("0e+1e"), irreps("1x0e + 1x1e"));
        assert!(irreps("").is_empty());
        assert_eq!(irreps("  ").len(), 0);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            "ax0e".parse::<Irreps>(),
            Err(ParseIrrepsError::Multiplicity(_))
        ));
        assert!(matches!(
            "1x0e + ".parse::<Irreps>(),
            Err(ParseIrrepsError::EmptyTerm(_))
        ));
        assert!(matches!("2x7q".parse::<Irreps>(), Err(ParseIrrepsError::Irrep(_))));
    }

    #[test]
    fn display_round_trips() {
        let original = irreps("64x0e + 16x1o + 4x2e");
        assert_eq!(original.to_string(), "64x0e+16x1o+4x2e");
        assert_eq!(irreps(&original.to_string()), original);
    }

    #[test]
    fn dimensions_and_counts() {
        let value = irreps("8x0e + 4x1o + 2x2e");
        assert_eq!(value.dim(), 8 + 12 + 10);
        assert_eq!(value.num_irreps(), 14);
        assert_eq!(value.lmax(), Some(2));
        assert!(!value.is_scalar());
        assert!(irreps("3x0e + 0o").is_scalar());
        assert_eq!(Irreps::empty().lmax(), None);
    }

    #[test]
    fn simplify_merges_all_duplicates() {
        let value = irreps("1x0e + 2x1e + 3x0e + 0x2e + 1x1e");
        assert_eq!(value.simplify(), irreps("4x0e + 3x1e"));
        assert_eq!(value.simplify().simplify(), value.simplify());
    }

    #[test]
    fn contains_ignores_empty_blocks() {
        let value = irreps("0x1e + 2x0o");
        assert!(!value.contains(Irrep::new(1, Parity::Even)));
        assert!(value.contains(Irrep::SCALAR_ODD));
        assert_eq!(value.count(Irrep::SCALAR_ODD), 2);
    }

    #[test]
    fn slices_cover_feature_dimension() {
        let value = irreps("2x0e + 1x1o + 1x2e");
        assert_eq!(value.slices(), vec![0..2, 2..5, 5..10]);
    }

    #[test]
    fn sort_is_stable_and_reports_permutation() {
        let value = irreps("1x1o + 2x0e + 3x1o + 1x0e");
        let (sorted, perm) = value.sort();
        assert_eq!(sorted, irreps("2x0e + 1x0e + 1x1o + 3x1o"));
        assert_eq!(perm, vec![2, 0, 3, 1]);
    }

    #[test]
    fn concatenation_preserves_order() {
        let a = irreps("4x0e");
        let b = irreps("2x1o");
        assert_eq!(&a + &b, irreps("4x0e + 2x1o"));
        assert_eq!(b + a, irreps("2x1o + 4x0e"));
    }

    #[test]
    fn spherical_harmonics_irreps() {
        assert_eq!(Irreps::spherical_harmonics(2), irreps("1x0e + 1x1o + 1x2e"));
    }

    #[test]
    fn serde_uses_textual_form() {
        #[derive(Deserialize)]
        struct Holder {
            irreps: Irreps,
        }
        let holder: Holder = toml::from_str(r#"irreps = "2x0e + 1x1o""#).unwrap();
        assert_eq!(holder.irreps, irreps("2x0e + 1x1o"));

        let bad: Result<Holder, _> = toml::from_str(r#"irreps = "2x0q""#);
        assert!(bad.is_err());
    }
}
