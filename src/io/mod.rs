//! Structure input.
//!
//! Only the XYZ format is read: a count line, a comment line, then one
//! `symbol x y z` line per atom. Extra columns are ignored.

pub mod error;
pub mod xyz;

pub use error::Error;

/// Atomic structure: element symbols and Cartesian positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    pub comment: String,
    pub symbols: Vec<String>,
    pub positions: Vec<[f64; 3]>,
}

impl Structure {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Maps symbols to dense species indices in order of first appearance.
    ///
    /// Returns the per-atom indices and the symbol of each index.
    pub fn species(&self) -> (Vec<usize>, Vec<String>) {
        let mut kinds: Vec<String> = Vec::new();
        let indices = self
            .symbols
            .iter()
            .map(|symbol| match kinds.iter().position(|k| k == symbol) {
                Some(idx) => idx,
                None => {
                    kinds.push(symbol.clone());
                    kinds.len() - 1
                }
            })
            .collect();
        (indices, kinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_follow_first_appearance() {
        let structure = Structure {
            comment: String::new(),
            symbols: ["O", "H", "H", "C", "O"].map(String::from).to_vec(),
            positions: vec![[0.0; 3]; 5],
        };
        let (indices, kinds) = structure.species();
        assert_eq!(indices, vec![0, 1, 1, 2, 0]);
        assert_eq!(kinds, vec!["O", "H", "C"]);
    }
}
