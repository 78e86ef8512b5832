//! Cell-list neighbour search and radius graphs.

use std::collections::HashMap;

use super::EdgeIndex;

/// Grid-based spatial index for 3D point queries.
///
/// Divides space into uniform cubic cells and stores point indices in each
/// cell. With a cell size of at least the query cutoff, every neighbour of
/// a point lies in the 27 cells around it.
#[derive(Debug)]
pub struct SpatialGrid {
    /// Inverse cell size for fast coordinate-to-cell conversion.
    inv_cell_size: f64,
    cells: HashMap<(i64, i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    /// Creates an empty grid with the given cell size.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size <= 0.0`.
    pub fn new(cell_size: f64) -> Self {
        assert!(cell_size > 0.0, "Cell size must be positive");
        Self {
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::new(),
        }
    }

    /// Creates a grid and inserts every position under its slice index.
    pub fn from_positions(positions: &[[f64; 3]], cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, pos) in positions.iter().enumerate() {
            grid.insert(idx, *pos);
        }
        grid
    }

    fn cell_coords(&self, pos: [f64; 3]) -> (i64, i64, i64) {
        (
            (pos[0] * self.inv_cell_size).floor() as i64,
            (pos[1] * self.inv_cell_size).floor() as i64,
            (pos[2] * self.inv_cell_size).floor() as i64,
        )
    }

    pub fn insert(&mut self, idx: usize, pos: [f64; 3]) {
        let cell = self.cell_coords(pos);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Indices of all stored points within `cutoff` of `query`, sorted.
    ///
    /// The query point itself is included if it is stored.
    pub fn query_radius(&self, query: [f64; 3], positions: &[[f64; 3]], cutoff: f64) -> Vec<usize> {
        let cutoff_sq = cutoff * cutoff;
        let (cx, cy, cz) = self.cell_coords(query);

        let mut results = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(indices) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &idx in indices {
                        if distance_sq(positions[idx], query) <= cutoff_sq {
                            results.push(idx);
                        }
                    }
                }
            }
        }
        results.sort_unstable();
        results
    }
}

fn distance_sq(a: [f64; 3], b: [f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Connects every ordered pair of distinct points within `cutoff`.
///
/// Each pair yields an edge `i → j` with displacement `pos[j] - pos[i]`.
/// Edges are sorted by destination, then source. A non-positive cutoff
/// gives an empty graph.
pub fn radius_graph(positions: &[[f64; 3]], cutoff: f64) -> (EdgeIndex, Vec<[f64; 3]>) {
    let mut edge_index = EdgeIndex::default();
    let mut edge_vec = Vec::new();
    if !(cutoff > 0.0) || positions.is_empty() {
        return (edge_index, edge_vec);
    }

    let grid = SpatialGrid::from_positions(positions, cutoff);
    for (dst, &centre) in positions.iter().enumerate() {
        for src in grid.query_radius(centre, positions, cutoff) {
            if src == dst {
                continue;
            }
            let from = positions[src];
            edge_index.src.push(src);
            edge_index.dst.push(dst);
            edge_vec.push([centre[0] - from[0], centre[1] - from[1], centre[2] - from[2]]);
        }
    }
    (edge_index, edge_vec)
}
