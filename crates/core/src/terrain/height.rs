use crate::util;
use anyhow::{anyhow, ensure};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A square `n×n` buffer of elevation values, stored as one contiguous
/// row-major arena. Cells are addressed by `(row, col)`.
///
/// Note that this is a different indexing domain from the mesh lattice: the
/// lattice has `n+1` points per side, while this has `n` cells per side. See
/// [GridMesh::apply_heights](crate::GridMesh::apply_heights) for how the two
/// line up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHeightMap")]
pub struct HeightMap {
    size: usize,
    cells: Vec<f64>,
}

/// Deserialization target for [HeightMap], so the cell count can be checked
/// against the size before any indexing happens
#[derive(Deserialize)]
struct RawHeightMap {
    size: usize,
    cells: Vec<f64>,
}

impl TryFrom<RawHeightMap> for HeightMap {
    type Error = anyhow::Error;

    fn try_from(raw: RawHeightMap) -> Result<Self, Self::Error> {
        let RawHeightMap { size, cells } = raw;
        let expected = size
            .checked_mul(size)
            .ok_or_else(|| anyhow!("height map size {} is too large", size))?;
        ensure!(
            cells.len() == expected,
            "expected {} cells for size {}, got {}",
            expected,
            size,
            cells.len()
        );
        Ok(Self { size, cells })
    }
}

impl HeightMap {
    /// Create a new height map with every cell at zero
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0.0; size * size],
        }
    }

    /// Number of cells along each side
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the value of a single cell. Returns `None` if the coordinate is
    /// outside the map.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.size && col < self.size {
            Some(self.cells[util::flat_index(row, col, self.size)])
        } else {
            None
        }
    }

    /// All cells, in row-major order
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// Iterate over every cell as `((row, col), value)`, in row-major order
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, value)| ((i / size, i % size), *value))
    }

    /// Get the lowest and highest values in the map, or `None` if the map is
    /// empty
    pub fn extremes(&self) -> Option<(f64, f64)> {
        self.cells.iter().fold(None, |acc, &value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
    }
}

impl Index<(usize, usize)> for HeightMap {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        debug_assert!(
            row < self.size && col < self.size,
            "({}, {}) out of bounds for size {}",
            row,
            col,
            self.size
        );
        &self.cells[util::flat_index(row, col, self.size)]
    }
}

impl IndexMut<(usize, usize)> for HeightMap {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        debug_assert!(
            row < self.size && col < self.size,
            "({}, {}) out of bounds for size {}",
            row,
            col,
            self.size
        );
        &mut self.cells[util::flat_index(row, col, self.size)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let heights = HeightMap::new(4);
        assert_eq!(heights.size(), 4);
        assert_eq!(heights.cells().len(), 16);
        assert!(heights.cells().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_index() {
        let mut heights = HeightMap::new(3);
        heights[(1, 2)] = 5.0;
        heights[(2, 0)] = -1.5;

        assert_eq!(heights[(1, 2)], 5.0);
        assert_eq!(heights.get(2, 0), Some(-1.5));
        // Row-major layout
        assert_eq!(heights.cells()[5], 5.0);
        assert_eq!(heights.cells()[6], -1.5);

        assert_eq!(heights.get(3, 0), None);
        assert_eq!(heights.get(0, 3), None);
    }

    #[test]
    fn test_iter() {
        let mut heights = HeightMap::new(2);
        heights[(1, 0)] = 3.0;
        let cells: Vec<_> = heights.iter().collect();
        assert_eq!(
            cells,
            vec![((0, 0), 0.0), ((0, 1), 0.0), ((1, 0), 3.0), ((1, 1), 0.0)]
        );
    }

    #[test]
    fn test_extremes() {
        assert_eq!(HeightMap::new(0).extremes(), None);

        let mut heights = HeightMap::new(2);
        heights[(0, 1)] = 4.0;
        heights[(1, 1)] = -2.0;
        assert_eq!(heights.extremes(), Some((-2.0, 4.0)));
    }

    #[test]
    fn test_deserialize() {
        let mut heights = HeightMap::new(2);
        heights[(1, 0)] = 0.1;
        let loaded: HeightMap =
            serde_json::from_str(&serde_json::to_string(&heights).unwrap())
                .unwrap();
        assert_eq!(loaded, heights);
    }

    #[test]
    fn test_deserialize_wrong_cell_count() {
        let err = serde_json::from_str::<HeightMap>(
            r#"{"size": 2, "cells": [0.0]}"#,
        )
        .unwrap_err();
        assert!(
            err.to_string().contains("expected 4 cells for size 2, got 1"),
            "{}",
            err
        );

        let too_large = format!(r#"{{"size": {}, "cells": []}}"#, usize::MAX);
        assert!(serde_json::from_str::<HeightMap>(&too_large).is_err());
    }
}
