//! Height synthesis via the diamond-square algorithm.
//!
//! The algorithm makes repeated passes over a [HeightMap]. Each level works
//! at a particular stride (called `depth` here):
//! - The **diamond** pass visits every `depth×depth` cell and sets its center
//!   to the average of the cell's 4 corners, plus some random jitter
//! - The **square** pass then sets the midpoints of two of each cell's edges,
//!   averaging the corners and centers on either side of that edge, again
//!   plus jitter
//!
//! After each level, both the stride and the jitter range are halved, so
//! each level adds finer, quieter detail than the last. The stride halves with
//! floor division, so recursion always bottoms out at a stride of 0.
//!
//! https://en.wikipedia.org/wiki/Diamond-square_algorithm

use crate::HeightMap;
use log::debug;
use rand::Rng;

/// Jitter multipliers. One of these is picked uniformly each time jitter is
/// applied, then multiplied by a uniform `[0, 1)` sample and the current
/// range. Note that the ±2 values mean jitter can reach _twice_ the range.
pub const JITTER_SCALES: [f64; 4] = [-1.0, 1.0, -2.0, 2.0];

/// Fill the given height map with diamond-square. The map is refined in
/// place, so any pre-existing values act as seeds (a fresh map is all zeros).
/// The given RNG is the only source of randomness, so a seeded RNG gives
/// reproducible terrain.
///
/// `range` is the maximum jitter magnitude for the first level.
pub fn synthesize<R: Rng + ?Sized>(
    heights: &mut HeightMap,
    range: f64,
    rng: &mut R,
) {
    let size = heights.size();
    let region = Region {
        min_row: 0,
        min_col: 0,
        max_row: size,
        max_col: size,
    };
    let levels = diamond_square(heights, region, range, size, rng);
    debug!("Diamond-square ran {} levels on {}×{} map", levels, size, size);
}

/// Rectangle of the height map that passes iterate over. Max bounds are
/// exclusive.
#[derive(Copy, Clone, Debug)]
struct Region {
    min_row: usize,
    min_col: usize,
    max_row: usize,
    max_col: usize,
}

/// Run one level of diamond-square, then recurse onto the next level. Returns
/// the number of levels that did work, including this one.
fn diamond_square<R: Rng + ?Sized>(
    heights: &mut HeightMap,
    region: Region,
    range: f64,
    depth: usize,
    rng: &mut R,
) -> usize {
    if depth < 1 {
        return 0;
    }

    diamond_pass(heights, region, range, depth, rng);
    square_pass(heights, region, range, depth, rng);
    1 + diamond_square(heights, region, range / 2.0, depth / 2, rng)
}

/// Set the center of every `depth×depth` cell in the region to the average of
/// its corners, plus jitter. Cells are identified by their max corner
/// `(i, j)`, so the min corner is `(i - depth, j - depth)`.
fn diamond_pass<R: Rng + ?Sized>(
    heights: &mut HeightMap,
    region: Region,
    range: f64,
    depth: usize,
    rng: &mut R,
) {
    let half = depth / 2;
    for i in (region.min_row + depth..region.max_row).step_by(depth) {
        for j in (region.min_col + depth..region.max_col).step_by(depth) {
            let corners = heights[(i - depth, j - depth)]
                + heights[(i, j - depth)]
                + heights[(i - depth, j)]
                + heights[(i, j)];
            let scale = jitter_scale(rng);
            heights[(i - half, j - half)] =
                corners / 4.0 + rng.gen::<f64>() * range * scale;
        }
    }
}

/// Set two edge midpoints for every cell in the region, using the cell's
/// corners, the cell's center (from the diamond pass) and the center of the
/// neighboring cell across that edge. Only cells that _have_ a neighbor on
/// both the row and column side are visited, which is why iteration starts at
/// `2 * depth`.
///
/// Both midpoints of a cell share one jitter scale, but each gets its own
/// magnitude sample.
fn square_pass<R: Rng + ?Sized>(
    heights: &mut HeightMap,
    region: Region,
    range: f64,
    depth: usize,
    rng: &mut R,
) {
    let half = depth / 2;
    for i in (region.min_row + 2 * depth..region.max_row).step_by(depth) {
        for j in (region.min_col + 2 * depth..region.max_col).step_by(depth) {
            let min_corner = heights[(i - depth, j - depth)];
            let row_corner = heights[(i, j - depth)];
            let col_corner = heights[(i - depth, j)];
            let center = heights[(i - half, j - half)];
            let prev_row_center = heights[(i - 3 * half, j - half)];
            let prev_col_center = heights[(i - half, j - 3 * half)];

            let scale = jitter_scale(rng);
            let row_edge = (min_corner + col_corner + center + prev_row_center)
                / 4.0
                + rng.gen::<f64>() * range * scale;
            let col_edge = (min_corner + row_corner + center + prev_col_center)
                / 4.0
                + rng.gen::<f64>() * range * scale;

            heights[(i - depth, j - half)] = row_edge;
            heights[(i - half, j - depth)] = col_edge;
        }
    }
}

/// Pick one of the [JITTER_SCALES] uniformly
fn jitter_scale<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    JITTER_SCALES[rng.gen_range(0..JITTER_SCALES.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use std::collections::HashSet;

    fn full_region(size: usize) -> Region {
        Region {
            min_row: 0,
            min_col: 0,
            max_row: size,
            max_col: size,
        }
    }

    /// Fill a map with values that are easy to tell apart: `row*10 + col²`.
    /// Non-linear, so a neighbor average never matches the value it replaces.
    fn numbered_map(size: usize) -> HeightMap {
        let mut heights = HeightMap::new(size);
        for row in 0..size {
            for col in 0..size {
                heights[(row, col)] = (row * 10 + col * col) as f64;
            }
        }
        heights
    }

    /// No range + all zeros means nothing can ever become non-zero
    #[test]
    fn test_zero_range_stays_flat() {
        let mut rng = Pcg64::seed_from_u64(0);
        for size in [1, 2, 4, 7, 16] {
            let mut heights = HeightMap::new(size);
            synthesize(&mut heights, 0.0, &mut rng);
            assert_eq!(heights, HeightMap::new(size), "size {}", size);
        }
    }

    /// With no jitter, a diamond pass across the whole map just averages the
    /// four outer corners into the center
    #[test]
    fn test_diamond_pass_center_is_corner_mean() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut heights = HeightMap::new(5);
        heights[(0, 0)] = 1.0;
        heights[(4, 0)] = 2.0;
        heights[(0, 4)] = 3.0;
        heights[(4, 4)] = 6.0;

        diamond_pass(&mut heights, full_region(5), 0.0, 4, &mut rng);
        assert_eq!(heights[(2, 2)], 3.0);

        // Nothing else was touched
        let touched = heights.iter().filter(|(_, v)| *v != 0.0).count();
        assert_eq!(touched, 5);
    }

    #[test]
    fn test_square_pass_edge_is_neighbor_mean() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut heights = numbered_map(5);
        let before = heights.clone();

        // Only one cell qualifies, with max corner (4, 4)
        square_pass(&mut heights, full_region(5), 0.0, 2, &mut rng);
        // Neighbors of (2,3): (2,2) (2,4) (3,3) (1,3)
        assert_eq!(heights[(2, 3)], (24.0 + 36.0 + 39.0 + 19.0) / 4.0);
        // Neighbors of (3,2): (2,2) (4,2) (3,3) (3,1)
        assert_eq!(heights[(3, 2)], (24.0 + 44.0 + 39.0 + 31.0) / 4.0);

        let changed: Vec<_> = heights
            .iter()
            .filter(|((row, col), value)| before[(*row, *col)] != *value)
            .map(|(pos, _)| pos)
            .collect();
        assert_eq!(changed, vec![(2, 3), (3, 2)]);
    }

    /// The square pass has nothing to do until there's room for two cells on
    /// each axis
    #[test]
    fn test_square_pass_small_map_noop() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut heights = numbered_map(4);
        square_pass(&mut heights, full_region(4), 1.0, 2, &mut rng);
        assert_eq!(heights, numbered_map(4));
    }

    /// Levels run at strides n, n/2, ..., 1, then stop
    #[test]
    fn test_recursion_terminates() {
        let mut rng = Pcg64::seed_from_u64(0);
        assert_eq!(
            diamond_square(
                &mut HeightMap::new(0),
                full_region(0),
                1.0,
                0,
                &mut rng
            ),
            0
        );

        for size in 1..=70usize {
            let mut heights = HeightMap::new(size);
            let levels = diamond_square(
                &mut heights,
                full_region(size),
                1.0,
                size,
                &mut rng,
            );
            let expected = (usize::BITS - size.leading_zeros()) as usize;
            assert_eq!(levels, expected, "size {}", size);
        }
    }

    /// Jitter is at most 2x the level's range and the range halves every
    /// level, so heights stay within a (loose) multiple of the initial range
    #[test]
    fn test_jitter_bounded() {
        let mut rng = Pcg64::seed_from_u64(12506774975058000);
        let range = 3.0;
        for size in [4, 9, 32, 33] {
            let mut heights = HeightMap::new(size);
            synthesize(&mut heights, range, &mut rng);
            for (pos, value) in heights.iter() {
                assert!(
                    value.abs() < 32.0 * range,
                    "{:?} has out of bounds value {}",
                    pos,
                    value
                );
            }
        }
    }

    #[test]
    fn test_jitter_scale_uses_all_values() {
        let mut rng = Pcg64::seed_from_u64(5);
        let seen: HashSet<i64> =
            (0..1000).map(|_| jitter_scale(&mut rng) as i64).collect();
        let expected: HashSet<i64> = [-2, -1, 1, 2].iter().copied().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_deterministic() {
        let generate = |seed: u64| {
            let mut heights = HeightMap::new(16);
            synthesize(&mut heights, 2.0, &mut Pcg64::seed_from_u64(seed));
            heights
        };

        assert_eq!(generate(1234), generate(1234));
        assert_ne!(generate(1234), generate(4321));
    }

    /// Every level should stay in bounds, including odd sizes where the
    /// strides don't halve evenly
    #[test]
    fn test_all_sizes_in_bounds() {
        let mut rng = Pcg64::seed_from_u64(99);
        for size in 0..=40 {
            let mut heights = HeightMap::new(size);
            synthesize(&mut heights, 1.0, &mut rng);
            assert!(heights.cells().iter().all(|v| v.is_finite()));
        }
    }
}
