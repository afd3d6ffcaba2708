pub mod seed;

use crate::config::seed::Seed;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::{Validate, ValidationError};

/// Configuration that defines a terrain generation. Two terrains generated
/// with the same config will always be identical (provided they were
/// generated on the same version of the code).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TerrainConfig {
    /// RNG seed for the random perturbation during height synthesis. See
    /// [Seed] for the values that can be given here.
    pub seed: Seed,

    /// Number of grid subdivisions along each axis, a.k.a. `n`. The mesh will
    /// have `(n+1)²` vertices and `2n²` triangles, and the height map will be
    /// `n×n`. Zero is rejected at generation time.
    ///
    /// Powers of two give the most even terrain, since the diamond-square
    /// stride halves cleanly at each level.
    #[validate(range(max = 4096))]
    pub size: u16,

    /// Maximum magnitude of the random perturbation applied at the first
    /// level of diamond-square. This halves at every level, so finer details
    /// get progressively less noisy. Zero means no randomness at all.
    #[validate(range(min = 0.0), custom = "validate_finite")]
    pub range: f64,

    /// How vertex normals are populated after the heights are applied
    pub normals: NormalMode,

    /// Rectangle in the XY plane that the mesh spans. This comes last so that
    /// it serializes as a trailing TOML table.
    pub bounds: Bounds,
}

/// An axis-aligned rectangle in the XY plane. Both axes must have `min < max`,
/// which is checked when the grid is built.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Is this a non-degenerate rectangle? NaN and infinite bounds are never
    /// valid.
    pub fn is_valid(&self) -> bool {
        let finite = [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        finite && self.min_x < self.max_x && self.min_y < self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Strategy for populating vertex normals.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Eq,
    PartialEq,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NormalMode {
    /// Every normal points straight up (+Z), regardless of the heights. This
    /// is what the grid builder emits.
    Flat,
    /// Normals are derived from the faces around each vertex, after heights
    /// have been applied. See [GridMesh::compute_normals](crate::GridMesh).
    Smooth,
}

/// NaN passes a range check, and infinity can slip past a one-sided one
fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite"))
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            // Danger! This means the default will vary between calls!
            seed: rand::random::<u64>().into(),
            size: 64,
            range: 2.0,
            normals: NormalMode::Flat,
            bounds: Bounds::default(),
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(-1.0, 1.0, -1.0, 1.0)
    }
}

impl Default for NormalMode {
    fn default() -> Self {
        Self::Flat
    }
}
