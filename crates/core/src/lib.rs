//! Relief is a grid-based terrain generation system. It synthesizes a height
//! field with the diamond-square algorithm, then maps that height field onto a
//! triangulated lattice mesh. The output arrays are laid out so a renderer can
//! bind them directly as vertex/index buffers.
//!
//! ```
//! use relief::{Terrain, TerrainConfig};
//!
//! let config = TerrainConfig {
//!     seed: 1234.into(),
//!     size: 16,
//!     ..Default::default()
//! };
//! let terrain = Terrain::generate(config).unwrap();
//! assert_eq!(terrain.mesh().triangle_count(), 2 * 16 * 16);
//! // From here you can bind the vertices/faces/normals however you like.
//! ```
//!
//! See [TerrainConfig] for details on how generation can be customized.

mod config;
mod render;
mod terrain;
mod util;

pub use crate::{
    config::{seed::Seed, Bounds, NormalMode, TerrainConfig},
    terrain::{
        diamond_square, GridMesh, HeightMap, Terrain, TerrainError,
        HEIGHT_DAMPING,
    },
};
