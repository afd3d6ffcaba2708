pub mod diamond_square;
mod grid;
mod height;

pub use crate::terrain::{grid::GridMesh, height::HeightMap};

use crate::{timed, Bounds, NormalMode, TerrainConfig};
use anyhow::{ensure, Context};
use derive_more::Display;
use log::info;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Synthesized heights are divided by this before being applied to the mesh,
/// to flatten the terrain out a bit.
pub const HEIGHT_DAMPING: f64 = 2.5;

/// A fully generated terrain: a triangulated grid mesh with elevation applied,
/// plus the raw height map and the config that produced them.
///
/// ## Serialization
/// Terrains can be serialized as JSON (the `json` feature) or as a binary
/// format (the `bin` feature). Currently the binary format is
/// [CBOR](https://cbor.io/), but that is subject to change so beware of that if
/// you write other programs that load the format.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawTerrain")]
pub struct Terrain {
    /// The config used to generate this terrain. Generation is deterministic
    /// based on config, so this can be used to regenerate the same terrain.
    config: TerrainConfig,

    /// Raw output of diamond-square, before damping
    heights: HeightMap,

    mesh: GridMesh,
}

/// Deserialization target for [Terrain]. The height map and mesh each check
/// themselves, this makes sure they agree with each other and the config.
#[derive(Deserialize)]
struct RawTerrain {
    config: TerrainConfig,
    heights: HeightMap,
    mesh: GridMesh,
}

impl TryFrom<RawTerrain> for Terrain {
    type Error = anyhow::Error;

    fn try_from(raw: RawTerrain) -> Result<Self, Self::Error> {
        let RawTerrain {
            config,
            heights,
            mesh,
        } = raw;
        let size = usize::from(config.size);
        ensure!(
            heights.size() == size && mesh.size() == size,
            "config size {} doesn't match height map size {} and mesh size {}",
            size,
            heights.size(),
            mesh.size()
        );
        Ok(Self {
            config,
            heights,
            mesh,
        })
    }
}

impl Terrain {
    /// Generate a new terrain with the given config. Returns an error if the
    /// config is invalid, either because a field is out of range (a
    /// [validator::ValidationErrors]) or because the grid can't be built
    /// (a [TerrainError]). No generation happens if the config is invalid.
    pub fn generate(config: TerrainConfig) -> anyhow::Result<Self> {
        info!("Generating terrain with config {:#?}", config);
        config.validate().context("invalid config")?;

        let size = usize::from(config.size);
        let mut mesh = timed!(
            "Grid construction",
            GridMesh::build(size, config.bounds)
        )
        .context("invalid config")?;

        let mut rng = Pcg64::seed_from_u64(config.seed.to_u64());
        let mut heights = HeightMap::new(size);
        timed!(
            "Height synthesis",
            diamond_square::synthesize(&mut heights, config.range, &mut rng)
        );

        mesh.apply_heights(&heights)?;
        if config.normals == NormalMode::Smooth {
            timed!("Normal computation", mesh.compute_normals());
        }

        match heights.extremes() {
            Some((min, max)) => info!(
                "Generated {} vertices and {} triangles, heights in [{:.3}, {:.3}]",
                mesh.vertex_count(),
                mesh.triangle_count(),
                min,
                max
            ),
            None => info!("Generated empty terrain"),
        }

        Ok(Self {
            config,
            heights,
            mesh,
        })
    }

    /// Get a reference to the config that defines this terrain
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Get the raw synthesized height map. Note these are the values
    /// _before_ [HEIGHT_DAMPING] is applied.
    pub fn heights(&self) -> &HeightMap {
        &self.heights
    }

    /// Get the generated mesh
    pub fn mesh(&self) -> &GridMesh {
        &self.mesh
    }

    /// Get the owned mesh, discarding everything else
    pub fn into_mesh(self) -> GridMesh {
        self.mesh
    }

    /// Deserialize a terrain from JSON. A terrain can be serialized into JSON
    /// with [Terrain::to_json]. Will fail if the input is malformed.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("error deserializing terrain")
    }

    /// Serializes this terrain into JSON. This is a recoverable format, which
    /// can be loaded back with [Terrain::from_json].
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> String {
        // Panic here indicates an internal bug in the data format
        serde_json::to_string(self).expect("error serializing terrain")
    }

    /// Deserialize a terrain from binary format. See the struct-level
    /// [Terrain] documentation for a description of the binary format. Will
    /// fail if the input is malformed.
    #[cfg(feature = "bin")]
    pub fn from_bin(read: impl std::io::Read) -> anyhow::Result<Self> {
        serde_cbor::from_reader(read).context("error deserializing terrain")
    }

    /// Serializes this terrain into a binary format, which can be loaded back
    /// with [Terrain::from_bin].
    #[cfg(feature = "bin")]
    pub fn to_bin(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        // Panic here indicates an internal bug in the data format
        serde_cbor::to_writer(&mut buffer, self)
            .expect("error serializing terrain");
        buffer
    }

    /// Render the terrain's mesh as a binary STL model. STL only carries
    /// geometry, so vertex normals are not included (each facet gets its own
    /// normal instead).
    #[cfg(feature = "stl")]
    pub fn to_stl(&self) -> Vec<u8> {
        crate::render::stl::render_stl(&self.mesh)
    }
}

/// An error that prevents a grid from being built. These are all problems with
/// the input, and are detected before any generation starts.
#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum TerrainError {
    /// Grid size must be at least 1 (and small enough that every vertex index
    /// fits in a `u32`)
    #[display(fmt = "invalid grid size {}", size)]
    InvalidDimension { size: usize },

    /// Bounds must be finite, with `min < max` on both axes
    #[display(fmt = "invalid bounds {:?}", bounds)]
    InvalidBounds { bounds: Bounds },
}

impl std::error::Error for TerrainError {}
