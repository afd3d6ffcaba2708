use crate::{util, Bounds, HeightMap, TerrainError, HEIGHT_DAMPING};
use anyhow::{anyhow, bail, ensure};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A triangulated lattice in the XY plane. The lattice has `n` cells along
/// each axis, so `(n+1)²` points and `2n²` triangles.
///
/// All data is stored in flat buffers, so that they can be bound directly as
/// vertex/index buffers by a renderer:
/// - `vertices` holds `[x, y, z]` for each point
/// - `normals` holds `[x, y, z]` for each point
/// - `faces` holds 3 vertex indices per triangle
///
/// Points are stored row-major, so point `(i, j)` (row `i`, column `j`) is
/// vertex `i*(n+1) + j`. Rows step along Y and columns step along X.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGridMesh")]
pub struct GridMesh {
    size: usize,
    vertices: Vec<f64>,
    normals: Vec<f64>,
    faces: Vec<u32>,
}

/// Deserialization target for [GridMesh]. Buffer lengths and face indices are
/// checked before this becomes a real mesh, so a bad file can't produce a mesh
/// that panics later on.
#[derive(Deserialize)]
struct RawGridMesh {
    size: usize,
    vertices: Vec<f64>,
    normals: Vec<f64>,
    faces: Vec<u32>,
}

impl TryFrom<RawGridMesh> for GridMesh {
    type Error = anyhow::Error;

    fn try_from(raw: RawGridMesh) -> Result<Self, Self::Error> {
        let RawGridMesh {
            size,
            vertices,
            normals,
            faces,
        } = raw;
        ensure!(size > 0, "mesh size must be at least 1");
        let vertex_count = util::lattice_len(size)
            .filter(|len| u32::try_from(*len).is_ok())
            .ok_or_else(|| anyhow!("mesh size {} is too large", size))?;
        ensure!(
            vertices.len() == vertex_count * Self::COMPONENTS,
            "expected {} vertex components for size {}, got {}",
            vertex_count * Self::COMPONENTS,
            size,
            vertices.len()
        );
        ensure!(
            normals.len() == vertices.len(),
            "expected {} normal components, got {}",
            vertices.len(),
            normals.len()
        );
        let face_len = size * size * 6;
        ensure!(
            faces.len() == face_len,
            "expected {} face indices for size {}, got {}",
            face_len,
            size,
            faces.len()
        );
        if let Some(index) =
            faces.iter().find(|index| **index as usize >= vertex_count)
        {
            bail!(
                "face index {} out of range for {} vertices",
                index,
                vertex_count
            );
        }

        Ok(Self {
            size,
            vertices,
            normals,
            faces,
        })
    }
}

impl GridMesh {
    /// Number of components per vertex (and per normal)
    pub const COMPONENTS: usize = 3;

    /// Build a flat grid with `n` subdivisions per axis, spanning the given
    /// rectangle. Every vertex starts at `z = 0` with a `+Z` normal.
    ///
    /// Each cell is split into two triangles, always with the same winding:
    /// `(v, v+1, v+n+1)` and `(v+1, v+n+2, v+n+1)`, where `v` is the cell's
    /// min corner. Both are counter-clockwise when viewed from `+Z`.
    ///
    /// Returns an error if `n` is zero or the bounds are degenerate.
    pub fn build(n: usize, bounds: Bounds) -> Result<Self, TerrainError> {
        if n == 0 {
            return Err(TerrainError::InvalidDimension { size: n });
        }
        if !bounds.is_valid() {
            return Err(TerrainError::InvalidBounds { bounds });
        }
        // Indices are u32 so they can go straight into an index buffer
        let lattice_len = match util::lattice_len(n) {
            Some(len) if u32::try_from(len).is_ok() => len,
            _ => return Err(TerrainError::InvalidDimension { size: n }),
        };

        let delta_x = bounds.width() / n as f64;
        let delta_y = bounds.height() / n as f64;
        let mut vertices = Vec::with_capacity(lattice_len * Self::COMPONENTS);
        let mut normals = Vec::with_capacity(lattice_len * Self::COMPONENTS);
        for i in 0..=n {
            for j in 0..=n {
                vertices.extend_from_slice(&[
                    bounds.min_x + delta_x * j as f64,
                    bounds.min_y + delta_y * i as f64,
                    0.0,
                ]);
                normals.extend_from_slice(&[0.0, 0.0, 1.0]);
            }
        }

        // Checked above that every index fits
        let width = (n + 1) as u32;
        let mut faces = Vec::with_capacity(n * n * 6);
        for i in 0..n {
            for j in 0..n {
                let vid = util::flat_index(i, j, n + 1) as u32;
                faces.extend_from_slice(&[vid, vid + 1, vid + width]);
                faces.extend_from_slice(&[
                    vid + 1,
                    vid + 1 + width,
                    vid + width,
                ]);
            }
        }

        Ok(Self {
            size: n,
            vertices,
            normals,
            faces,
        })
    }

    /// Number of cells along each axis, a.k.a. `n`
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of points in the lattice, `(n+1)²`
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / Self::COMPONENTS
    }

    /// Number of triangles in the mesh, always `2n²`
    pub fn triangle_count(&self) -> usize {
        self.faces.len() / 3
    }

    /// Flat vertex positions, 3 components per vertex
    pub fn vertices(&self) -> &[f64] {
        &self.vertices
    }

    /// Flat vertex normals, 3 components per vertex
    pub fn normals(&self) -> &[f64] {
        &self.normals
    }

    /// Flat triangle indices, 3 per triangle
    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    /// Get the index of lattice point `(row, col)` in the vertex list
    pub fn vertex_index(&self, row: usize, col: usize) -> usize {
        util::flat_index(row, col, self.size + 1)
    }

    /// Get the position of a single vertex, by its index
    pub fn vertex(&self, index: usize) -> Option<[f64; 3]> {
        let start = index * Self::COMPONENTS;
        match self.vertices.get(start..start + Self::COMPONENTS) {
            Some(&[x, y, z]) => Some([x, y, z]),
            _ => None,
        }
    }

    /// Iterate over every triangle, as a triple of vertex indices
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.faces.chunks_exact(3).map(|tri| [tri[0], tri[1], tri[2]])
    }

    /// Set the elevation of the mesh from a height map. Height cell `(i, j)`
    /// sets the Z of lattice point `(i, j)`, scaled down by
    /// [HEIGHT_DAMPING]. The height map is one cell smaller than the lattice
    /// along each axis, so the last row and column of points are left alone.
    ///
    /// Returns an error if the height map's size doesn't match this mesh.
    pub fn apply_heights(&mut self, heights: &HeightMap) -> anyhow::Result<()> {
        ensure!(
            heights.size() == self.size,
            "height map size {} doesn't match mesh size {}",
            heights.size(),
            self.size
        );

        for ((row, col), height) in heights.iter() {
            let z_index = self.vertex_index(row, col) * Self::COMPONENTS + 2;
            self.vertices[z_index] = height / HEIGHT_DAMPING;
        }
        Ok(())
    }

    /// Recompute every vertex normal from the surrounding faces. Each face
    /// contributes its un-normalized cross product, so larger faces carry
    /// more weight. A vertex whose contributions cancel out gets `+Z`.
    pub fn compute_normals(&mut self) {
        let mut sums = vec![Vector3::<f64>::zeros(); self.vertex_count()];
        for [a, b, c] in self.triangles() {
            let face_normal = self.face_normal([a, b, c]);
            for index in [a, b, c] {
                sums[index as usize] += face_normal;
            }
        }

        for (index, sum) in sums.into_iter().enumerate() {
            let normal = sum
                .try_normalize(f64::EPSILON)
                .unwrap_or_else(|| Vector3::new(0.0, 0.0, 1.0));
            let start = index * Self::COMPONENTS;
            self.normals[start..start + Self::COMPONENTS]
                .copy_from_slice(normal.as_slice());
        }
    }

    /// Get the un-normalized normal of a triangle, following the right-hand
    /// rule: `(b - a) × (c - a)`
    pub fn face_normal(&self, [a, b, c]: [u32; 3]) -> Vector3<f64> {
        let point = |index: u32| {
            let start = index as usize * Self::COMPONENTS;
            Vector3::from_column_slice(
                &self.vertices[start..start + Self::COMPONENTS],
            )
        };
        let (a, b, c) = (point(a), point(b), point(c));
        (b - a).cross(&(c - a))
    }

    /// Build an index list for rendering this mesh as a wireframe. Each
    /// triangle `(a, b, c)` becomes three line segments: `a-b`, `b-c`, `c-a`.
    /// Edges shared between triangles are emitted once per triangle.
    pub fn line_indices(&self) -> Vec<u32> {
        let mut lines = Vec::with_capacity(self.faces.len() * 2);
        for [a, b, c] in self.triangles() {
            lines.extend_from_slice(&[a, b, b, c, c, a]);
        }
        lines
    }
}
