//! This module provides logic for rendering a terrain mesh as an STL. Only
//! available with the "stl" feature enabled.

use crate::GridMesh;
use nalgebra::Vector3;
use stl_io::{Normal, Triangle, Vertex};

/// Render the given mesh as a binary STL. Z is up, same as the mesh.
pub fn render_stl(mesh: &GridMesh) -> Vec<u8> {
    let triangles = mesh_to_stl(mesh);
    let mut buffer = Vec::<u8>::new();
    // Panic here indicates a bug in our STL mesh format
    stl_io::write_stl(&mut buffer, triangles.iter())
        .expect("error serializing STL");
    buffer
}

/// Convert a mesh to triangle soup. Each triangle keeps the mesh's winding
/// (counter-clockwise from the visible side) and gets a unit facet normal.
pub fn mesh_to_stl(mesh: &GridMesh) -> Vec<Triangle> {
    mesh.triangles()
        .map(|triangle| {
            let face_normal = mesh
                .face_normal(triangle)
                .try_normalize(f64::EPSILON)
                .unwrap_or_else(Vector3::zeros);
            let vertices = triangle.map(|index| {
                let [x, y, z] = mesh
                    .vertex(index as usize)
                    // Face indices are always in range for a built mesh
                    .unwrap_or_default();
                Vertex::new([x as f32, y as f32, z as f32])
            });
            Triangle {
                normal: Normal::new([
                    face_normal.x as f32,
                    face_normal.y as f32,
                    face_normal.z as f32,
                ]),
                vertices,
            }
        })
        .collect()
}
