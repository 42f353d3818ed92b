// Copyright @yucwang 2026

use super::triangle_mesh::{MeshFace, TriangleMesh};

use crate::core::scene::MaterialId;
use crate::math::constants::{Vector2f, Vector3f};
use crate::math::transform::Transform;

/// `[-1, 1]²` square in the local XY plane facing +Z, placed by `to_world`.
pub fn create_rectangle(to_world: &Transform, material: MaterialId) -> TriangleMesh {
    let positions = vec![
        Vector3f::new(-1.0, -1.0, 0.0),
        Vector3f::new( 1.0, -1.0, 0.0),
        Vector3f::new( 1.0,  1.0, 0.0),
        Vector3f::new(-1.0,  1.0, 0.0),
    ];
    let normals = vec![Vector3f::new(0.0, 0.0, 1.0)];
    let uvs = vec![
        Vector2f::new(0.0, 0.0),
        Vector2f::new(1.0, 0.0),
        Vector2f::new(1.0, 1.0),
        Vector2f::new(0.0, 1.0),
    ];
    let faces = vec![
        MeshFace::new([0, 1, 2]).with_normals([0, 0, 0]).with_uvs([0, 1, 2]),
        MeshFace::new([0, 2, 3]).with_normals([0, 0, 0]).with_uvs([0, 2, 3]),
    ];

    let mut mesh = TriangleMesh::new(positions, normals, uvs, faces, material);
    mesh.transform(to_world);
    mesh
}
