// Copyright @yucwang 2026

use super::triangle_mesh::{MeshFace, TriangleMesh};

use crate::core::scene::MaterialId;
use crate::math::constants::{Vector2f, Vector3f};
use crate::math::transform::Transform;

/// `[-1, 1]³` box with outward-facing faces, placed by `to_world`.
pub fn create_cube(to_world: &Transform, material: MaterialId) -> TriangleMesh {
    let axes = [
        (Vector3f::new( 1.0, 0.0, 0.0), Vector3f::new(0.0, 1.0, 0.0)),
        (Vector3f::new(-1.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0)),
        (Vector3f::new(0.0,  1.0, 0.0), Vector3f::new(0.0, 0.0, 1.0)),
        (Vector3f::new(0.0, -1.0, 0.0), Vector3f::new(1.0, 0.0, 0.0)),
        (Vector3f::new(0.0, 0.0,  1.0), Vector3f::new(1.0, 0.0, 0.0)),
        (Vector3f::new(0.0, 0.0, -1.0), Vector3f::new(0.0, 1.0, 0.0)),
    ];
    let corner_uvs = [
        Vector2f::new(0.0, 0.0),
        Vector2f::new(1.0, 0.0),
        Vector2f::new(1.0, 1.0),
        Vector2f::new(0.0, 1.0),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(6);
    let mut uvs = Vec::with_capacity(24);
    let mut faces = Vec::with_capacity(12);
    for (face, (n, s)) in axes.iter().enumerate() {
        // Counter-clockwise around the outward normal.
        let t = n.cross(s);
        let base = positions.len();
        for uv in corner_uvs.iter() {
            let su = 2.0 * uv.x - 1.0;
            let tv = 2.0 * uv.y - 1.0;
            positions.push(n + s * su + t * tv);
            uvs.push(*uv);
        }
        normals.push(*n);
        faces.push(MeshFace::new([base, base + 1, base + 2])
            .with_normals([face, face, face])
            .with_uvs([base, base + 1, base + 2]));
        faces.push(MeshFace::new([base, base + 2, base + 3])
            .with_normals([face, face, face])
            .with_uvs([base, base + 2, base + 3]));
    }

    let mut mesh = TriangleMesh::new(positions, normals, uvs, faces, material);
    mesh.transform(to_world);
    mesh
}
