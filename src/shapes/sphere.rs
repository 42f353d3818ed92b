// Copyright @yucwang 2026

use super::triangle_mesh::{MeshFace, TriangleMesh};

use crate::core::scene::MaterialId;
use crate::math::constants::{Vector2f, Vector3f, PI};
use crate::math::transform::Transform;

/// Unit UV sphere tessellated into `stacks` x `slices` quads. Without
/// `smooth` the faces carry no vertex normals and shade flat.
pub fn create_sphere(to_world: &Transform,
                     stacks: usize,
                     slices: usize,
                     smooth: bool,
                     material: MaterialId) -> TriangleMesh {
    let stacks = stacks.max(2);
    let slices = slices.max(3);

    let mut positions = Vec::with_capacity((stacks + 1) * (slices + 1));
    let mut uvs = Vec::with_capacity((stacks + 1) * (slices + 1));
    for i in 0..=stacks {
        let v = i as f32 / stacks as f32;
        let theta = v * PI;
        let sin_theta = if i == 0 || i == stacks { 0.0 } else { theta.sin() };
        let cos_theta = if i == stacks { -1.0 } else { theta.cos() };
        for j in 0..=slices {
            let u = j as f32 / slices as f32;
            let phi = u * 2.0 * PI;
            positions.push(Vector3f::new(sin_theta * phi.cos(), cos_theta, -sin_theta * phi.sin()));
            uvs.push(Vector2f::new(u, 1.0 - v));
        }
    }
    let normals = if smooth { positions.clone() } else { Vec::new() };

    let row = slices + 1;
    let mut faces = Vec::with_capacity(2 * stacks * slices);
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = (i + 1) * row + j;
            let c = (i + 1) * row + j + 1;
            let d = i * row + j + 1;
            for tri in [[a, b, c], [a, c, d]].iter() {
                let mut face = MeshFace::new(*tri).with_uvs(*tri);
                if smooth {
                    face = face.with_normals(*tri);
                }
                faces.push(face);
            }
        }
    }

    let mut mesh = TriangleMesh::new(positions, normals, uvs, faces, material);
    mesh.transform(to_world);
    mesh
}
