// Copyright @yucwang 2023

use super::triangle::{Triangle, TriangleHit};

use crate::core::scene::{EmitterId, MaterialId};
use crate::io::obj_utils;
use crate::io::obj_utils::ObjLoadError;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

use std::path::Path;
use std::vec::Vec;

/// Index triples of one face. Normal and uv triples are optional per face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshFace {
    pub positions: [usize; 3],
    pub normals: Option<[usize; 3]>,
    pub uvs: Option<[usize; 3]>,
}

impl MeshFace {
    pub fn new(positions: [usize; 3]) -> Self {
        Self { positions, normals: None, uvs: None }
    }

    pub fn with_normals(mut self, normals: [usize; 3]) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_uvs(mut self, uvs: [usize; 3]) -> Self {
        self.uvs = Some(uvs);
        self
    }
}

/// Point drawn uniformly over the mesh surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshSample {
    pub position: Vector3f,
    pub normal: Vector3f,
    pub uv: Vector2f,
    pub pdf: Float,
}

/// Local geometry at a ray hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vector3f,
    pub normal: Vector3f,
    pub geo_normal: Vector3f,
    pub uv: Vector2f,
}

#[derive(Debug, Clone)]
pub struct TriangleMesh {
    positions: Vec<Vector3f>,
    normals: Vec<Vector3f>,
    uvs: Vec<Vector2f>,
    faces: Vec<MeshFace>,
    area_cdf: Vec<Float>,
    total_area: Float,
    material: MaterialId,
    emitter: Option<EmitterId>,
}

impl TriangleMesh {
    /// Builds the mesh and its cumulative-area table. Faces with out of range
    /// indices or zero area are dropped.
    pub fn new(positions: Vec<Vector3f>,
               normals: Vec<Vector3f>,
               uvs: Vec<Vector2f>,
               faces: Vec<MeshFace>,
               material: MaterialId) -> Self {
        let in_range = |idx: &[usize; 3], len: usize| idx.iter().all(|&i| i < len);

        let mut kept = Vec::with_capacity(faces.len());
        let mut skipped = 0usize;
        for mut face in faces {
            if !in_range(&face.positions, positions.len()) {
                skipped += 1;
                continue;
            }
            let [a, b, c] = face.positions;
            if Triangle::new(positions[a], positions[b], positions[c]).is_degenerate() {
                skipped += 1;
                continue;
            }
            if face.normals.map_or(false, |n| !in_range(&n, normals.len())) {
                face.normals = None;
            }
            if face.uvs.map_or(false, |t| !in_range(&t, uvs.len())) {
                face.uvs = None;
            }
            kept.push(face);
        }
        if skipped > 0 {
            log::warn!("Skipped {} degenerate or malformed triangles.", skipped);
        }

        let mut mesh = Self {
            positions,
            normals,
            uvs,
            faces: kept,
            area_cdf: Vec::new(),
            total_area: 0.0,
            material,
            emitter: None,
        };
        mesh.build_area_cdf();
        mesh
    }

    pub fn from_obj<P: AsRef<Path>>(path: P, material: MaterialId) -> Result<Self, ObjLoadError> {
        let obj_set = obj_utils::load_obj_from_file(path)?;
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        let mut faces = Vec::new();

        for object in obj_set.objects {
            // Indices are local to each object.
            let (p_base, n_base, t_base) = (positions.len(), normals.len(), uvs.len());
            for v in &object.vertices {
                positions.push(Vector3f::new(v.x as Float, v.y as Float, v.z as Float));
            }
            for vn in &object.normals {
                normals.push(Vector3f::new(vn.x as Float, vn.y as Float, vn.z as Float));
            }
            for vt in &object.tex_vertices {
                uvs.push(Vector2f::new(vt.u as Float, vt.v as Float));
            }
            for geom in &object.geometry {
                for shape in &geom.shapes {
                    if let wavefront_obj::obj::Primitive::Triangle(a, b, c) = shape.primitive {
                        let mut face = MeshFace::new([p_base + a.0, p_base + b.0, p_base + c.0]);
                        if let (Some(ta), Some(tb), Some(tc)) = (a.1, b.1, c.1) {
                            face = face.with_uvs([t_base + ta, t_base + tb, t_base + tc]);
                        }
                        if let (Some(na), Some(nb), Some(nc)) = (a.2, b.2, c.2) {
                            face = face.with_normals([n_base + na, n_base + nb, n_base + nc]);
                        }
                        faces.push(face);
                    }
                }
            }
        }

        Ok(Self::new(positions, normals, uvs, faces, material))
    }

    pub fn transform(&mut self, to_world: &Transform) {
        for p in &mut self.positions {
            *p = to_world.apply_point(*p);
        }
        for n in &mut self.normals {
            let t = to_world.apply_normal(*n);
            let len = t.norm();
            if len > 0.0 {
                *n = t / len;
            }
        }
        self.build_area_cdf();
    }

    fn build_area_cdf(&mut self) {
        self.area_cdf.clear();
        let mut running = 0.0f64;
        for i in 0..self.faces.len() {
            running += self.triangle(i).surface_area() as f64;
            self.area_cdf.push(running as Float);
        }
        self.total_area = running as Float;
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn set_material(&mut self, material: MaterialId) {
        self.material = material;
    }

    pub fn emitter(&self) -> Option<EmitterId> {
        self.emitter
    }

    pub(crate) fn set_emitter(&mut self, emitter: Option<EmitterId>) {
        self.emitter = emitter;
    }

    pub fn num_triangles(&self) -> usize {
        self.faces.len()
    }

    pub fn surface_area(&self) -> Float {
        self.total_area
    }

    pub fn has_normals(&self) -> bool {
        self.faces.iter().any(|f| f.normals.is_some())
    }

    pub fn triangle(&self, index: usize) -> Triangle {
        let [a, b, c] = self.faces[index].positions;
        Triangle::new(self.positions[a], self.positions[b], self.positions[c])
    }

    pub fn bounding_box(&self) -> AABB {
        let mut bound = AABB::default();
        for i in 0..self.faces.len() {
            bound.expand_by_aabb(&self.triangle(i).bounding_box());
        }
        bound
    }

    pub fn intersect_triangle(&self, index: usize, ray: &Ray3f) -> Option<TriangleHit> {
        self.triangle(index).intersect(ray)
    }

    /// Interpolated normal, or the geometric normal without per-vertex data.
    pub fn shading_normal(&self, index: usize, bary: &Vector3f) -> Vector3f {
        match self.faces[index].normals {
            Some([a, b, c]) => {
                let n = self.normals[a] * bary.x + self.normals[b] * bary.y + self.normals[c] * bary.z;
                let len = n.norm();
                if len > 0.0 { n / len } else { self.triangle(index).geometric_normal() }
            }
            None => self.triangle(index).geometric_normal(),
        }
    }

    /// Interpolated texture coordinate; faces without uvs use `(b1, b2)`.
    pub fn uv(&self, index: usize, bary: &Vector3f) -> Vector2f {
        match self.faces[index].uvs {
            Some([a, b, c]) => self.uvs[a] * bary.x + self.uvs[b] * bary.y + self.uvs[c] * bary.z,
            None => Vector2f::new(bary.y, bary.z),
        }
    }

    pub fn surface_point(&self, index: usize, hit: &TriangleHit) -> SurfacePoint {
        let bary = hit.barycentric();
        let tri = self.triangle(index);
        SurfacePoint {
            position: tri.interpolate(&bary),
            normal: self.shading_normal(index, &bary),
            geo_normal: tri.geometric_normal(),
            uv: self.uv(index, &bary),
        }
    }

    /// Picks a triangle proportionally to its area with `u.x`, then a uniform
    /// point inside it with `(u.y, u.z)`. The pdf is per unit area.
    pub fn sample(&self, u: &Vector3f) -> Option<MeshSample> {
        if self.faces.is_empty() || self.total_area <= 0.0 {
            return None;
        }

        let target = u.x * self.total_area;
        let index = self.area_cdf.partition_point(|&c| c <= target).min(self.faces.len() - 1);
        let (position, bary) = self.triangle(index).sample(&Vector2f::new(u.y, u.z));

        Some(MeshSample {
            position,
            normal: self.triangle(index).geometric_normal(),
            uv: self.uv(index, &bary),
            pdf: 1.0 / self.total_area,
        })
    }

    pub fn pdf(&self) -> Float {
        if self.total_area > 0.0 { 1.0 / self.total_area } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Pcg32;

    fn two_triangle_mesh() -> TriangleMesh {
        // Triangle 0 has area 0.5, triangle 1 has area 1.5.
        let positions = vec![
            Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), Vector3f::new(0.0, 1.0, 0.0),
            Vector3f::new(5.0, 0.0, 0.0), Vector3f::new(8.0, 0.0, 0.0), Vector3f::new(5.0, 1.0, 0.0),
        ];
        let faces = vec![MeshFace::new([0, 1, 2]), MeshFace::new([3, 4, 5])];
        TriangleMesh::new(positions, Vec::new(), Vec::new(), faces, MaterialId(0))
    }

    #[test]
    fn test_area_weighted_sampling() {
        let mesh = two_triangle_mesh();
        assert!((mesh.surface_area() - 2.0).abs() < 1e-6);
        assert!((mesh.pdf() - 0.5).abs() < 1e-6);

        let mut rng = Pcg32::new(1, 9);
        let n = 20000;
        let mut in_second = 0;
        for _ in 0..n {
            let s = mesh.sample(&Vector3f::new(rng.next_f32(), rng.next_f32(), rng.next_f32())).unwrap();
            assert!((s.pdf - 0.5).abs() < 1e-6);
            assert!((s.normal - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-6);
            if s.position.x >= 5.0 {
                in_second += 1;
            }
        }
        let freq = in_second as Float / n as Float;
        assert!((freq - 0.75).abs() < 0.02);
    }

    #[test]
    fn test_degenerate_and_malformed_faces_are_skipped() {
        let positions = vec![Vector3f::zeros(), Vector3f::new(1.0, 0.0, 0.0), Vector3f::new(2.0, 0.0, 0.0),
                             Vector3f::new(0.0, 1.0, 0.0)];
        let faces = vec![MeshFace::new([0, 1, 2]), MeshFace::new([0, 1, 7]),
                         MeshFace::new([0, 1, 3]).with_normals([0, 1, 2])];
        let mesh = TriangleMesh::new(positions, Vec::new(), Vec::new(), faces, MaterialId(0));
        assert_eq!(mesh.num_triangles(), 1);
        assert!(!mesh.has_normals());
    }

    #[test]
    fn test_interpolated_attributes() {
        let positions = vec![Vector3f::zeros(), Vector3f::new(1.0, 0.0, 0.0), Vector3f::new(0.0, 1.0, 0.0)];
        let normals = vec![Vector3f::new(0.0, 0.0, 1.0), Vector3f::new(1.0, 0.0, 0.0), Vector3f::new(0.0, 1.0, 0.0)];
        let uvs = vec![Vector2f::new(0.0, 0.0), Vector2f::new(1.0, 0.0), Vector2f::new(0.0, 1.0)];
        let face = MeshFace::new([0, 1, 2]).with_normals([0, 1, 2]).with_uvs([0, 1, 2]);
        let mesh = TriangleMesh::new(positions, normals, uvs, vec![face], MaterialId(0));

        let ray = Ray3f::new(Vector3f::new(0.5, 0.0, 1.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        let hit = mesh.intersect_triangle(0, &ray).unwrap();
        let sp = mesh.surface_point(0, &hit);
        assert!((sp.uv - Vector2f::new(0.5, 0.0)).norm() < 1e-5);
        let expected = Vector3f::new(1.0, 0.0, 1.0).normalize();
        assert!((sp.normal - expected).norm() < 1e-5);
        assert!((sp.geo_normal - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_transform_updates_area() {
        let mut mesh = two_triangle_mesh();
        mesh.transform(&Transform::scale(&Vector3f::new(2.0, 2.0, 2.0)));
        assert!((mesh.surface_area() - 8.0).abs() < 1e-5);
        let bounds = mesh.bounding_box();
        assert!((bounds.p_max.x - 16.0).abs() < 1e-3);
    }

    #[test]
    fn test_missing_obj_file() {
        let err = TriangleMesh::from_obj("does/not/exist.obj", MaterialId(0)).unwrap_err();
        assert!(matches!(err, ObjLoadError::Io(_)));
    }
}
