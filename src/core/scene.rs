// Copyright @yucwang 2026

use crate::core::bvh::BVH;
use crate::core::emitter::Emitter;
use crate::core::interaction::Hit;
use crate::core::rng::RandomSampler;
use crate::core::sensor::Camera;
use crate::emitters::area::MeshEmitter;
use crate::emitters::envmap::EnvironmentEmitter;
use crate::materials::material::Material;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f};
use crate::math::ray::Ray3f;
use crate::shapes::triangle_mesh::TriangleMesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterId(pub usize);

/// Decides whether a candidate intersection counts as a hit. `u` is a fresh
/// uniform sample for stochastic decisions.
pub trait OpacityFilter {
    fn accept(&self, material: &Material, uv: &Vector2f, u: Float) -> bool;
}

/// Alpha testing against the material's opacity texture.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialOpacity;

impl OpacityFilter for MaterialOpacity {
    fn accept(&self, material: &Material, uv: &Vector2f, u: Float) -> bool {
        !material.has_opacity() || u < material.opacity(uv)
    }
}

/// Every surface is solid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Opaque;

impl OpacityFilter for Opaque {
    fn accept(&self, _material: &Material, _uv: &Vector2f, _u: Float) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
struct PrimitiveRef {
    mesh: usize,
    triangle: usize,
}

/// Immutable arena holding everything a render needs.
#[derive(Debug, Clone)]
pub struct Scene {
    camera: Camera,
    materials: Vec<Material>,
    meshes: Vec<TriangleMesh>,
    emitters: Vec<Emitter>,
    environment: Option<EmitterId>,
    primitives: Vec<PrimitiveRef>,
    accel: BVH,
}

impl Scene {
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn mesh(&self, id: MeshId) -> &TriangleMesh {
        &self.meshes[id.0]
    }

    pub fn meshes(&self) -> &[TriangleMesh] {
        &self.meshes
    }

    pub fn emitter(&self, id: EmitterId) -> &Emitter {
        &self.emitters[id.0]
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn emitter_for_mesh(&self, id: MeshId) -> Option<EmitterId> {
        self.meshes[id.0].emitter()
    }

    pub fn environment_id(&self) -> Option<EmitterId> {
        self.environment
    }

    pub fn environment(&self) -> Option<&EnvironmentEmitter> {
        match self.environment.map(|id| &self.emitters[id.0]) {
            Some(Emitter::Environment(env)) => Some(env),
            _ => None,
        }
    }

    /// Uniform emitter selection; returns the emitter and `1 / N`.
    pub fn random_emitter(&self, u: Float) -> Option<(EmitterId, Float)> {
        if self.emitters.is_empty() {
            return None;
        }
        let n = self.emitters.len();
        let idx = ((u * n as Float) as usize).min(n - 1);
        Some((EmitterId(idx), 1.0 / n as Float))
    }

    pub fn bounds(&self) -> AABB {
        self.accel.bounds()
    }

    pub fn num_triangles(&self) -> usize {
        self.primitives.len()
    }

    /// Closest accepted intersection along the ray interval.
    pub fn intersect<F: OpacityFilter + ?Sized>(&self,
                                                ray: &Ray3f,
                                                filter: &F,
                                                sampler: &mut RandomSampler) -> Option<Hit> {
        let found = self.accel.ray_intersection(ray, |prim_idx, r| {
            let prim = self.primitives[prim_idx];
            let mesh = &self.meshes[prim.mesh];
            let hit = mesh.intersect_triangle(prim.triangle, r)?;
            let uv = mesh.uv(prim.triangle, &hit.barycentric());
            if !filter.accept(&self.materials[mesh.material().0], &uv, sampler.next_1d()) {
                return None;
            }
            Some((hit, hit.t))
        });

        found.map(|(prim_idx, hit)| {
            let prim = self.primitives[prim_idx];
            let sp = self.meshes[prim.mesh].surface_point(prim.triangle, &hit);
            Hit {
                t: hit.t,
                position: sp.position,
                normal: sp.normal,
                geo_normal: sp.geo_normal,
                uv: sp.uv,
                mesh: MeshId(prim.mesh),
                primitive: prim.triangle,
            }
        })
    }

    /// True when any accepted surface blocks the ray interval.
    pub fn shadow_intersect<F: OpacityFilter + ?Sized>(&self,
                                                       ray: &Ray3f,
                                                       filter: &F,
                                                       sampler: &mut RandomSampler) -> bool {
        self.accel.ray_intersection_t(ray, |prim_idx, r| {
            let prim = self.primitives[prim_idx];
            let mesh = &self.meshes[prim.mesh];
            match mesh.intersect_triangle(prim.triangle, r) {
                Some(hit) => {
                    let uv = mesh.uv(prim.triangle, &hit.barycentric());
                    filter.accept(&self.materials[mesh.material().0], &uv, sampler.next_1d())
                }
                None => false,
            }
        })
    }
}

#[derive(Debug, Default)]
pub struct SceneBuilder {
    camera: Camera,
    materials: Vec<Material>,
    meshes: Vec<TriangleMesh>,
    environment: Option<EnvironmentEmitter>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_camera(&mut self, camera: Camera) -> &mut Self {
        self.camera = camera;
        self
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_mesh(&mut self, mesh: TriangleMesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn set_environment(&mut self, environment: EnvironmentEmitter) -> &mut Self {
        self.environment = Some(environment);
        self
    }

    /// Freezes the scene: creates one emitter per emissive mesh, appends the
    /// environment and builds the acceleration structure. Meshes pointing at
    /// unknown materials fall back to a default material.
    pub fn build(self) -> Scene {
        let mut materials = self.materials;
        let mut meshes = self.meshes;

        if meshes.iter().any(|m| m.material().0 >= materials.len()) {
            log::warn!("Meshes reference missing materials; using a default material.");
            materials.push(Material::default());
            let fallback = MaterialId(materials.len() - 1);
            for mesh in meshes.iter_mut().filter(|m| m.material().0 >= fallback.0) {
                mesh.set_material(fallback);
            }
        }

        let mut emitters = Vec::new();
        for (i, mesh) in meshes.iter_mut().enumerate() {
            let material = &materials[mesh.material().0];
            if material.is_emissive() && mesh.num_triangles() > 0 {
                emitters.push(Emitter::Mesh(MeshEmitter::new(MeshId(i), material.emission())));
                mesh.set_emitter(Some(EmitterId(emitters.len() - 1)));
            } else {
                mesh.set_emitter(None);
            }
        }

        let environment = self.environment.map(|env| {
            emitters.push(Emitter::Environment(env));
            EmitterId(emitters.len() - 1)
        });

        let mut primitives = Vec::new();
        let mut bounds = Vec::new();
        for (m, mesh) in meshes.iter().enumerate() {
            for t in 0..mesh.num_triangles() {
                primitives.push(PrimitiveRef { mesh: m, triangle: t });
                bounds.push(mesh.triangle(t).bounding_box());
            }
        }
        let accel = BVH::new(bounds);

        log::info!("Scene: {} meshes, {} triangles, {} materials, {} emitters.",
                   meshes.len(), primitives.len(), materials.len(), emitters.len());

        Scene {
            camera: self.camera,
            materials,
            meshes,
            emitters,
            environment,
            primitives,
            accel,
        }
    }
}
