// Copyright @yucwang 2026

use crate::core::rng::RandomSampler;
use crate::core::scene::{MaterialOpacity, Scene};
use crate::math::constants::{Float, EPSILON};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{black, white, RGBSpectrum};
use crate::math::warp::sample_cosine_hemisphere;

/// Ambient occlusion: one cosine-distributed visibility probe per hit.
#[derive(Debug, Clone, PartialEq)]
pub struct AoIntegrator {
    pub max_distance: Float,
}

impl Default for AoIntegrator {
    fn default() -> Self {
        Self { max_distance: 1e5 }
    }
}

impl AoIntegrator {
    pub fn new(max_distance: Float) -> Self {
        Self { max_distance }
    }

    pub fn evaluate(&self, ray: &Ray3f, scene: &Scene, sampler: &mut RandomSampler) -> RGBSpectrum {
        let hit = match scene.intersect(ray, &MaterialOpacity, sampler) {
            Some(h) => h,
            None => return black(),
        };

        let frame = hit.shading_frame();
        let mut dir = frame.from_local(&sample_cosine_hemisphere(&sampler.next_2d()));
        // Interpolated normals can tilt the lobe below the face; keep the
        // probe on the geometric side the shading normal points to.
        let geo_normal = if hit.geo_normal.dot(&hit.normal) < 0.0 { -hit.geo_normal } else { hit.geo_normal };
        let cos_geo = dir.dot(&geo_normal);
        if cos_geo <= 0.0 {
            dir -= geo_normal * (2.0 * cos_geo);
        }
        let probe = Ray3f::new(hit.position, dir, Some(EPSILON), Some(self.max_distance));
        if scene.shadow_intersect(&probe, &MaterialOpacity, sampler) {
            black()
        } else {
            white()
        }
    }
}
