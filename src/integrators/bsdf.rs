// Copyright @yucwang 2026

use crate::core::integrator::russian_roulette;
use crate::core::interaction::EmitterInteraction;
use crate::core::rng::RandomSampler;
use crate::core::scene::{MaterialOpacity, Scene};
use crate::math::constants::EPSILON;
use crate::math::ray::Ray3f;
use crate::math::spectrum::{black, white, RGBSpectrum};

/// Path tracer that only follows material samples; lights are found by
/// chance.
#[derive(Debug, Clone, PartialEq)]
pub struct BsdfIntegrator {
    /// Maximum number of bounces, 0 for no limit.
    pub max_depth: usize,
    pub include_environment: bool,
}

impl Default for BsdfIntegrator {
    fn default() -> Self {
        Self { max_depth: 0, include_environment: true }
    }
}

impl BsdfIntegrator {
    pub fn evaluate(&self, ray: &Ray3f, scene: &Scene, sampler: &mut RandomSampler) -> RGBSpectrum {
        let mut result = black();
        let mut throughput = white();
        let mut ray = *ray;
        let mut depth = 0usize;

        loop {
            let hit = match scene.intersect(&ray, &MaterialOpacity, sampler) {
                Some(h) => h,
                None => {
                    if self.include_environment {
                        if let Some(env) = scene.environment() {
                            result += throughput.component_mul(&env.radiance(&ray.dir()));
                        }
                    }
                    break;
                }
            };

            if let Some(id) = scene.emitter_for_mesh(hit.mesh) {
                let mut ei = EmitterInteraction::new(ray.origin());
                ei.position = hit.position;
                ei.normal = hit.geo_normal;
                ei.direction = ray.dir();
                let eval = scene.emitter(id).eval(scene, &ei);
                result += throughput.component_mul(&eval.radiance);
            }

            if self.max_depth > 0 && depth >= self.max_depth {
                break;
            }

            match russian_roulette(&throughput, sampler.next_1d()) {
                Some(survival) => throughput /= survival,
                None => break,
            }

            let material = scene.material(scene.mesh(hit.mesh).material());
            let params = material.eval_material_parameters(&hit.uv);
            let frame = hit.shading_frame();
            let wi = frame.to_local(&-ray.dir());
            let bs = material.sample(&sampler.next_2d(), &wi, &params);
            if !bs.is_valid() {
                break;
            }

            throughput = throughput.component_mul(&bs.weight);
            ray = Ray3f::new(hit.position, frame.from_local(&bs.wo), Some(EPSILON), None);
            depth += 1;
        }

        result
    }
}
