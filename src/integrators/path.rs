// Copyright @yucwang 2026

use crate::core::integrator::{balance_heuristic, russian_roulette};
use crate::core::interaction::EmitterInteraction;
use crate::core::rng::RandomSampler;
use crate::core::scene::{MaterialOpacity, Scene};
use crate::math::constants::{Float, EPSILON};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{black, white, RGBSpectrum};

/// Unidirectional path tracer combining emitter sampling and material
/// sampling with the balance heuristic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathIntegrator {
    /// Maximum number of bounces, 0 for no limit.
    pub max_depth: usize,
}

impl PathIntegrator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn evaluate(&self, ray: &Ray3f, scene: &Scene, sampler: &mut RandomSampler) -> RGBSpectrum {
        let mut result = black();
        let mut throughput = white();
        let mut ray = *ray;
        let num_emitters = scene.emitters().len() as Float;
        // Material pdf of the bounce that produced `ray`; None for the camera ray.
        let mut material_pdf: Option<Float> = None;
        let mut depth = 0usize;

        loop {
            let hit = match scene.intersect(&ray, &MaterialOpacity, sampler) {
                Some(h) => h,
                None => {
                    if let Some(env) = scene.environment() {
                        let dir = ray.dir();
                        let weight = match material_pdf {
                            Some(pdf) => balance_heuristic(pdf, env.pdf(&dir) / num_emitters),
                            None => 1.0,
                        };
                        result += throughput.component_mul(&env.radiance(&dir)) * weight;
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
                let weight = match material_pdf {
                    Some(pdf) => balance_heuristic(pdf, eval.pdf / num_emitters),
                    None => 1.0,
                };
                result += throughput.component_mul(&eval.radiance) * weight;
            }

            if self.max_depth > 0 && depth >= self.max_depth {
                break;
            }

            // After the emission term so both strategies see the same depth.
            match russian_roulette(&throughput, sampler.next_1d()) {
                Some(survival) => throughput /= survival,
                None => break,
            }

            let material = scene.material(scene.mesh(hit.mesh).material());
            let params = material.eval_material_parameters(&hit.uv);
            let frame = hit.shading_frame();
            let wi = frame.to_local(&-ray.dir());

            if let Some((id, select_pdf)) = scene.random_emitter(sampler.next_1d()) {
                let u = sampler.next_3d();
                if let Some(ls) = scene.emitter(id).sample(scene, &hit.position, &u) {
                    let shadow = ls.interaction.shadow_ray;
                    if !scene.shadow_intersect(&shadow, &MaterialOpacity, sampler) {
                        let wo = frame.to_local(&ls.interaction.direction);
                        let f = material.evaluate(&wi, &wo, &params);
                        let weight = balance_heuristic(ls.pdf() * select_pdf, f.pdf);
                        let cos = ls.interaction.direction.dot(&hit.normal).abs();
                        result += throughput.component_mul(&f.value).component_mul(&ls.weight)
                            * (weight * cos / select_pdf);
                    }
                }
            }

            let bs = material.sample(&sampler.next_2d(), &wi, &params);
            if !bs.is_valid() {
                break;
            }

            throughput = throughput.component_mul(&bs.weight);
            material_pdf = Some(bs.pdf);
            ray = Ray3f::new(hit.position, frame.from_local(&bs.wo), Some(EPSILON), None);
            depth += 1;
        }

        result
    }
}
