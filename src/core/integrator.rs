// Copyright @yucwang 2026

use crate::core::rng::RandomSampler;
use crate::core::scene::Scene;
use crate::integrators::ao::AoIntegrator;
use crate::integrators::bsdf::BsdfIntegrator;
use crate::integrators::path::PathIntegrator;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::math::spectrum::{luminance, RGBSpectrum};

use std::fmt;
use std::str::FromStr;

/// Balance heuristic weight of strategy `a` against `b`. Undefined ratios
/// (both pdfs zero) give 0.
pub fn balance_heuristic(a: Float, b: Float) -> Float {
    let w = a / (a + b);
    if w.is_nan() { 0.0 } else { w }
}

/// Survival probability `min(0.75, luminance)`; `None` terminates the path.
pub fn russian_roulette(throughput: &RGBSpectrum, u: Float) -> Option<Float> {
    let survival = luminance(throughput).min(0.75);
    if survival <= 0.0 || u < 1.0 - survival {
        None
    } else {
        Some(survival)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegratorType {
    Ao,
    Bsdf,
    Unidirectional,
}

impl FromStr for IntegratorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ao" => Ok(IntegratorType::Ao),
            "bsdf" => Ok(IntegratorType::Bsdf),
            "path" | "unidirectional" => Ok(IntegratorType::Unidirectional),
            other => Err(format!("unknown integrator '{}'", other)),
        }
    }
}

impl fmt::Display for IntegratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntegratorType::Ao => "ao",
            IntegratorType::Bsdf => "bsdf",
            IntegratorType::Unidirectional => "path",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Integrator {
    Ao(AoIntegrator),
    Bsdf(BsdfIntegrator),
    Unidirectional(PathIntegrator),
}

impl Default for Integrator {
    fn default() -> Self {
        Integrator::Unidirectional(PathIntegrator::default())
    }
}

impl Integrator {
    pub fn from_type(integrator_type: IntegratorType) -> Self {
        match integrator_type {
            IntegratorType::Ao => Integrator::Ao(AoIntegrator::default()),
            IntegratorType::Bsdf => Integrator::Bsdf(BsdfIntegrator::default()),
            IntegratorType::Unidirectional => Integrator::Unidirectional(PathIntegrator::default()),
        }
    }

    pub fn integrator_type(&self) -> IntegratorType {
        match self {
            Integrator::Ao(_) => IntegratorType::Ao,
            Integrator::Bsdf(_) => IntegratorType::Bsdf,
            Integrator::Unidirectional(_) => IntegratorType::Unidirectional,
        }
    }

    pub fn preprocess(&self, scene: &Scene) {
        log::info!("Integrator '{}' attached to a scene with {} emitters.",
                   self.integrator_type(), scene.emitters().len());
    }

    pub fn postprocess(&self, scene: &Scene) {
        log::debug!("Integrator '{}' released a scene with {} triangles.",
                    self.integrator_type(), scene.num_triangles());
    }

    /// Radiance arriving along `ray`.
    pub fn evaluate(&self, ray: &Ray3f, scene: &Scene, sampler: &mut RandomSampler) -> RGBSpectrum {
        match self {
            Integrator::Ao(i) => i.evaluate(ray, scene, sampler),
            Integrator::Bsdf(i) => i.evaluate(ray, scene, sampler),
            Integrator::Unidirectional(i) => i.evaluate(ray, scene, sampler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::SceneBuilder;
    use crate::emitters::envmap::EnvironmentEmitter;
    use crate::materials::material::Material;
    use crate::math::constants::{Vector3f, PI};
    use crate::math::spectrum::{black, rgb, white};
    use crate::math::transform::Transform;
    use crate::shapes::rectangle::create_rectangle;
    use crate::shapes::sphere::create_sphere;
    use crate::textures::image::ImageTexture;

    // Diffuse floor (albedo 0.5) under a unit square light at height 1.
    fn area_light_scene() -> Scene {
        let x = Vector3f::new(1.0, 0.0, 0.0);
        let mut builder = SceneBuilder::new();
        let floor = builder.add_material(Material::diffuse(rgb(0.5, 0.5, 0.5)));
        let light = builder.add_material(Material::emissive(white()));
        let floor_to_world = Transform::rotate(&x, -90.0)
            .compose(&Transform::scale(&Vector3f::new(10.0, 10.0, 1.0)));
        builder.add_mesh(create_rectangle(&floor_to_world, floor));
        let light_to_world = Transform::translate(&Vector3f::new(0.0, 1.0, 0.0))
            .compose(&Transform::rotate(&x, 90.0))
            .compose(&Transform::scale(&Vector3f::new(0.5, 0.5, 1.0)));
        builder.add_mesh(create_rectangle(&light_to_world, light));
        builder.build()
    }

    fn expected_floor_radiance() -> Float {
        // Four corner-aligned 0.5 x 0.5 patches at distance 1.
        let a: Float = 0.5;
        let s = (1.0 + a * a).sqrt();
        let corner = 2.0 * (a / s) * (a / s).atan() / (2.0 * PI);
        0.5 * 4.0 * corner
    }

    fn estimate(integrator: &Integrator, scene: &Scene, samples: usize, seed: u64) -> RGBSpectrum {
        let ray = Ray3f::new(Vector3f::new(0.0, 0.5, 0.0), Vector3f::new(0.0, -1.0, 0.0), None, None);
        let mut sampler = RandomSampler::new(seed);
        let mut sum = black();
        for _ in 0..samples {
            sum += integrator.evaluate(&ray, scene, &mut sampler);
        }
        sum / samples as Float
    }

    #[test]
    fn test_balance_heuristic() {
        assert!((balance_heuristic(1.0, 3.0) - 0.25).abs() < 1e-6);
        for &(a, b) in [(0.3, 0.7), (2.0, 5.0), (1e-3, 4.0)].iter() {
            assert!((balance_heuristic(a, b) + balance_heuristic(b, a) - 1.0).abs() < 1e-6);
        }
        assert_eq!(balance_heuristic(0.0, 0.0), 0.0);
        assert_eq!(balance_heuristic(0.0, 2.0), 0.0);
    }

    #[test]
    fn test_russian_roulette_is_unbiased() {
        let throughput = rgb(0.4, 0.4, 0.4);
        let mut sampler = RandomSampler::new(5);
        let n = 200_000;
        let mut sum = 0.0;
        for _ in 0..n {
            if let Some(survival) = russian_roulette(&throughput, sampler.next_1d()) {
                sum += 1.0 / survival;
            }
        }
        assert!((sum / n as Float - 1.0).abs() < 0.01);
        assert!(russian_roulette(&black(), 0.99).is_none());
        assert_eq!(russian_roulette(&rgb(4.0, 4.0, 4.0), 0.5), Some(0.75));
    }

    #[test]
    fn test_integrator_type_parsing() {
        assert_eq!("ao".parse::<IntegratorType>(), Ok(IntegratorType::Ao));
        assert_eq!("BSDF".parse::<IntegratorType>(), Ok(IntegratorType::Bsdf));
        assert_eq!("path".parse::<IntegratorType>(), Ok(IntegratorType::Unidirectional));
        assert_eq!("unidirectional".parse::<IntegratorType>(), Ok(IntegratorType::Unidirectional));
        assert!("photon".parse::<IntegratorType>().is_err());
        for &t in [IntegratorType::Ao, IntegratorType::Bsdf, IntegratorType::Unidirectional].iter() {
            assert_eq!(t.to_string().parse::<IntegratorType>(), Ok(t));
            assert_eq!(Integrator::from_type(t).integrator_type(), t);
        }
    }

    #[test]
    fn test_unidirectional_area_light_plane() {
        let scene = area_light_scene();
        let result = estimate(&Integrator::from_type(IntegratorType::Unidirectional), &scene, 20_000, 7);
        let expected = expected_floor_radiance();
        for c in 0..3 {
            assert!((result[c] - expected).abs() < 0.03 * expected,
                    "got {} expected {}", result[c], expected);
        }
    }

    #[test]
    fn test_bsdf_area_light_plane() {
        let scene = area_light_scene();
        let result = estimate(&Integrator::from_type(IntegratorType::Bsdf), &scene, 40_000, 11);
        let expected = expected_floor_radiance();
        assert!((result.x - expected).abs() < 0.05 * expected,
                "got {} expected {}", result.x, expected);
    }

    #[test]
    fn test_direct_view_of_light_and_depth_limit() {
        let scene = area_light_scene();
        let up = Ray3f::new(Vector3f::new(0.1, 0.5, 0.0), Vector3f::new(0.0, 1.0, 0.0), None, None);
        let mut sampler = RandomSampler::new(3);
        for &t in [IntegratorType::Bsdf, IntegratorType::Unidirectional].iter() {
            let l = Integrator::from_type(t).evaluate(&up, &scene, &mut sampler);
            assert!((l - white()).norm() < 1e-4, "{} saw {:?}", t, l);
        }

        // One bounce already captures everything in this scene.
        let direct_only = Integrator::Unidirectional(PathIntegrator::new(1));
        let result = estimate(&direct_only, &scene, 5_000, 13);
        let expected = expected_floor_radiance();
        assert!((result.y - expected).abs() < 0.05 * expected);
    }

    // Inside a closed, inward-facing sphere with albedo `a` and emission
    // `le` every bounce adds `le`, so radiance is `le / (1 - a)`.
    fn furnace_scene(albedo: Float, le: Float) -> Scene {
        let mut builder = SceneBuilder::new();
        let wall = builder.add_material(Material::diffuse(rgb(albedo, albedo, albedo))
            .with_emission(rgb(le, le, le)));
        let inward = Transform::scale(&Vector3f::new(-1.0, 1.0, 1.0));
        builder.add_mesh(create_sphere(&inward, 16, 32, false, wall));
        builder.build()
    }

    fn furnace_estimate(integrator: &Integrator, scene: &Scene, samples: usize, seed: u64) -> Float {
        let mut sampler = RandomSampler::new(seed);
        let mut sum = 0.0;
        for i in 0..samples {
            let phi = 2.0 * PI * (i as Float + 0.5) / samples as Float;
            let dir = Vector3f::new(phi.cos(), 0.3, phi.sin());
            let ray = Ray3f::new(Vector3f::zeros(), dir.normalize(), None, None);
            sum += integrator.evaluate(&ray, scene, &mut sampler).x;
        }
        sum / samples as Float
    }

    #[test]
    fn test_furnace_multi_bounce_converges() {
        let scene = furnace_scene(0.5, 1.0);
        for &(t, seed) in [(IntegratorType::Bsdf, 17), (IntegratorType::Unidirectional, 19)].iter() {
            let result = furnace_estimate(&Integrator::from_type(t), &scene, 40_000, seed);
            assert!((result - 2.0).abs() < 0.03 * 2.0, "{} got {}", t, result);
        }

        // Higher albedo means long paths where roulette does most of the work.
        let bright = furnace_scene(0.8, 0.5);
        let result = furnace_estimate(&Integrator::from_type(IntegratorType::Unidirectional), &bright, 40_000, 23);
        assert!((result - 2.5).abs() < 0.05 * 2.5, "got {}", result);
    }

    #[test]
    fn test_environment_on_miss() {
        let mut builder = SceneBuilder::new();
        builder.set_environment(EnvironmentEmitter::new(ImageTexture::from_rgb(0.25, 0.5, 1.0), 2.0));
        let scene = builder.build();
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.3, 0.2, 1.0), None, None);
        let mut sampler = RandomSampler::new(1);

        let path = Integrator::from_type(IntegratorType::Unidirectional).evaluate(&ray, &scene, &mut sampler);
        assert!((path - rgb(0.5, 1.0, 2.0)).norm() < 1e-4);
        let bsdf = Integrator::from_type(IntegratorType::Bsdf).evaluate(&ray, &scene, &mut sampler);
        assert!((bsdf - rgb(0.5, 1.0, 2.0)).norm() < 1e-4);
        let hidden = Integrator::Bsdf(BsdfIntegrator { max_depth: 0, include_environment: false });
        assert_eq!(hidden.evaluate(&ray, &scene, &mut sampler), black());
        assert_eq!(Integrator::from_type(IntegratorType::Ao).evaluate(&ray, &scene, &mut sampler), black());
    }

    #[test]
    fn test_ao_open_and_occluded() {
        let scene = area_light_scene();
        let ao = Integrator::from_type(IntegratorType::Ao);
        let mut sampler = RandomSampler::new(9);
        // Floor far from the light: fully open sky.
        let open = Ray3f::new(Vector3f::new(8.0, 0.5, 8.0), Vector3f::new(0.0, -1.0, 0.0), None, None);
        assert_eq!(ao.evaluate(&open, &scene, &mut sampler), white());

        let mut occluded = 0;
        let below_light = Ray3f::new(Vector3f::new(0.0, 0.5, 0.0), Vector3f::new(0.0, -1.0, 0.0), None, None);
        for _ in 0..2000 {
            let v = ao.evaluate(&below_light, &scene, &mut sampler);
            assert!(v == white() || v == black());
            if v == black() {
                occluded += 1;
            }
        }
        // Occlusion probability equals the light's form factor.
        let fraction = occluded as Float / 2000.0;
        assert!((fraction - 2.0 * expected_floor_radiance()).abs() < 0.05);
    }
}
