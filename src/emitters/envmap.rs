// Copyright @yucwang 2026

use crate::core::distribution::Distribution2D;
use crate::core::interaction::{EmitterEval, EmitterInteraction, EmitterSample};
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON, FLOAT_EPS, INV_PI, INV_TWO_PI, PI};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{luminance, RGBSpectrum};
use crate::textures::image::{FilterMode, ImageTexture, TextureError, WrapMode};

use std::path::Path;

// Sampled environment points are placed this far from the reference point.
const ENVIRONMENT_DISTANCE: Float = 10000.0;

/// Direction to equirectangular uv; +Y is up and maps to `v = 1`.
pub fn dir_to_uv(d: &Vector3f) -> Vector2f {
    let theta = d.y.max(-1.0).min(1.0).acos();
    let phi = d.z.atan2(d.x) + PI;
    Vector2f::new(phi * INV_TWO_PI, 1.0 - theta * INV_PI)
}

pub fn uv_to_dir(uv: &Vector2f) -> Vector3f {
    let theta = (1.0 - uv.y) * PI;
    let phi = uv.x * 2.0 * PI - PI;
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vector3f::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin())
}

/// Infinitely distant light described by a lat-long image, importance
/// sampled by texel luminance.
#[derive(Debug, Clone)]
pub struct EnvironmentEmitter {
    texture: ImageTexture,
    intensity: Float,
    distribution: Distribution2D,
}

impl EnvironmentEmitter {
    pub fn new(texture: ImageTexture, intensity: Float) -> Self {
        let mut texture = texture;
        texture.set_filter_mode(FilterMode::Nearest);
        texture.set_wrap_mode(WrapMode::Repeat);

        let (width, height) = texture.dimensions();
        let mut weights = Vec::with_capacity(width * height);
        for y in 0..height {
            let sin_theta = (PI * (y as Float + 0.5) / height as Float).sin();
            for x in 0..width {
                weights.push((sin_theta * luminance(&texture.texel(x, y))).max(FLOAT_EPS));
            }
        }

        log::info!("Built environment distribution over {}x{} texels.", width, height);
        Self { texture, intensity, distribution: Distribution2D::new(&weights, width, height) }
    }

    pub fn from_file(path: &Path, intensity: Float) -> Result<Self, TextureError> {
        // Radiance maps are linear regardless of their container.
        let texture = ImageTexture::from_file_with_srgb(path, false)?;
        Ok(Self::new(texture, intensity))
    }

    pub fn intensity(&self) -> Float {
        self.intensity
    }

    pub fn radiance(&self, direction: &Vector3f) -> RGBSpectrum {
        self.texture.eval(dir_to_uv(direction)) * self.intensity
    }

    fn texel_of(&self, uv: &Vector2f) -> (usize, usize) {
        let (width, height) = self.texture.dimensions();
        let u = uv.x.rem_euclid(1.0);
        let x = ((u * width as Float) as usize).min(width - 1);
        let y = (((1.0 - uv.y) * height as Float).max(0.0) as usize).min(height - 1);
        (x, y)
    }

    fn solid_angle_pdf(&self, pdf_image: Float, sin_theta: Float) -> Float {
        if sin_theta < FLOAT_EPS {
            return 0.0;
        }
        let (width, height) = self.texture.dimensions();
        pdf_image * (width * height) as Float / (2.0 * PI * PI * sin_theta)
    }

    pub fn pdf(&self, direction: &Vector3f) -> Float {
        let (x, y) = self.texel_of(&dir_to_uv(direction));
        let sin_theta = (1.0 - direction.y * direction.y).max(0.0).sqrt();
        self.solid_angle_pdf(self.distribution.pdf(x, y), sin_theta)
    }

    pub fn sample(&self, reference: &Vector3f, u: &Vector2f) -> Option<EmitterSample> {
        let ((x, y), pdf_image) = self.distribution.sample(u);
        let (width, height) = self.texture.dimensions();
        let uv = Vector2f::new((x as Float + 0.5) / width as Float,
                               1.0 - (y as Float + 0.5) / height as Float);
        let direction = uv_to_dir(&uv);
        let sin_theta = (PI * (y as Float + 0.5) / height as Float).sin();
        let pdf = self.solid_angle_pdf(pdf_image, sin_theta);
        if pdf < FLOAT_EPS {
            return None;
        }

        let interaction = EmitterInteraction {
            reference: *reference,
            position: reference + direction * ENVIRONMENT_DISTANCE,
            direction,
            normal: -direction,
            pdf,
            shadow_ray: Ray3f::new(*reference, direction, Some(EPSILON), Some(ENVIRONMENT_DISTANCE - EPSILON)),
        };
        let radiance = self.texture.texel(x, y) * self.intensity;
        Some(EmitterSample { interaction, weight: radiance / pdf })
    }

    pub fn eval(&self, interaction: &EmitterInteraction) -> EmitterEval {
        EmitterEval {
            radiance: self.radiance(&interaction.direction),
            pdf: self.pdf(&interaction.direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Pcg32;
    use crate::math::spectrum::rgb;

    fn gradient_map(width: usize, height: usize) -> ImageTexture {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let v = 0.1 + (x as Float / width as Float) + 3.0 * (y == 1) as u8 as Float;
                data.push(rgb(v, v, v));
            }
        }
        ImageTexture::from_pixels(width, height, data)
    }

    #[test]
    fn test_uv_direction_round_trip() {
        let mut rng = Pcg32::new(10, 10);
        for _ in 0..100 {
            let uv = Vector2f::new(rng.next_f32(), 0.01 + 0.98 * rng.next_f32());
            let d = uv_to_dir(&uv);
            assert!((d.norm() - 1.0).abs() < 1e-5);
            let back = dir_to_uv(&d);
            let du = (back.x - uv.x).abs();
            assert!(du.min(1.0 - du) < 1e-4);
            assert!((back.y - uv.y).abs() < 1e-4);
        }
        assert!((dir_to_uv(&Vector3f::new(0.0, 1.0, 0.0)).y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sampling_histogram_matches_pdf() {
        let (width, height) = (8, 4);
        let env = EnvironmentEmitter::new(gradient_map(width, height), 1.0);
        let mut counts = vec![0usize; width * height];
        let mut rng = Pcg32::new(77, 3);
        let n = 100000;
        for _ in 0..n {
            let s = env.sample(&Vector3f::zeros(), &Vector2f::new(rng.next_f32(), rng.next_f32())).unwrap();
            let (x, y) = env.texel_of(&dir_to_uv(&s.interaction.direction));
            counts[y * width + x] += 1;
            assert!((env.pdf(&s.interaction.direction) - s.pdf()).abs() < 1e-3 * s.pdf());
        }
        for y in 0..height {
            for x in 0..width {
                let expected = env.distribution.pdf(x, y);
                let freq = counts[y * width + x] as Float / n as Float;
                assert!((freq - expected).abs() < 0.01, "texel ({}, {}): {} vs {}", x, y, freq, expected);
            }
        }
    }

    #[test]
    fn test_pdf_integrates_to_one() {
        let env = EnvironmentEmitter::new(gradient_map(16, 8), 2.0);
        let (nt, np) = (256, 512);
        let mut total = 0.0f64;
        for i in 0..nt {
            let theta = (i as Float + 0.5) / nt as Float * PI;
            for j in 0..np {
                let phi = (j as Float + 0.5) / np as Float * 2.0 * PI;
                let d = Vector3f::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                let d_omega = theta.sin() * (PI / nt as Float) * (2.0 * PI / np as Float);
                total += (env.pdf(&d) * d_omega) as f64;
            }
        }
        assert!((total - 1.0).abs() < 0.01, "{}", total);
    }

    #[test]
    fn test_eval_uses_intensity() {
        let texture = ImageTexture::from_pixels(4, 64, vec![rgb(0.5, 0.25, 1.0); 4 * 64]);
        let env = EnvironmentEmitter::new(texture, 2.0);
        let mut interaction = EmitterInteraction::new(Vector3f::zeros());
        interaction.direction = Vector3f::new(0.0, 0.0, 1.0);
        let eval = env.eval(&interaction);
        assert!((eval.radiance - rgb(1.0, 0.5, 2.0)).norm() < 1e-6);
        // A constant map is sampled close to uniformly over the sphere.
        assert!((eval.pdf - 1.0 / (4.0 * PI)).abs() < 0.02);
    }
}
