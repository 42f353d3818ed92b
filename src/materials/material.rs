// Copyright @yucwang 2026

use crate::materials::microfacet::{fresnel_dielectric, ggx_d, pdf_ggx_reflection, reflect, sample_ggx, smith_g};
use crate::math::constants::{Float, Vector2f, Vector3f, FLOAT_EPS, INV_PI};
use crate::math::spectrum::{black, white, RGBSpectrum};
use crate::math::warp::{sample_cosine_hemisphere, sample_cosine_hemisphere_pdf};
use crate::textures::image::ImageTexture;

/// Material inputs resolved at one shading point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParameters {
    pub diffuse_color: RGBSpectrum,
    pub specular: Float,
    pub specular_tint: Float,
    pub roughness: Float,
    pub alpha: Float,
    pub alpha2: Float,
    pub ior: Float,
}

/// BSDF value (not cosine weighted) and the solid-angle pdf of `wo`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfEval {
    pub value: RGBSpectrum,
    pub pdf: Float,
}

impl BsdfEval {
    pub fn zero() -> Self {
        Self { value: black(), pdf: 0.0 }
    }
}

/// Sampled direction with its throughput weight `f * cos / pdf`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfSample {
    pub wo: Vector3f,
    pub weight: RGBSpectrum,
    pub pdf: Float,
}

impl BsdfSample {
    pub fn zero(wo: Vector3f) -> Self {
        Self { wo, weight: black(), pdf: 0.0 }
    }

    pub fn is_valid(&self) -> bool {
        self.pdf >= FLOAT_EPS
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaterialTextures {
    pub diffuse: Option<ImageTexture>,
    pub specular: Option<ImageTexture>,
    pub specular_tint: Option<ImageTexture>,
    pub roughness: Option<ImageTexture>,
    pub opacity: Option<ImageTexture>,
}

/// Diffuse plus GGX specular surface. All directions are in the local
/// shading frame, `wi` towards the viewer and `wo` towards the light.
#[derive(Debug, Clone)]
pub struct Material {
    diffuse_color: RGBSpectrum,
    emissive_color: RGBSpectrum,
    specular: Float,
    specular_tint: Float,
    roughness: Float,
    ior: Float,
    textures: MaterialTextures,
}

impl Default for Material {
    fn default() -> Self {
        Self::new(white(), black(), 0.0, 0.0, 0.3, 1.33)
    }
}

impl Material {
    pub fn new(diffuse_color: RGBSpectrum,
               emissive_color: RGBSpectrum,
               specular: Float,
               specular_tint: Float,
               roughness: Float,
               ior: Float) -> Self {
        Self {
            diffuse_color,
            emissive_color,
            specular: specular.max(0.0).min(1.0),
            specular_tint: specular_tint.max(0.0).min(1.0),
            roughness: roughness.max(0.05).min(1.0),
            ior,
            textures: MaterialTextures::default(),
        }
    }

    pub fn diffuse(color: RGBSpectrum) -> Self {
        Self::new(color, black(), 0.0, 0.0, 0.3, 1.33)
    }

    pub fn emissive(radiance: RGBSpectrum) -> Self {
        Self::new(black(), radiance, 0.0, 0.0, 0.3, 1.33)
    }

    pub fn with_textures(mut self, textures: MaterialTextures) -> Self {
        self.textures = textures;
        self
    }

    pub fn with_emission(mut self, radiance: RGBSpectrum) -> Self {
        self.emissive_color = radiance;
        self
    }

    pub fn emission(&self) -> RGBSpectrum {
        self.emissive_color
    }

    pub fn is_emissive(&self) -> bool {
        self.emissive_color.max() > 0.0
    }

    pub fn has_opacity(&self) -> bool {
        self.textures.opacity.is_some()
    }

    pub fn opacity(&self, uv: &Vector2f) -> Float {
        match &self.textures.opacity {
            Some(tex) => tex.eval_scalar(*uv).max(0.0).min(1.0),
            None => 1.0,
        }
    }

    pub fn eval_material_parameters(&self, uv: &Vector2f) -> MaterialParameters {
        let diffuse_color = match &self.textures.diffuse {
            Some(tex) => tex.eval(*uv),
            None => self.diffuse_color,
        };
        let specular = match &self.textures.specular {
            Some(tex) => tex.eval_scalar(*uv).max(0.0).min(1.0),
            None => self.specular,
        };
        let specular_tint = match &self.textures.specular_tint {
            Some(tex) => tex.eval_scalar(*uv).max(0.0).min(1.0),
            None => self.specular_tint,
        };
        let roughness = match &self.textures.roughness {
            Some(tex) => tex.eval_scalar(*uv).max(0.05).min(1.0),
            None => self.roughness,
        };

        let alpha = roughness * roughness;
        MaterialParameters {
            diffuse_color,
            specular,
            specular_tint,
            roughness,
            alpha,
            alpha2: alpha * alpha,
            ior: self.ior,
        }
    }

    pub fn eval_diffuse(&self, wi: &Vector3f, wo: &Vector3f, params: &MaterialParameters) -> BsdfEval {
        if wi.z <= 0.0 || wo.z <= 0.0 {
            return BsdfEval::zero();
        }
        BsdfEval { value: params.diffuse_color * INV_PI, pdf: sample_cosine_hemisphere_pdf(wo) }
    }

    pub fn eval_specular(&self, wi: &Vector3f, wo: &Vector3f, params: &MaterialParameters) -> BsdfEval {
        let ni = wi.z;
        let no = wo.z;
        if ni <= 0.0 || no <= 0.0 {
            return BsdfEval::zero();
        }

        let h = (wi + wo).normalize();
        let d = ggx_d(h.z, params.alpha2);
        let f = fresnel_dielectric(wo.dot(&h).abs(), 1.0, params.ior);
        let g = smith_g(ni, no, params.alpha2);

        let tint = white() * (1.0 - params.specular_tint) + params.diffuse_color * params.specular_tint;
        let value = tint * (d * f * g / (4.0 * (ni * no).abs()));
        BsdfEval { value, pdf: pdf_ggx_reflection(&h, wi, params.alpha2) }
    }

    pub fn sample_specular(&self, u: &Vector2f, wi: &Vector3f, params: &MaterialParameters) -> BsdfSample {
        let h = sample_ggx(u, params.alpha2);
        let wo = reflect(wi, &h);
        let eval = self.eval_specular(wi, &wo, params);
        if eval.pdf < FLOAT_EPS {
            return BsdfSample::zero(wo);
        }
        BsdfSample { wo, weight: eval.value * (wo.z / eval.pdf), pdf: eval.pdf }
    }

    pub fn sample_diffuse(&self, u: &Vector2f, wi: &Vector3f, params: &MaterialParameters) -> BsdfSample {
        let wo = sample_cosine_hemisphere(u);
        let pdf = sample_cosine_hemisphere_pdf(&wo);
        if pdf < FLOAT_EPS || wi.z <= 0.0 {
            return BsdfSample::zero(wo);
        }
        // f * cos / pdf = (color / pi) * cos / (cos / pi)
        BsdfSample { wo, weight: params.diffuse_color, pdf }
    }

    /// Mixture of both lobes, weighted by the specular parameter.
    pub fn evaluate(&self, wi: &Vector3f, wo: &Vector3f, params: &MaterialParameters) -> BsdfEval {
        let s = params.specular;
        let diffuse = self.eval_diffuse(wi, wo, params);
        let specular = self.eval_specular(wi, wo, params);

        let pdf = (1.0 - s) * diffuse.pdf + s * specular.pdf;
        if pdf < FLOAT_EPS {
            return BsdfEval::zero();
        }
        BsdfEval { value: diffuse.value * (1.0 - s) + specular.value * s, pdf }
    }

    /// Picks a lobe with probability `specular`, then weights the direction
    /// against the full mixture.
    pub fn sample(&self, u: &Vector2f, wi: &Vector3f, params: &MaterialParameters) -> BsdfSample {
        let s = params.specular;
        let lobe = if u.x < s {
            self.sample_specular(&Vector2f::new(u.x / s, u.y), wi, params)
        } else {
            self.sample_diffuse(&Vector2f::new((u.x - s) / (1.0 - s), u.y), wi, params)
        };
        if !lobe.is_valid() {
            return BsdfSample::zero(lobe.wo);
        }

        let eval = self.evaluate(wi, &lobe.wo, params);
        if eval.pdf < FLOAT_EPS {
            return BsdfSample::zero(lobe.wo);
        }
        BsdfSample { wo: lobe.wo, weight: eval.value * (lobe.wo.z / eval.pdf), pdf: eval.pdf }
    }
}
