// Copyright @yucwang 2023

use crate::core::scene::MeshId;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;
use crate::math::spectrum::{black, RGBSpectrum};

/// Closest intersection returned by the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub t: Float,
    pub position: Vector3f,
    pub normal: Vector3f,
    pub geo_normal: Vector3f,
    pub uv: Vector2f,
    pub mesh: MeshId,
    pub primitive: usize,
}

impl Hit {
    pub fn shading_frame(&self) -> Frame {
        Frame::from_normal(&self.normal)
    }
}

/// Emitter query: the reference point and, once filled by the emitter, the
/// point on the light, the unit direction towards it and the shadow ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterInteraction {
    pub reference: Vector3f,
    pub position: Vector3f,
    pub direction: Vector3f,
    pub normal: Vector3f,
    pub pdf: Float,
    pub shadow_ray: Ray3f,
}

impl EmitterInteraction {
    pub fn new(reference: Vector3f) -> Self {
        Self {
            reference,
            position: reference,
            direction: Vector3f::new(0.0, 0.0, 1.0),
            normal: Vector3f::new(0.0, 0.0, 1.0),
            pdf: 0.0,
            shadow_ray: Ray3f::new(reference, Vector3f::new(0.0, 0.0, 1.0), None, None),
        }
    }
}

/// Radiance arriving at the reference point and its solid-angle pdf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterEval {
    pub radiance: RGBSpectrum,
    pub pdf: Float,
}

impl EmitterEval {
    pub fn zero() -> Self {
        Self { radiance: black(), pdf: 0.0 }
    }
}

/// Sampled light point; `weight` is radiance over the solid-angle pdf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterSample {
    pub interaction: EmitterInteraction,
    pub weight: RGBSpectrum,
}

impl EmitterSample {
    pub fn pdf(&self) -> Float {
        self.interaction.pdf
    }

    pub fn radiance(&self) -> RGBSpectrum {
        self.weight * self.interaction.pdf
    }
}

/// Camera ray with its importance weight. A zero weight marks a vignetted
/// sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    pub ray: Ray3f,
    pub weight: Float,
}
