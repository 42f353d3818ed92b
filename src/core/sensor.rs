// Copyright @yucwang 2026

use crate::core::interaction::CameraSample;
use crate::math::constants::Vector2f;
use crate::sensors::perspective::PerspectiveCamera;
use crate::sensors::realistic::RealisticCamera;

#[derive(Debug, Clone)]
pub enum Camera {
    Perspective(PerspectiveCamera),
    Realistic(RealisticCamera),
}

impl Default for Camera {
    fn default() -> Self {
        Camera::Perspective(PerspectiveCamera::default())
    }
}

impl Camera {
    /// `pixel` is a continuous film position in `[0, w) x [0, h)`, `lens` a
    /// uniform sample in `[0, 1)²`.
    pub fn create_ray(&self, pixel: &Vector2f, lens: &Vector2f) -> CameraSample {
        match self {
            Camera::Perspective(c) => c.create_ray(pixel, lens),
            Camera::Realistic(c) => c.create_ray(pixel, lens),
        }
    }

    pub fn resolution(&self) -> (usize, usize) {
        match self {
            Camera::Perspective(c) => c.resolution(),
            Camera::Realistic(c) => c.resolution(),
        }
    }
}
