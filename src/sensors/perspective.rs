// Copyright @yucwang 2026

use crate::core::interaction::CameraSample;
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON, PI};
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;
use crate::math::warp::sample_uniform_disk;

use nalgebra::{Perspective3, Point3};

/// Pinhole camera with an optional thin lens.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    to_world: Transform,
    projection: Perspective3<Float>,
    width: usize,
    height: usize,
    near_clip: Float,
    far_clip: Float,
    aperture_radius: Float,
    focus_distance: Float,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(&Vector3f::new(0.0, 0.5, 1.05),
                  &Vector3f::new(0.0, 0.5, 0.0),
                  &Vector3f::new(0.0, 1.0, 0.0),
                  45.0, 800, 800, EPSILON, 1e5)
    }
}

impl PerspectiveCamera {
    /// `fov_y` is the full vertical field of view in degrees.
    pub fn new(origin: &Vector3f,
               target: &Vector3f,
               up: &Vector3f,
               fov_y: Float,
               width: usize,
               height: usize,
               near_clip: Float,
               far_clip: Float) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let near_clip = if near_clip > 0.0 { near_clip } else { EPSILON };
        let far_clip = if far_clip > near_clip { far_clip } else { near_clip + 1e5 };
        let fov_y = fov_y.max(1e-3).min(179.0);
        let aspect = width as Float / height as Float;

        Self {
            to_world: Transform::look_at(origin, target, up),
            projection: Perspective3::new(aspect, fov_y * PI / 180.0, near_clip, far_clip),
            width,
            height,
            near_clip,
            far_clip,
            aperture_radius: 0.0,
            focus_distance: 1.0,
        }
    }

    pub fn with_thin_lens(mut self, aperture_radius: Float, focus_distance: Float) -> Self {
        self.aperture_radius = aperture_radius.max(0.0);
        self.focus_distance = if focus_distance > 0.0 { focus_distance } else { 1.0 };
        self
    }

    pub fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn to_world(&self) -> &Transform {
        &self.to_world
    }

    /// Camera-space direction (forward +Z) through a continuous pixel position.
    pub fn camera_direction(&self, pixel: &Vector2f) -> Vector3f {
        let ndc_x = 2.0 * pixel.x / self.width as Float - 1.0;
        let ndc_y = 1.0 - 2.0 * pixel.y / self.height as Float;
        // The projection looks down -Z.
        let p = self.projection.unproject_point(&Point3::new(ndc_x, ndc_y, -1.0));
        Vector3f::new(p.x, p.y, -p.z).normalize()
    }

    pub fn create_ray(&self, pixel: &Vector2f, lens: &Vector2f) -> CameraSample {
        let d = self.camera_direction(pixel);

        let (origin, dir) = if self.aperture_radius > 0.0 {
            let focus = d * (self.focus_distance / d.z);
            let disk = sample_uniform_disk(lens) * self.aperture_radius;
            let aperture = Vector3f::new(disk.x, disk.y, 0.0);
            (aperture, (focus - aperture).normalize())
        } else {
            (Vector3f::zeros(), d)
        };

        let ray = Ray3f::new(self.to_world.apply_point(origin),
                             self.to_world.apply_vector(dir),
                             Some(self.near_clip),
                             Some(self.far_clip));
        CameraSample { ray, weight: 1.0 }
    }
}
