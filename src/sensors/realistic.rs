// Copyright @yucwang 2026

use crate::core::interaction::CameraSample;
use crate::materials::microfacet::refract;
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON};
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;
use crate::math::warp::sample_uniform_disk_concentric;

// Full-frame sensor width in scene units (metres).
const SENSOR_WIDTH: Float = 0.024;

/// One refracting surface or stop of a lens stack.
///
/// `curvature` is the signed radius (0 for a flat stop), `thickness` the
/// axial distance from the previous surface (from the nominal sensor plane
/// for the first one), `eta` the index of the medium on the scene side
/// (0 means air) and `aperture` the clear radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensInterface {
    pub curvature: Float,
    pub thickness: Float,
    pub eta: Float,
    pub aperture: Float,
}

impl LensInterface {
    pub fn new(curvature: Float, thickness: Float, eta: Float, aperture: Float) -> Self {
        Self { curvature, thickness, eta, aperture }
    }

    fn medium_index(&self) -> Float {
        if self.eta == 0.0 { 1.0 } else { self.eta }
    }
}

/// Camera tracing rays from the sensor through a stack of spherical lens
/// elements. Camera space has the sensor behind the lens and looks down +Z.
#[derive(Debug, Clone)]
pub struct RealisticCamera {
    to_world: Transform,
    interfaces: Vec<LensInterface>,
    sensor_shift: Float,
    width: usize,
    height: usize,
}

impl RealisticCamera {
    pub fn new(origin: &Vector3f,
               target: &Vector3f,
               up: &Vector3f,
               interfaces: Vec<LensInterface>,
               sensor_shift: Float,
               width: usize,
               height: usize) -> Self {
        if interfaces.is_empty() {
            log::warn!("Realistic camera has no lens interfaces; every ray will be vignetted.");
        }
        Self {
            to_world: Transform::look_at(origin, target, up),
            interfaces,
            sensor_shift,
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn interfaces(&self) -> &[LensInterface] {
        &self.interfaces
    }

    pub fn sensor_size(&self) -> (Float, Float) {
        let aspect = self.width as Float / self.height as Float;
        (SENSOR_WIDTH, SENSOR_WIDTH / aspect)
    }

    /// Ray leaving the film towards the rear element, in camera space. The
    /// film is mirrored so the projected image comes out upright.
    pub fn generate_sensor_ray(&self, pixel: &Vector2f, lens: &Vector2f) -> Option<Ray3f> {
        let rear = self.interfaces.first()?;
        let (sw, sh) = self.sensor_size();
        let film = Vector3f::new(sw * 0.5 - pixel.x / self.width as Float * sw,
                                 -sh * 0.5 + pixel.y / self.height as Float * sh,
                                 self.sensor_shift);

        let disk = sample_uniform_disk_concentric(lens) * rear.aperture;
        let aim = Vector3f::new(disk.x, disk.y, rear.thickness);
        let dir = aim - film;
        if dir.z <= 0.0 {
            return None;
        }
        Some(Ray3f::new(film, dir, None, None))
    }

    /// Walks the ray through every interface from the sensor side. `None`
    /// when it misses an aperture or is totally internally reflected.
    pub fn trace(&self, ray: &Ray3f) -> Option<Ray3f> {
        let mut origin = ray.origin();
        let mut dir = ray.dir();
        let mut z = 0.0;
        let mut eta_prev = 1.0;

        for interface in &self.interfaces {
            z += interface.thickness;

            let (p, normal) = if interface.curvature == 0.0 {
                if dir.z.abs() < 1e-12 {
                    return None;
                }
                let t = (z - origin.z) / dir.z;
                if t <= 0.0 {
                    return None;
                }
                (origin + dir * t, None)
            } else {
                let radius = interface.curvature;
                let centre = Vector3f::new(0.0, 0.0, z + radius);
                let oc = origin - centre;
                let b = oc.dot(&dir);
                let c = oc.norm_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let root = disc.sqrt();
                let use_closer = (dir.z > 0.0) != (radius < 0.0);
                let t = if use_closer { -b - root } else { -b + root };
                if t <= 0.0 {
                    return None;
                }
                let p = origin + dir * t;
                (p, Some((p - centre) / radius.abs()))
            };

            if p.x * p.x + p.y * p.y > interface.aperture * interface.aperture {
                return None;
            }

            let eta_next = interface.medium_index();
            if let Some(n) = normal {
                let n = if n.dot(&dir) < 0.0 { n } else { -n };
                dir = refract(&(-dir), &n, eta_prev / eta_next)?.normalize();
            }
            eta_prev = eta_next;
            origin = p;
        }

        Some(Ray3f::new(origin, dir, Some(EPSILON), None))
    }

    pub fn create_ray(&self, pixel: &Vector2f, lens: &Vector2f) -> CameraSample {
        let traced = self.generate_sensor_ray(pixel, lens).and_then(|r| self.trace(&r));
        match traced {
            Some(r) => CameraSample {
                ray: Ray3f::new(self.to_world.apply_point(r.origin()),
                                self.to_world.apply_vector(r.dir()),
                                Some(EPSILON),
                                None),
                weight: 1.0,
            },
            None => CameraSample {
                ray: Ray3f::new(self.to_world.apply_point(Vector3f::zeros()),
                                self.to_world.apply_vector(Vector3f::new(0.0, 0.0, 1.0)),
                                Some(EPSILON),
                                None),
                weight: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::perspective::PerspectiveCamera;
    use crate::math::constants::PI;

    fn frame() -> (Vector3f, Vector3f, Vector3f) {
        (Vector3f::new(0.0, 1.0, 3.0), Vector3f::new(0.0, 1.0, 0.0), Vector3f::new(0.0, 1.0, 0.0))
    }

    #[test]
    fn test_single_stop_matches_perspective() {
        let (origin, target, up) = frame();
        let (width, height) = (64, 48);
        let distance = 0.05;
        let stop = LensInterface::new(0.0, distance, 0.0, 1e-4);
        let real = RealisticCamera::new(&origin, &target, &up, vec![stop], 0.0, width, height);

        let (_, sh) = real.sensor_size();
        let fov_y = 2.0 * (sh / (2.0 * distance)).atan() * 180.0 / PI;
        let pin = PerspectiveCamera::new(&origin, &target, &up, fov_y, width, height, EPSILON, 1e5);

        for &(px, py) in [(0.0, 0.0), (32.0, 24.0), (10.5, 40.25), (63.9, 1.0)].iter() {
            let pixel = Vector2f::new(px, py);
            let a = real.create_ray(&pixel, &Vector2f::new(0.5, 0.5));
            let b = pin.create_ray(&pixel, &Vector2f::new(0.5, 0.5));
            assert_eq!(a.weight, 1.0);
            assert!((a.ray.dir() - b.ray.dir()).norm() < 1e-3, "pixel {:?}", pixel);
        }
    }

    #[test]
    fn test_stop_vignettes_outside_aperture() {
        let (origin, target, up) = frame();
        let stops = vec![LensInterface::new(0.0, 0.05, 0.0, 0.01),
                         LensInterface::new(0.0, 0.01, 0.0, 1e-4)];
        let cam = RealisticCamera::new(&origin, &target, &up, stops, 0.0, 16, 16);
        // Aiming at the rim of the first stop cannot pass the pinhole behind it.
        let s = cam.create_ray(&Vector2f::new(8.0, 8.0), &Vector2f::new(1.0, 0.5));
        assert_eq!(s.weight, 0.0);

        let empty = RealisticCamera::new(&origin, &target, &up, Vec::new(), 0.0, 16, 16);
        assert_eq!(empty.create_ray(&Vector2f::new(8.0, 8.0), &Vector2f::new(0.5, 0.5)).weight, 0.0);
    }

    #[test]
    fn test_biconvex_lens_focuses_parallel_rays() {
        // Symmetric glass lens with radii 0.1 and index 1.5 has f ~ 0.1.
        let cam = RealisticCamera::new(&Vector3f::zeros(), &Vector3f::new(0.0, 0.0, 1.0),
                                       &Vector3f::new(0.0, 1.0, 0.0),
                                       vec![LensInterface::new(0.1, 0.0, 1.5, 0.02),
                                            LensInterface::new(-0.1, 0.002, 0.0, 0.02)],
                                       0.0, 8, 8);
        let mut hits = Vec::new();
        for &h in [-0.002, 0.001, 0.002].iter() {
            let ray = Ray3f::new(Vector3f::new(h, 0.0, -1.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
            let out = cam.trace(&ray).unwrap();
            assert!(out.dir().z > 0.0);
            let t = -out.origin().x / out.dir().x;
            hits.push(out.at(t).z);
        }
        for z in hits {
            assert!((z - 0.1).abs() < 0.01, "focus at {}", z);
        }
    }

    #[test]
    fn test_total_internal_reflection_fails() {
        // Dense medium with a strongly curved exit surface.
        let cam = RealisticCamera::new(&Vector3f::zeros(), &Vector3f::new(0.0, 0.0, 1.0),
                                       &Vector3f::new(0.0, 1.0, 0.0),
                                       vec![LensInterface::new(0.0, 0.01, 2.5, 1.0),
                                            LensInterface::new(-0.012, 0.01, 0.0, 1.0)],
                                       0.0, 8, 8);
        let ray = Ray3f::new(Vector3f::new(0.009, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(cam.trace(&ray).is_none());
    }
}
