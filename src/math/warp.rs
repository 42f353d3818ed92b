// Copyright @yucwang 2023

use super::constants::{ INV_PI, INV_TWO_PI, PI, Float, Vector2f, Vector3f };

pub fn sample_uniform_hemisphere(u: &Vector2f) -> Vector3f {
    let z: Float = u.x;
    let r: Float = (1. - z * z).max(0.).sqrt();
    let phi: Float = 2. * PI * u.y;

    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn sample_uniform_hemisphere_pdf() -> Float {
    INV_TWO_PI
}

/// Polar mapping, `r = sqrt(u.x)`.
pub fn sample_uniform_disk(u: &Vector2f) -> Vector2f {
    let r = u.x.sqrt();
    let theta = 2. * PI * u.y;

    Vector2f::new(r * theta.cos(), r * theta.sin())
}

/// Shirley-Chiu concentric mapping; maps the square centre to the disk centre.
pub fn sample_uniform_disk_concentric(u: &Vector2f) -> Vector2f {
    let r1: Float = 2.0 * u.x - 1.0;
    let r2: Float = 2.0 * u.y - 1.0;

    let phi: Float;
    let r:   Float;

    if r1 == 0. && r2 == 0. {
        r = 0.0;
        phi = 0.0;
    } else if r1 * r1 > r2 * r2 {
        r = r1;
        phi = (PI / 4.0) * (r2 / r1);
    } else {
        r = r2;
        phi = (PI / 2.0) - (r1 / r2) * (PI / 4.0);
    }

    let (sin_phi, cos_phi) = phi.sin_cos();

    Vector2f::new(r * cos_phi, r * sin_phi)
}

pub fn sample_cosine_hemisphere(u: &Vector2f) -> Vector3f {
    let p = sample_uniform_disk(u);
    let z = (1. - p.x * p.x - p.y * p.y).max(0.).sqrt();

    Vector3f::new(p.x, p.y, z)
}

pub fn sample_cosine_hemisphere_pdf(v: &Vector3f) -> Float {
    if v.z <= 0. {
        0.
    } else {
        v.z * INV_PI
    }
}

/// Uniform barycentric coordinates `(b0, b1, b2)` over a triangle.
pub fn square_to_triangle(u: &Vector2f) -> Vector3f {
    let su = u.x.sqrt();
    let b1 = 1. - su;
    let b2 = u.y * su;

    Vector3f::new(1. - b1 - b2, b1, b2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Pcg32;

    #[test]
    fn test_disk_samples_stay_inside() {
        let mut rng = Pcg32::new(7, 1);
        for _ in 0..1000 {
            let u = Vector2f::new(rng.next_f32(), rng.next_f32());
            assert!(sample_uniform_disk(&u).norm() <= 1.0 + 1e-6);
            assert!(sample_uniform_disk_concentric(&u).norm() <= 1.0 + 1e-6);
        }
        let centre = sample_uniform_disk_concentric(&Vector2f::new(0.5, 0.5));
        assert!(centre.norm() < 1e-6);
    }

    #[test]
    fn test_cosine_hemisphere_is_normalized() {
        let mut rng = Pcg32::new(3, 5);
        for _ in 0..1000 {
            let u = Vector2f::new(rng.next_f32(), rng.next_f32());
            let v = sample_cosine_hemisphere(&u);
            assert!((v.norm() - 1.0).abs() < 1e-4);
            assert!(v.z >= 0.0);
            assert!((sample_cosine_hemisphere_pdf(&v) - v.z * INV_PI).abs() < 1e-6);
        }
        assert_eq!(sample_cosine_hemisphere_pdf(&Vector3f::new(0.0, 0.0, -1.0)), 0.0);
    }

    #[test]
    fn test_cosine_hemisphere_mean_cosine() {
        // E[cos] under p = cos/pi is 2/3.
        let mut rng = Pcg32::new(11, 2);
        let n = 20000;
        let mut sum = 0.0;
        for _ in 0..n {
            let u = Vector2f::new(rng.next_f32(), rng.next_f32());
            sum += sample_cosine_hemisphere(&u).z;
        }
        let mean = sum / n as Float;
        assert!((mean - 2.0 / 3.0).abs() < 0.01);
    }

    #[test]
    fn test_square_to_triangle_barycentrics() {
        let mut rng = Pcg32::new(5, 9);
        for _ in 0..1000 {
            let b = square_to_triangle(&Vector2f::new(rng.next_f32(), rng.next_f32()));
            assert!(b.x >= -1e-6 && b.y >= -1e-6 && b.z >= -1e-6);
            assert!((b.x + b.y + b.z - 1.0).abs() < 1e-5);
        }
        assert!((sample_uniform_hemisphere_pdf() - 1.0 / (2.0 * PI)).abs() < 1e-6);
    }
}
