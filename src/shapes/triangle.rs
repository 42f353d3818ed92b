// Copyright @yucwang 2023

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::warp::square_to_triangle;

// Padding for the bounds of axis-aligned triangles.
const BOUNDS_PADDING: Float = 1e-5;

/// Ray parameter and the barycentrics of vertices 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: Float,
    pub b1: Float,
    pub b2: Float,
}

impl TriangleHit {
    pub fn barycentric(&self) -> Vector3f {
        Vector3f::new(1.0 - self.b1 - self.b2, self.b1, self.b2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    p0: Vector3f,
    p1: Vector3f,
    p2: Vector3f
}

impl Triangle {
    pub fn new(p0: Vector3f, p1: Vector3f, p2: Vector3f) -> Self {
        Triangle { p0, p1, p2 }
    }

    pub fn vertices(&self) -> (Vector3f, Vector3f, Vector3f) {
        (self.p0, self.p1, self.p2)
    }

    pub fn bounding_box(&self) -> AABB {
        let mut bound = AABB::new(self.p0, self.p1);
        bound.expand_by_point(&self.p2);
        bound.p_min -= Vector3f::repeat(BOUNDS_PADDING);
        bound.p_max += Vector3f::repeat(BOUNDS_PADDING);
        bound
    }

    /// Counter-clockwise winding gives the front face.
    pub fn geometric_normal(&self) -> Vector3f {
        let n = (self.p1 - self.p0).cross(&(self.p2 - self.p0));
        let len = n.norm();
        if len > 0.0 { n / len } else { Vector3f::new(0.0, 0.0, 1.0) }
    }

    pub fn surface_area(&self) -> Float {
        0.5 * (self.p1 - self.p0).cross(&(self.p2 - self.p0)).norm()
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.surface_area() > 0.0)
    }

    /// Moller-Trumbore test against the ray interval. Both faces are hit.
    pub fn intersect(&self, ray: &Ray3f) -> Option<TriangleHit> {
        let edge1 = self.p1 - self.p0;
        let edge2 = self.p2 - self.p0;
        let pvec = ray.dir().cross(&edge2);
        let det = edge1.dot(&pvec);
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.origin() - self.p0;
        let b1 = tvec.dot(&pvec) * inv_det;
        if b1 < 0.0 || b1 > 1.0 {
            return None;
        }

        let qvec = tvec.cross(&edge1);
        let b2 = ray.dir().dot(&qvec) * inv_det;
        if b2 < 0.0 || b1 + b2 > 1.0 {
            return None;
        }

        let t = edge2.dot(&qvec) * inv_det;
        if !ray.test_segment(t) {
            return None;
        }

        Some(TriangleHit { t, b1, b2 })
    }

    pub fn interpolate(&self, bary: &Vector3f) -> Vector3f {
        self.p0 * bary.x + self.p1 * bary.y + self.p2 * bary.z
    }

    /// Uniform point on the triangle; returns the position and barycentrics.
    pub fn sample(&self, u: &Vector2f) -> (Vector3f, Vector3f) {
        let bary = square_to_triangle(u);
        (self.interpolate(&bary), bary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(Vector3f::new(0.0, 0.0, 0.0),
                      Vector3f::new(1.0, 0.0, 0.0),
                      Vector3f::new(0.0, 1.0, 0.0))
    }

    #[test]
    fn test_triangle_intersection() {
        let tri = unit_triangle();
        let ray = Ray3f::new(Vector3f::new(0.25, 0.25, 1.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        let hit = tri.intersect(&ray).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-6);
        assert!((hit.b1 - 0.25).abs() < 1e-6);
        assert!((hit.b2 - 0.25).abs() < 1e-6);
        assert!((tri.interpolate(&hit.barycentric()) - Vector3f::new(0.25, 0.25, 0.0)).norm() < 1e-6);

        // Back face is hit too.
        let back = Ray3f::new(Vector3f::new(0.25, 0.25, -1.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(tri.intersect(&back).is_some());

        let outside = Ray3f::new(Vector3f::new(0.8, 0.8, 1.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!(tri.intersect(&outside).is_none());

        let short = Ray3f::new(Vector3f::new(0.25, 0.25, 1.0), Vector3f::new(0.0, 0.0, -1.0), None, Some(0.5));
        assert!(tri.intersect(&short).is_none());
    }

    #[test]
    fn test_triangle_area_normal_and_bounds() {
        let tri = unit_triangle();
        assert!((tri.surface_area() - 0.5).abs() < 1e-6);
        assert!((tri.geometric_normal() - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-6);
        assert!(tri.bounding_box().extent().z > 0.0);
        assert!(!tri.is_degenerate());

        let flat = Triangle::new(Vector3f::zeros(), Vector3f::new(1.0, 0.0, 0.0), Vector3f::new(2.0, 0.0, 0.0));
        assert!(flat.is_degenerate());
    }

    #[test]
    fn test_triangle_sample_inside() {
        let tri = unit_triangle();
        for &(a, b) in [(0.0, 0.0), (0.3, 0.9), (0.99, 0.5), (0.5, 0.01)].iter() {
            let (p, bary) = tri.sample(&Vector2f::new(a, b));
            assert!(p.x >= -1e-6 && p.y >= -1e-6 && p.x + p.y <= 1.0 + 1e-6);
            assert!((bary.x + bary.y + bary.z - 1.0).abs() < 1e-5);
        }
    }
}
