// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Matrix4f, Vector3f, Vector4f, PI};

/// Affine 4x4 transform with its cached inverse.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4f,
    inv_matrix: Matrix4f
}

impl Default for Transform {
    fn default() -> Self {
        Self { matrix: Matrix4f::identity(),
               inv_matrix: Matrix4f::identity() }
    }
}

impl Transform {
    pub fn new(matrix: Matrix4f) -> Self {
        Self { matrix,
               inv_matrix: matrix.try_inverse().unwrap_or_else(Matrix4f::identity) }
    }

    pub fn translate(t: &Vector3f) -> Self {
        Self::new(Matrix4f::new_translation(t))
    }

    pub fn scale(s: &Vector3f) -> Self {
        Self::new(Matrix4f::new_nonuniform_scaling(s))
    }

    pub fn rotate(axis: &Vector3f, angle_degrees: Float) -> Self {
        let axis = nalgebra::Unit::new_normalize(*axis);
        let rotation = nalgebra::Rotation3::from_axis_angle(&axis, angle_degrees * PI / 180.0);
        Self::new(rotation.to_homogeneous())
    }

    /// Camera-to-world matrix: columns are right, up, forward and the origin.
    /// Camera space has x right, y up and looks down +z.
    pub fn look_at(origin: &Vector3f, target: &Vector3f, up: &Vector3f) -> Self {
        let forward = (target - origin).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(&forward);
        let mut m = Matrix4f::identity();
        for row in 0..3 {
            m[(row, 0)] = right[row];
            m[(row, 1)] = up[row];
            m[(row, 2)] = forward[row];
            m[(row, 3)] = origin[row];
        }
        Self::new(m)
    }

    /// `self` applied after `other`.
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform { matrix: self.matrix * other.matrix,
                    inv_matrix: other.inv_matrix * self.inv_matrix }
    }

    pub fn matrix(&self) -> &Matrix4f {
        &self.matrix
    }

    pub fn inverse(&self) -> Transform {
        Transform { matrix: self.inv_matrix, inv_matrix: self.matrix }
    }

    pub fn apply_point(&self, p: Vector3f) -> Vector3f {
        let h = self.matrix * Vector4f::new(p.x, p.y, p.z, 1.0);
        h.xyz() / h.w
    }

    pub fn apply_vector(&self, v: Vector3f) -> Vector3f {
        (self.matrix * Vector4f::new(v.x, v.y, v.z, 0.0)).xyz()
    }

    // Normals transform with the inverse transpose.
    pub fn apply_normal(&self, n: Vector3f) -> Vector3f {
        (self.inv_matrix.transpose() * Vector4f::new(n.x, n.y, n.z, 0.0)).xyz()
    }
}
