#![warn(missing_docs)]

//! Math types for torsoscan.
//!
//! Thin wrappers around nalgebra providing the point, vector and
//! transform types used by the mesh kernel and the analysis pipeline,
//! plus the small statistics helpers the searches score with.

pub mod stats;

use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

pub use stats::{mean, median, similarity_coefficient};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in the plane.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in the plane.
pub type Vec2 = Vector2<f64>;

/// One of the three world axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Forward/backward axis. The scanned subject faces `-X`.
    X,
    /// Lateral axis. The subject's left side is `-Y`.
    Y,
    /// Vertical axis.
    Z,
}

impl Axis {
    /// Component index (0, 1 or 2).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along this axis.
    pub fn unit(self) -> Vec3 {
        let mut v = Vec3::zeros();
        v[self.index()] = 1.0;
        v
    }
}

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians (counter-clockwise seen from `+Z`).
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Compose: apply `self` first, then `next`.
    pub fn then(&self, next: &Transform) -> Self {
        Self {
            matrix: next.matrix * self.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Whether this is exactly the identity.
    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix4::identity()
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Rotate a planar point about the origin by `angle` radians.
pub fn rotate_2d(p: &Point2, angle: f64) -> Point2 {
    let (s, c) = angle.sin_cos();
    Point2::new(c * p.x - s * p.y, s * p.x + c * p.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(t.apply_point(&p), p);
        assert!(t.is_identity());
    }

    #[test]
    fn test_translation_moves_points_not_vectors() {
        let t = Transform::translation(0.5, -1.0, 2.0);
        let p = t.apply_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p.x, 1.5);
        assert_relative_eq!(p.y, 0.0);
        assert_relative_eq!(p.z, 3.0);
        let v = t.apply_vec(&Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.x, 1.0);
        assert_relative_eq!(v.y, 0.0);
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let t = Transform::rotation_z(FRAC_PI_2);
        let p = t.apply_point(&Point3::new(1.0, 0.0, 4.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 4.0);
    }

    #[test]
    fn test_then_applies_in_order() {
        // Rotate first, then translate.
        let t = Transform::rotation_z(FRAC_PI_2).then(&Transform::translation(1.0, 0.0, 0.0));
        let p = t.apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = Transform::translation(1.0, 2.0, 3.0).then(&Transform::rotation_z(0.3));
        let inv = t.inverse().unwrap();
        let p = Point3::new(-0.2, 0.7, 1.1);
        let back = inv.apply_point(&t.apply_point(&p));
        assert!((back - p).norm() < 1e-12);
    }

    #[test]
    fn test_scale_then_translate() {
        let t = Transform::scale(2.0, 2.0, 1.0).then(&Transform::translation(0.0, 0.0, 5.0));
        let p = t.apply_point(&Point3::new(1.0, -1.0, 1.0));
        assert_relative_eq!(p.x, 2.0);
        assert_relative_eq!(p.y, -2.0);
        assert_relative_eq!(p.z, 6.0);
    }

    #[test]
    fn test_axis_unit() {
        assert_eq!(Axis::Z.unit(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(Axis::Y.index(), 1);
    }

    #[test]
    fn test_rotate_2d() {
        let p = rotate_2d(&Point2::new(0.0, 2.0), -FRAC_PI_2);
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
    }
}
