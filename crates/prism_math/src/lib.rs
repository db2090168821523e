//! Prism math - f64 linear algebra for the ray tracer.
//!
//! Wraps the double precision types of `glam` and adds the pieces a
//! ray tracer needs on top: intervals, bounding boxes, rays, object/world
//! transforms and keyframe interpolation for motion blur.

// Re-export glam's double precision types
pub use glam::{DMat3, DMat4, DQuat, DVec3, DVec4, EulerRot};

/// 3-component vector used for points, directions and colors.
pub type Vec3 = DVec3;
/// 4x4 affine matrix (column-major, as glam stores it).
pub type Mat4 = DMat4;
/// Rotation quaternion.
pub type Quat = DQuat;
/// Linear RGB color.
pub type Color = DVec3;

mod aabb;
mod interval;
mod ray;
mod transform;
mod trs;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::{Mat4Ext, Transform};
pub use trs::{interpolate_matrices, Trs};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_vec3_is_double_precision() {
        let v = Vec3::new(1.0, 1e-12, 0.0);
        assert!(v.y > 0.0);
        assert!((v.length() - 1.0).abs() < 1e-15);
    }
}
