//! Hittable trait and HitRecord for ray-object intersection.

use prism_core::Material;
use prism_math::{Aabb, Interval, Ray, Vec3};

/// Material referenced by `HitRecord::default()`.
static DEFAULT_MATERIAL: Material = Material::DEFAULT;

/// Record of a ray-object intersection.
#[derive(Clone, Debug)]
pub struct HitRecord<'a> {
    /// Point of intersection (world space)
    pub p: Vec3,
    /// Surface normal at intersection (always points against the ray)
    pub normal: Vec3,
    /// Tangent frame for normal and bump mapping, orthogonal to `normal`
    pub tangent: Vec3,
    pub bitangent: Vec3,
    /// Material of the hit primitive
    pub material: &'a Material,
    /// Name of the hit primitive
    pub object_name: &'a str,
    /// UV texture coordinates
    pub u: f64,
    pub v: f64,
    /// World-space ray parameter of the intersection
    pub t: f64,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> Default for HitRecord<'a> {
    fn default() -> Self {
        Self {
            p: Vec3::ZERO,
            normal: Vec3::ZERO,
            tangent: Vec3::X,
            bitangent: Vec3::Y,
            material: &DEFAULT_MATERIAL,
            object_name: "",
            u: 0.0,
            v: 0.0,
            t: 0.0,
            front_face: false,
        }
    }
}

impl<'a> HitRecord<'a> {
    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction.dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }

    /// Orthonormalize a world-space tangent against the stored normal and
    /// derive the bitangent as `N x T`.
    pub fn set_tangent_frame(&mut self, tangent: Vec3) {
        let tangent = tangent - self.normal * tangent.dot(self.normal);
        self.tangent = tangent
            .try_normalize()
            .unwrap_or_else(|| self.normal.any_orthonormal_vector());
        self.bitangent = self.normal.cross(self.tangent).normalize_or_zero();
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this object within the given interval.
    ///
    /// Returns true if hit, and fills in the hit record.
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_normal_front() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 0.0);
        let mut rec = HitRecord::default();
        rec.set_face_normal(&ray, Vec3::Z);
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_face_normal_back() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z, 0.0);
        let mut rec = HitRecord::default();
        rec.set_face_normal(&ray, Vec3::Z);
        assert!(!rec.front_face);
        assert_eq!(rec.normal, Vec3::NEG_Z);
    }

    #[test]
    fn test_tangent_frame_is_orthonormal() {
        let mut rec = HitRecord {
            normal: Vec3::new(0.0, 1.0, 1.0).normalize(),
            ..HitRecord::default()
        };
        rec.set_tangent_frame(Vec3::new(1.0, 1.0, 0.0));

        assert!((rec.tangent.length() - 1.0).abs() < 1e-12);
        assert!((rec.bitangent.length() - 1.0).abs() < 1e-12);
        assert!(rec.tangent.dot(rec.normal).abs() < 1e-12);
        assert!(rec.bitangent.dot(rec.tangent).abs() < 1e-12);
    }

    #[test]
    fn test_tangent_parallel_to_normal_falls_back() {
        let mut rec = HitRecord {
            normal: Vec3::Z,
            ..HitRecord::default()
        };
        rec.set_tangent_frame(Vec3::new(0.0, 0.0, 3.0));
        assert!(rec.tangent.is_finite());
        assert!(rec.tangent.dot(Vec3::Z).abs() < 1e-12);
    }
}
