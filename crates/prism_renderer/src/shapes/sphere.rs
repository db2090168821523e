//! Unit sphere centred at the origin.

use std::f64::consts::PI;

use prism_math::{Interval, Ray, Vec3};

use super::LocalHit;

pub(crate) fn intersect(ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
    let oc = ray.origin;
    let a = ray.direction.length_squared();
    let half_b = oc.dot(ray.direction);
    let c = oc.length_squared() - 1.0;

    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrtd = discriminant.sqrt();

    // Find the nearest root in the acceptable range
    let mut root = (-half_b - sqrtd) / a;
    if !ray_t.accepts(root) {
        root = (-half_b + sqrtd) / a;
        if !ray_t.accepts(root) {
            return None;
        }
    }

    let p = ray.at(root);
    let (u, v) = sphere_uv(p);

    // d/d(phi) of the spherical parameterization
    let mut tangent = Vec3::new(-p.y, p.x, 0.0);
    if tangent.length_squared() < 1e-6 {
        tangent = Vec3::X;
    }

    Some(LocalHit {
        point: p,
        normal: p,
        u,
        v,
        tangent,
    })
}

/// Spherical mapping with poles on z; `v = 1` at the top.
fn sphere_uv(p: Vec3) -> (f64, f64) {
    let theta = p.z.clamp(-1.0, 1.0).acos();
    let phi = p.y.atan2(p.x);
    ((phi + PI) / (2.0 * PI), 1.0 - theta / PI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_hit() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 0.0);
        let hit = intersect(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert_eq!(hit.point, Vec3::Z);
        assert_eq!(hit.normal, Vec3::Z);
        assert!((hit.v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_miss() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 5.0), Vec3::NEG_Z, 0.0);
        assert!(intersect(&ray, Interval::new(0.001, f64::INFINITY)).is_none());
    }

    #[test]
    fn test_ray_from_inside_hits_far_side() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);
        let hit = intersect(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert_eq!(hit.point, Vec3::X);
    }

    #[test]
    fn test_interval_excludes_far_root() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 0.0);
        assert!(intersect(&ray, Interval::new(0.001, 4.0)).is_none());
    }

    #[test]
    fn test_uv_range() {
        for p in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Z] {
            let (u, v) = sphere_uv(p);
            assert!((0.0..=1.0).contains(&u));
            assert!((0.0..=1.0).contains(&v));
        }
        assert!((sphere_uv(Vec3::NEG_Z).1).abs() < 1e-12);
    }
}
