//! Ray intersection for every primitive shape.
//!
//! Each solver works on the canonical shape in object space and returns a
//! [`LocalHit`]. [`Primitive`]'s `Hittable` impl maps the ray into object
//! space (at the ray's time for moving primitives), dispatches on the shape
//! and carries the result back to world space. The world-space `t` is
//! recomputed from the world hit point so non-uniform scale cannot skew it.

mod cone;
mod cube;
mod cylinder;
mod plane;
pub mod quartic;
mod sphere;
mod torus;

pub use torus::torus_implicit;

use prism_core::{Primitive, Shape};
use prism_math::{Aabb, Interval, Ray, Transform, Vec3};

use crate::{HitRecord, Hittable};

/// Object-space geometry of a hit, before it is attached to a primitive.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LocalHit {
    pub point: Vec3,
    /// Outward normal, not necessarily normalized
    pub normal: Vec3,
    pub u: f64,
    pub v: f64,
    /// Direction of increasing `u`, not necessarily normalized
    pub tangent: Vec3,
}

/// Object-space bounds of a canonical shape. Planes are already in world
/// space and are handled by the caller.
fn object_bounds(shape: &Shape) -> Aabb {
    match shape {
        Shape::Sphere | Shape::Cube { .. } => Aabb::from_points(Vec3::splat(-1.0), Vec3::ONE),
        Shape::Cylinder { radius, depth } | Shape::Cone { radius, depth } => {
            let half = Vec3::new(*radius, *radius, depth * 0.5);
            Aabb::from_points(-half, half)
        }
        Shape::Torus {
            major_radius,
            minor_radius,
        } => {
            let outer = major_radius + minor_radius;
            let half = Vec3::new(outer, outer, *minor_radius);
            Aabb::from_points(-half, half)
        }
        Shape::Plane { points } => Aabb::enclosing(points),
    }
}

impl Hittable for Primitive {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        if !self.visible {
            return false;
        }

        let transform = match self.shape {
            Shape::Plane { .. } => Transform::identity(),
            _ => self.transform_at(ray.time),
        };
        if !transform.is_invertible() {
            return false;
        }
        let object_ray = transform.ray_to_object(ray);

        let local = match &self.shape {
            Shape::Sphere => sphere::intersect(&object_ray, ray_t),
            Shape::Cube { uv_scale } => cube::intersect(&object_ray, ray_t, *uv_scale),
            Shape::Plane { points } => plane::intersect(points, &object_ray, ray_t),
            Shape::Cylinder { radius, depth } => {
                cylinder::intersect(&object_ray, ray_t, *radius, *depth)
            }
            Shape::Cone { radius, depth } => cone::intersect(&object_ray, ray_t, *radius, *depth),
            Shape::Torus {
                major_radius,
                minor_radius,
            } => torus::intersect(&object_ray, ray_t, *major_radius, *minor_radius),
        };
        let Some(local) = local else {
            return false;
        };

        rec.p = transform.point_to_world(local.point);
        rec.t = (rec.p - ray.origin).length() / ray.direction.length();
        rec.set_face_normal(ray, transform.normal_to_world(local.normal));
        rec.set_tangent_frame(transform.vector_to_world(local.tangent).normalize_or_zero());
        rec.u = local.u;
        rec.v = local.v;
        rec.material = &self.material;
        rec.object_name = &self.name;
        true
    }

    /// World-space bounds. Moving primitives use the union of their bounds at
    /// shutter open and close.
    fn bounding_box(&self) -> Aabb {
        let object_box = object_bounds(&self.shape);
        if let Shape::Plane { .. } = self.shape {
            return object_box;
        }
        match &self.motion {
            Some(motion) if self.has_motion() => Aabb::surrounding(
                &motion.start.aabb_to_world(&object_box),
                &motion.end.aabb_to_world(&object_box),
            ),
            _ => self.transform.aabb_to_world(&object_box),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::{Material, Motion};
    use prism_math::Mat4;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn first_hit<'a>(prim: &'a Primitive, ray: &Ray) -> Option<HitRecord<'a>> {
        let mut rec = HitRecord::default();
        prim.hit(ray, Interval::new(1e-5, f64::INFINITY), &mut rec)
            .then_some(rec)
    }

    #[test]
    fn test_unit_sphere_scenario() {
        let sphere = Primitive::new("ball", Shape::Sphere, Transform::identity());
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 0.0);
        let rec = first_hit(&sphere, &ray).unwrap();

        assert!((rec.t - 4.0).abs() < 1e-12);
        assert!((rec.p - Vec3::Z).length() < 1e-12);
        assert!((rec.normal - Vec3::Z).length() < 1e-12);
        assert!(rec.front_face);
        assert_eq!(rec.object_name, "ball");
    }

    #[test]
    fn test_transformed_sphere_hits_lie_on_surface() {
        let transform = Transform::from_trs(
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(0.3, 0.7, -0.2),
            Vec3::new(2.0, 0.5, 1.5),
        );
        let sphere = Primitive::new("ellipsoid", Shape::Sphere, transform);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            // Aim at a random point on the surface from outside
            let dir_obj = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .normalize();
            let target = transform.point_to_world(dir_obj);
            let origin = transform.point_to_world(dir_obj * 4.0);
            let ray = Ray::new(origin, (target - origin).normalize(), 0.0);

            let rec = first_hit(&sphere, &ray).unwrap();
            let p_obj = transform.point_to_object(rec.p);
            assert!((p_obj.length() - 1.0).abs() < 1e-9);
            assert!((rec.normal.length() - 1.0).abs() < 1e-9);
            assert!((ray.at(rec.t) - rec.p).length() < 1e-9);
        }
    }

    #[test]
    fn test_invisible_primitive_is_never_hit() {
        let sphere = Primitive::new("ghost", Shape::Sphere, Transform::identity()).with_visible(false);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 0.0);
        assert!(first_hit(&sphere, &ray).is_none());
    }

    #[test]
    fn test_singular_transform_never_hits() {
        let flat = Transform::from_matrix(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)));
        let sphere = Primitive::new("flat", Shape::Sphere, flat);
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 0.0);
        assert!(first_hit(&sphere, &ray).is_none());
    }

    #[test]
    fn test_hit_record_borrows_material() {
        let sphere = Primitive::new("red", Shape::Sphere, Transform::identity())
            .with_material(Material::new(Vec3::new(1.0, 0.0, 0.0)));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 0.0);
        let rec = first_hit(&sphere, &ray).unwrap();
        assert!(std::ptr::eq(rec.material, &sphere.material));
    }

    #[test]
    fn test_moving_sphere_follows_ray_time() {
        let motion = Motion::new(
            Mat4::IDENTITY,
            Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0)),
        );
        let sphere =
            Primitive::new("mover", Shape::Sphere, Transform::identity()).with_motion(motion);

        let at = |x: f64, time: f64| Ray::new(Vec3::new(x, 0.0, 5.0), Vec3::NEG_Z, time);
        assert!(first_hit(&sphere, &at(0.0, 0.0)).is_some());
        assert!(first_hit(&sphere, &at(4.0, 0.0)).is_none());
        assert!(first_hit(&sphere, &at(4.0, 1.0)).is_some());
        assert!(first_hit(&sphere, &at(2.0, 0.5)).is_some());
    }

    #[test]
    fn test_motion_bounds_cover_both_keyframes() {
        let motion = Motion::new(
            Mat4::IDENTITY,
            Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0)),
        );
        let sphere =
            Primitive::new("mover", Shape::Sphere, Transform::identity()).with_motion(motion);
        let bbox = sphere.bounding_box();

        assert!(bbox.min().x <= -1.0);
        assert!(bbox.max().x >= 5.0);
    }

    #[test]
    fn test_torus_bounds() {
        let torus = Primitive::new(
            "ring",
            Shape::Torus {
                major_radius: 2.0,
                minor_radius: 0.5,
            },
            Transform::identity(),
        );
        let bbox = torus.bounding_box();
        assert!((bbox.max() - Vec3::new(2.5, 2.5, 0.5)).length() < 1e-3);
    }
}
