//! Cube spanning [-1, 1] on every axis.

use prism_math::{Interval, Ray, Vec3};

use super::LocalHit;

/// Direction components below this are treated as parallel to a slab.
const PARALLEL_EPS: f64 = 1e-12;

/// Distance from a face plane that still counts as on the face.
const FACE_TOLERANCE: f64 = 1e-4;

pub(crate) fn intersect(ray: &Ray, ray_t: Interval, uv_scale: Vec3) -> Option<LocalHit> {
    let mut t_enter = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        if dir.abs() < PARALLEL_EPS {
            // Parallel to this slab: inside it or never
            if !(-1.0..=1.0).contains(&origin) {
                return None;
            }
            continue;
        }
        let mut t0 = (-1.0 - origin) / dir;
        let mut t1 = (1.0 - origin) / dir;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    // Rays starting inside the cube leave through the exit face
    let t = if ray_t.accepts(t_enter) {
        t_enter
    } else if ray_t.accepts(t_exit) {
        t_exit
    } else {
        return None;
    };

    let p = ray.at(t);
    let normal = face_normal(p);
    let (u, v, tangent) = face_uv(p, normal, uv_scale);

    Some(LocalHit {
        point: p,
        normal,
        u,
        v,
        tangent,
    })
}

/// Outward normal of the face `p` lies on, checked as +x, -x, +y, -y, +z, -z.
fn face_normal(p: Vec3) -> Vec3 {
    if (p.x - 1.0).abs() < FACE_TOLERANCE {
        Vec3::X
    } else if (p.x + 1.0).abs() < FACE_TOLERANCE {
        Vec3::NEG_X
    } else if (p.y - 1.0).abs() < FACE_TOLERANCE {
        Vec3::Y
    } else if (p.y + 1.0).abs() < FACE_TOLERANCE {
        Vec3::NEG_Y
    } else if (p.z - 1.0).abs() < FACE_TOLERANCE {
        Vec3::Z
    } else {
        Vec3::NEG_Z
    }
}

/// Box mapping scaled by the cube's scale so texels stay square.
fn face_uv(p: Vec3, normal: Vec3, scale: Vec3) -> (f64, f64, Vec3) {
    if normal.x.abs() > 0.5 {
        let u = (p.z + 1.0) * scale.z;
        let v = (p.y + 1.0) * scale.y;
        (u, v, Vec3::new(0.0, 0.0, normal.x.signum()))
    } else if normal.y.abs() > 0.5 {
        let u = (p.x + 1.0) * scale.x;
        let v = (p.z + 1.0) * scale.z;
        (u, v, Vec3::X)
    } else {
        let u = (p.x + 1.0) * scale.x;
        let v = (p.y + 1.0) * scale.y;
        (u, v, Vec3::new(normal.z.signum(), 0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(origin: Vec3, dir: Vec3) -> Option<LocalHit> {
        intersect(
            &Ray::new(origin, dir, 0.0),
            Interval::new(1e-5, f64::INFINITY),
            Vec3::ONE,
        )
    }

    #[test]
    fn test_hit_each_face() {
        let cases = [
            (Vec3::new(5.0, 0.2, 0.1), Vec3::NEG_X, Vec3::X),
            (Vec3::new(-5.0, 0.2, 0.1), Vec3::X, Vec3::NEG_X),
            (Vec3::new(0.2, 5.0, 0.1), Vec3::NEG_Y, Vec3::Y),
            (Vec3::new(0.2, -5.0, 0.1), Vec3::Y, Vec3::NEG_Y),
            (Vec3::new(0.2, 0.1, 5.0), Vec3::NEG_Z, Vec3::Z),
            (Vec3::new(0.2, 0.1, -5.0), Vec3::Z, Vec3::NEG_Z),
        ];
        for (origin, dir, expected) in cases {
            let h = hit(origin, dir).unwrap();
            assert_eq!(h.normal, expected, "origin {origin:?}");
            assert!(h.tangent.dot(h.normal).abs() < 1e-12);
        }
    }

    #[test]
    fn test_miss() {
        assert!(hit(Vec3::new(3.0, 3.0, 5.0), Vec3::NEG_Z).is_none());
        // Parallel to the x slab but outside it
        assert!(hit(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z).is_none());
    }

    #[test]
    fn test_ray_from_inside_exits() {
        let h = hit(Vec3::ZERO, Vec3::Y).unwrap();
        assert!((h.point - Vec3::Y).length() < 1e-12);
        assert_eq!(h.normal, Vec3::Y);
    }

    #[test]
    fn test_uv_follows_scale() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 5.0), Vec3::NEG_Z, 0.0);
        let h = intersect(&ray, Interval::new(1e-5, f64::INFINITY), Vec3::new(2.0, 3.0, 1.0))
            .unwrap();
        assert_eq!(h.normal, Vec3::Z);
        assert!((h.u - 3.0).abs() < 1e-12);
        assert!((h.v - 4.5).abs() < 1e-12);
    }
}
