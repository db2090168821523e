//! Cone along z: base disk at `-depth/2`, tip at `+depth/2`.

use std::f64::consts::PI;

use prism_math::{Interval, Ray, Vec3};

use super::LocalHit;

const EPS: f64 = 1e-6;

pub(crate) fn intersect(ray: &Ray, ray_t: Interval, radius: f64, depth: f64) -> Option<LocalHit> {
    if radius <= 0.0 || depth <= 0.0 {
        return None;
    }
    let half_depth = depth * 0.5;
    let (o, d) = (ray.origin, ray.direction);

    // Cheap rejection against the bounding cylinder and z slab
    let a_cyl = d.x * d.x + d.y * d.y;
    let b_cyl = o.x * d.x + o.y * d.y;
    let c_cyl = o.x * o.x + o.y * o.y - radius * radius;
    if a_cyl > EPS && ((c_cyl > 0.0 && b_cyl > 0.0) || b_cyl * b_cyl - a_cyl * c_cyl < 0.0) {
        return None;
    }
    if d.z.abs() > EPS {
        let t0 = (-half_depth - o.z) / d.z;
        let t1 = (half_depth - o.z) / d.z;
        if t0.max(t1) < ray_t.min || t0.min(t1) > ray_t.max {
            return None;
        }
    } else if o.z < -half_depth || o.z > half_depth {
        return None;
    }

    // x^2 + y^2 = k^2 (z_tip - z)^2
    let k = radius / depth;
    let k2 = k * k;
    let z_tip = half_depth;
    let dz_origin = z_tip - o.z;

    let a = a_cyl - k2 * d.z * d.z;
    let b = 2.0 * (b_cyl + k2 * dz_origin * d.z);
    let c = o.x * o.x + o.y * o.y - k2 * dz_origin * dz_origin;

    let mut best: Option<LocalHit> = None;
    let mut closest = ray_t.max;

    if a.abs() > EPS {
        let discriminant = b * b - 4.0 * a * c;
        if discriminant >= 0.0 {
            let sqrt_d = discriminant.sqrt();
            let mut t1 = (-b - sqrt_d) / (2.0 * a);
            let mut t2 = (-b + sqrt_d) / (2.0 * a);
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            // The smaller root wins when valid; the mirrored nappe is cut by the z range
            for t in [t1, t2] {
                if t < ray_t.min || t >= closest {
                    continue;
                }
                let p = ray.at(t);
                if p.z < -half_depth || p.z > half_depth {
                    continue;
                }
                closest = t;
                let phi = p.y.atan2(p.x);
                let mut tangent = Vec3::new(-p.y, p.x, 0.0);
                if tangent.length_squared() <= EPS {
                    tangent = Vec3::X;
                }
                let mut normal = Vec3::new(p.x, p.y, k2 * (z_tip - p.z));
                if normal.length_squared() <= EPS * EPS {
                    // Apex
                    normal = Vec3::Z;
                }
                best = Some(LocalHit {
                    point: p,
                    normal,
                    u: (phi + PI) / (2.0 * PI),
                    v: (p.z + half_depth) / depth,
                    tangent,
                });
                break;
            }
        }
    }

    // Base cap
    if d.z.abs() > EPS {
        let t = (-half_depth - o.z) / d.z;
        if t >= ray_t.min && t < closest {
            let x = o.x + t * d.x;
            let y = o.y + t * d.y;
            if x * x + y * y <= radius * radius {
                best = Some(LocalHit {
                    point: Vec3::new(x, y, -half_depth),
                    normal: Vec3::NEG_Z,
                    u: (x / radius + 1.0) * 0.5,
                    v: (y / radius + 1.0) * 0.5,
                    tangent: Vec3::X,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(origin: Vec3, dir: Vec3) -> Option<LocalHit> {
        intersect(
            &Ray::new(origin, dir, 0.0),
            Interval::new(1e-5, f64::INFINITY),
            1.0,
            2.0,
        )
    }

    #[test]
    fn test_side_hit_at_mid_height() {
        // At z = 0 the radius is half the base radius
        let h = hit(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X).unwrap();
        assert!((h.point - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-12);
        let n = h.normal.normalize();
        assert!(n.x > 0.0 && n.z > 0.0);
        assert!(n.y.abs() < 1e-12);
    }

    #[test]
    fn test_base_cap_hit() {
        let h = hit(Vec3::new(0.2, 0.0, -5.0), Vec3::Z).unwrap();
        assert!((h.point.z + 1.0).abs() < 1e-12);
        assert_eq!(h.normal, Vec3::NEG_Z);
    }

    #[test]
    fn test_down_the_axis_hits_tip_region() {
        let h = hit(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).unwrap();
        assert!((h.point.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_miss_above_tip() {
        assert!(hit(Vec3::new(5.0, 0.0, 1.5), Vec3::NEG_X).is_none());
        assert!(hit(Vec3::new(5.0, 3.0, 0.0), Vec3::NEG_X).is_none());
    }
}
