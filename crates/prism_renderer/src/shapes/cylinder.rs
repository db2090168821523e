//! Capped cylinder along z, centred at the origin.

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

    let mut best: Option<(f64, LocalHit)> = None;
    let mut closest = ray_t.max;

    // Body: x^2 + y^2 = radius^2
    let a = d.x * d.x + d.y * d.y;
    if a.abs() > EPS {
        let b = 2.0 * (o.x * d.x + o.y * d.y);
        let c = o.x * o.x + o.y * o.y - radius * radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant >= 0.0 {
            let sqrt_d = discriminant.sqrt();
            for t in [(-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a)] {
                if t < ray_t.min || t >= closest {
                    continue;
                }
                let p = ray.at(t);
                if p.z < -half_depth || p.z > half_depth {
                    continue;
                }
                closest = t;
                let phi = p.y.atan2(p.x);
                best = Some((
                    t,
                    LocalHit {
                        point: p,
                        normal: Vec3::new(p.x / radius, p.y / radius, 0.0),
                        u: (phi + PI) / (2.0 * PI),
                        v: (p.z + half_depth) / depth,
                        tangent: Vec3::new(-p.y, p.x, 0.0),
                    },
                ));
            }
        }
    }

    // Caps: z = +-half_depth inside the radius
    if d.z.abs() > EPS {
        for (z, normal) in [(half_depth, Vec3::Z), (-half_depth, Vec3::NEG_Z)] {
            let t = (z - o.z) / d.z;
            if t < ray_t.min || t >= closest {
                continue;
            }
            let p = ray.at(t);
            if p.x * p.x + p.y * p.y > radius * radius {
                continue;
            }
            closest = t;
            best = Some((
                t,
                LocalHit {
                    point: p,
                    normal,
                    u: (p.x / radius + 1.0) * 0.5,
                    v: (p.y / radius + 1.0) * 0.5,
                    tangent: Vec3::X,
                },
            ));
        }
    }

    best.map(|(_, hit)| hit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(origin: Vec3, dir: Vec3) -> Option<LocalHit> {
        intersect(
            &Ray::new(origin, dir, 0.0),
            Interval::new(1e-5, f64::INFINITY),
            0.5,
            2.0,
        )
    }

    #[test]
    fn test_body_hit() {
        let h = hit(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X).unwrap();
        assert!((h.point - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-12);
        assert!((h.normal - Vec3::X).length() < 1e-12);
    }

    #[test]
    fn test_cap_hit() {
        let h = hit(Vec3::new(0.1, 0.0, 5.0), Vec3::NEG_Z).unwrap();
        assert!((h.point.z - 1.0).abs() < 1e-12);
        assert_eq!(h.normal, Vec3::Z);

        let h = hit(Vec3::new(0.1, 0.0, -5.0), Vec3::Z).unwrap();
        assert!((h.point.z + 1.0).abs() < 1e-12);
        assert_eq!(h.normal, Vec3::NEG_Z);
    }

    #[test]
    fn test_beyond_height_misses() {
        assert!(hit(Vec3::new(5.0, 0.0, 1.5), Vec3::NEG_X).is_none());
    }

    #[test]
    fn test_oblique_ray_takes_nearest() {
        // Enters through the side, would leave through the top cap
        let dir = Vec3::new(-1.0, 0.0, 1.0).normalize();
        let h = hit(Vec3::new(1.5, 0.0, -0.5), dir).unwrap();
        assert!((h.point.x - 0.5).abs() < 1e-9);
        assert!((h.point.z - 0.5).abs() < 1e-9);
    }
}
