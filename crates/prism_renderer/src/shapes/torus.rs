//! Torus around the z axis, centred at the origin.

use std::f64::consts::PI;

use prism_math::{Interval, Ray, Vec3};

use super::quartic::solve_quartic;
use super::LocalHit;

const NEWTON_ITERATIONS: usize = 3;

/// Implicit torus function: zero on the surface, negative inside the tube.
pub fn torus_implicit(p: Vec3, major_radius: f64, minor_radius: f64) -> f64 {
    let r2 = major_radius * major_radius;
    let k = p.length_squared() + r2 - minor_radius * minor_radius;
    k * k - 4.0 * r2 * (p.x * p.x + p.y * p.y)
}

fn torus_gradient(p: Vec3, major_radius: f64, minor_radius: f64) -> Vec3 {
    let r2 = major_radius * major_radius;
    let k = p.length_squared() + r2 - minor_radius * minor_radius;
    4.0 * k * p - 8.0 * r2 * Vec3::new(p.x, p.y, 0.0)
}

pub(crate) fn intersect(
    ray: &Ray,
    ray_t: Interval,
    major_radius: f64,
    minor_radius: f64,
) -> Option<LocalHit> {
    if major_radius <= 0.0 || minor_radius <= 0.0 {
        return None;
    }

    // Solve along a unit direction, then convert back to the caller's t
    let len = ray.direction.length();
    if len < 1e-12 {
        return None;
    }
    let o = ray.origin;
    let d = ray.direction / len;

    // Bounding sphere
    let outer = major_radius + minor_radius;
    let b = o.dot(d);
    let c = o.length_squared() - outer * outer;
    if c > 0.0 && (b > 0.0 || b * b - c < 0.0) {
        return None;
    }

    let r2 = major_radius * major_radius;
    let beta = 2.0 * o.dot(d);
    let gamma = o.length_squared() - minor_radius * minor_radius - r2;
    let coeffs = [
        gamma * gamma + 4.0 * r2 * (o.z * o.z - minor_radius * minor_radius),
        2.0 * beta * gamma + 8.0 * r2 * o.z * d.z,
        beta * beta + 2.0 * gamma + 4.0 * r2 * d.z * d.z,
        2.0 * beta,
        1.0,
    ];

    let t_min = ray_t.min * len;
    let t_max = ray_t.max * len;
    let mut t = solve_quartic(coeffs)
        .as_slice()
        .iter()
        .copied()
        .filter(|&t| t >= t_min && t < t_max)
        .min_by(f64::total_cmp)?;

    // Polish the root; the closed form loses digits near grazing hits
    for _ in 0..NEWTON_ITERATIONS {
        let p = o + d * t;
        let value = torus_implicit(p, major_radius, minor_radius);
        if value.abs() < 1e-10 {
            break;
        }
        let slope = torus_gradient(p, major_radius, minor_radius).dot(d);
        if slope.abs() < 1e-8 {
            break;
        }
        let step = value / slope;
        t -= step;
        if step.abs() < 1e-6 {
            break;
        }
    }
    if t < t_min || t >= t_max {
        return None;
    }

    let p = o + d * t;
    let rho = (p.x * p.x + p.y * p.y).sqrt();
    let scale = (rho - major_radius) / rho.max(1e-10);
    let normal = Vec3::new(p.x * scale, p.y * scale, p.z);

    let phi = p.y.atan2(p.x);
    let theta = p.z.atan2(rho - major_radius);
    let mut tangent = Vec3::new(-p.y, p.x, 0.0);
    if tangent.length_squared() < 1e-12 {
        tangent = Vec3::X;
    }

    Some(LocalHit {
        point: p,
        normal,
        u: (phi + PI) / (2.0 * PI),
        v: (theta + PI) / (2.0 * PI),
        tangent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ray_t() -> Interval {
        Interval::new(1e-5, f64::INFINITY)
    }

    #[test]
    fn test_torus_scenario() {
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X, 0.0);
        let hit = intersect(&ray, ray_t(), 2.0, 0.5).unwrap();
        assert!((hit.point - Vec3::new(2.5, 0.0, 0.0)).length() < 1e-6);
        assert!((hit.normal.normalize() - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_unnormalized_direction() {
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X * 2.0, 0.0);
        let hit = intersect(&ray, ray_t(), 2.0, 0.5).unwrap();
        assert!((hit.point - Vec3::new(2.5, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_hit_points_lie_on_surface() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut hits = 0;
        for _ in 0..2000 {
            // Origins in every octant, targets hugging the tube so many rays graze it
            let origin = loop {
                let p = Vec3::new(
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                );
                if p.length() > 3.0 {
                    break p;
                }
            };
            let target = Vec3::new(
                rng.gen_range(-2.6..2.6),
                rng.gen_range(-2.6..2.6),
                rng.gen_range(-0.6..0.6),
            );
            let ray = Ray::new(origin, (target - origin).normalize(), 0.0);
            if let Some(hit) = intersect(&ray, ray_t(), 2.0, 0.5) {
                hits += 1;
                let residual = torus_implicit(hit.point, 2.0, 0.5).abs();
                assert!(residual < 1e-6, "residual {residual} at {:?}", hit.point);
            }
        }
        assert!(hits > 500);
    }

    #[test]
    fn test_ray_through_hole_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 0.0);
        assert!(intersect(&ray, ray_t(), 2.0, 0.5).is_none());
    }

    #[test]
    fn test_ray_outside_bounds_misses() {
        let ray = Ray::new(Vec3::new(5.0, 5.0, 0.0), Vec3::X, 0.0);
        assert!(intersect(&ray, ray_t(), 2.0, 0.5).is_none());
    }

    #[test]
    fn test_ray_through_tube_only() {
        // Vertical ray through the tube: two real roots
        let ray = Ray::new(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z, 0.0);
        let hit = intersect(&ray, ray_t(), 2.0, 0.5).unwrap();
        assert!((hit.point.z - 0.5).abs() < 1e-6);
    }
}
