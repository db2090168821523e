//! Bounded plane through world-space boundary points.
//!
//! The plane's normal comes from the first three points. A hit must also
//! fall inside the axis-aligned bounds of all points, which is exact for the
//! axis-aligned rectangles scene exports produce.

use prism_math::{Interval, Ray, Vec3};

use super::LocalHit;

const PARALLEL_EPS: f64 = 1e-9;
const BOUNDS_TOLERANCE: f64 = 1e-6;

pub(crate) fn intersect(points: &[Vec3], ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
    let [p0, p1, p2, ..] = points else {
        return None;
    };
    let edge1 = *p1 - *p0;
    let edge2 = *p2 - *p0;
    let normal = edge1.cross(edge2).try_normalize()?;

    let denom = normal.dot(ray.direction);
    if denom.abs() < PARALLEL_EPS {
        return None;
    }
    let t = (*p0 - ray.origin).dot(normal) / denom;
    if !ray_t.accepts(t) {
        return None;
    }

    let p = ray.at(t);
    if !within_bounds(points, p) {
        return None;
    }

    // Project onto the first two edges so each spans [0, 1]
    let local = p - *p0;
    let u = local.dot(edge1) / edge1.length_squared();
    let v = local.dot(edge2) / edge2.length_squared();

    Some(LocalHit {
        point: p,
        normal,
        u,
        v,
        tangent: edge1,
    })
}

/// Per-axis containment, skipping axes the points do not span.
fn within_bounds(points: &[Vec3], p: Vec3) -> bool {
    let (lo, hi) = points
        .iter()
        .fold((points[0], points[0]), |(lo, hi), q| (lo.min(*q), hi.max(*q)));

    (0..3).all(|axis| {
        hi[axis] - lo[axis] <= BOUNDS_TOLERANCE
            || (p[axis] >= lo[axis] - BOUNDS_TOLERANCE && p[axis] <= hi[axis] + BOUNDS_TOLERANCE)
    })
}
