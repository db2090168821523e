//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Binary tree over primitive indices. The tree stores only indices and
//! boxes; the primitives themselves stay in the [`World`](crate::World) and
//! are passed in at traversal time.

use prism_core::Primitive;
use prism_math::{Aabb, Interval, Ray};

use crate::{HitRecord, Hittable};

/// Maximum primitives per leaf node before splitting.
pub const MAX_LEAF_SIZE: usize = 2;

/// Depth at which construction stops splitting.
pub const MAX_DEPTH: usize = 30;

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug)]
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node with indices of a small number of primitives.
    Leaf { indices: Vec<usize>, bbox: Aabb },
    /// Empty node (no primitives).
    Empty,
}

/// Shape of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
}

impl BvhNode {
    /// Build a BVH over every primitive in the slice.
    pub fn new(primitives: &[Primitive]) -> Self {
        if primitives.is_empty() {
            return BvhNode::Empty;
        }
        let bounds: Vec<Aabb> = primitives.iter().map(|p| p.bounding_box()).collect();
        let mut indices: Vec<usize> = (0..primitives.len()).collect();
        Self::build(&bounds, &mut indices, 0)
    }

    /// Recursive construction: split on the longest axis of the node's box
    /// at the median primitive centre.
    fn build(bounds: &[Aabb], indices: &mut [usize], depth: usize) -> Self {
        let bbox = indices
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| Aabb::surrounding(&acc, &bounds[i]));

        if indices.len() <= MAX_LEAF_SIZE || depth >= MAX_DEPTH {
            return BvhNode::Leaf {
                indices: indices.to_vec(),
                bbox,
            };
        }

        let axis = bbox.longest_axis();
        let mid = indices.len() / 2;
        indices.select_nth_unstable_by(mid, |&a, &b| {
            bounds[a].centroid()[axis].total_cmp(&bounds[b].centroid()[axis])
        });

        let (left, right) = indices.split_at_mut(mid);
        if left.is_empty() || right.is_empty() {
            return BvhNode::Leaf {
                indices: indices.to_vec(),
                bbox,
            };
        }

        BvhNode::Branch {
            left: Box::new(Self::build(bounds, left, depth + 1)),
            right: Box::new(Self::build(bounds, right, depth + 1)),
            bbox,
        }
    }

    /// Find the closest hit among `primitives` (the slice the tree was built
    /// from). `tests` is incremented once per primitive intersection test.
    pub fn hit<'a>(
        &self,
        primitives: &'a [Primitive],
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        tests: &mut u64,
    ) -> bool {
        match self {
            BvhNode::Empty => false,

            BvhNode::Leaf { indices, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let mut hit_anything = false;
                let mut closest = ray_t.max;
                for &i in indices {
                    *tests += 1;
                    if primitives[i].hit(ray, ray_t.with_max(closest), rec) {
                        hit_anything = true;
                        closest = rec.t;
                    }
                }
                hit_anything
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let hit_left = left.hit(primitives, ray, ray_t, rec, tests);

                // Only check right up to closest hit
                let right_max = if hit_left { rec.t } else { ray_t.max };
                let hit_right = right.hit(primitives, ray, ray_t.with_max(right_max), rec, tests);

                hit_left || hit_right
            }
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    /// Count nodes and leaves and measure the depth of the tree.
    pub fn stats(&self) -> BvhStats {
        match self {
            BvhNode::Empty => BvhStats::default(),
            BvhNode::Leaf { .. } => BvhStats {
                nodes: 1,
                leaves: 1,
                depth: 1,
            },
            BvhNode::Branch { left, right, .. } => {
                let l = left.stats();
                let r = right.stats();
                BvhStats {
                    nodes: 1 + l.nodes + r.nodes,
                    leaves: l.leaves + r.leaves,
                    depth: 1 + l.depth.max(r.depth),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::Shape;
    use prism_math::{Transform, Vec3};

    fn sphere_at(i: usize, center: Vec3) -> Primitive {
        Primitive::new(
            format!("sphere{i}"),
            Shape::Sphere,
            Transform::from_trs(center, Vec3::ZERO, Vec3::splat(0.5)),
        )
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = BvhNode::new(&[]);
        assert!(matches!(bvh, BvhNode::Empty));
        assert_eq!(bvh.stats(), BvhStats::default());
    }

    #[test]
    fn test_bvh_single_sphere() {
        let prims = vec![sphere_at(0, Vec3::new(0.0, 0.0, -1.0))];
        let bvh = BvhNode::new(&prims);

        // Should create a leaf
        assert!(matches!(bvh, BvhNode::Leaf { .. }));

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);
        let mut rec = HitRecord::default();
        let mut tests = 0;
        assert!(bvh.hit(&prims, &ray, Interval::new(1e-5, f64::INFINITY), &mut rec, &mut tests));
        assert_eq!(tests, 1);
    }

    #[test]
    fn test_bvh_multiple_spheres() {
        let prims: Vec<Primitive> = (0..10)
            .map(|i| sphere_at(i, Vec3::new(i as f64, 0.0, -5.0)))
            .collect();
        let bvh = BvhNode::new(&prims);

        // Test ray that hits sphere at x=5
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_Z, 0.0);
        let mut rec = HitRecord::default();
        let mut tests = 0;
        assert!(bvh.hit(&prims, &ray, Interval::new(1e-5, f64::INFINITY), &mut rec, &mut tests));

        // Sphere at z=-5 with radius 0.5
        assert!((rec.p.z + 4.5).abs() < 1e-9);
        assert_eq!(rec.object_name, "sphere5");
        assert!(tests < 10, "BVH tested {tests} primitives");
    }

    #[test]
    fn test_bvh_stats() {
        let prims: Vec<Primitive> = (0..16)
            .map(|i| sphere_at(i, Vec3::new(i as f64 * 2.0, 0.0, 0.0)))
            .collect();
        let stats = BvhNode::new(&prims).stats();

        assert_eq!(stats.leaves, 8);
        assert_eq!(stats.nodes, 15);
        assert_eq!(stats.depth, 4);
    }

    #[test]
    fn test_coincident_centers_terminate() {
        let prims: Vec<Primitive> = (0..50).map(|i| sphere_at(i, Vec3::ZERO)).collect();
        let bvh = BvhNode::new(&prims);
        assert!(bvh.stats().depth <= MAX_DEPTH + 1);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 0.0);
        let mut rec = HitRecord::default();
        let mut tests = 0;
        assert!(bvh.hit(&prims, &ray, Interval::new(1e-5, f64::INFINITY), &mut rec, &mut tests));
        assert!((rec.t - 4.5).abs() < 1e-9);
    }
}
