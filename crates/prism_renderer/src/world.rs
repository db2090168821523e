//! The renderable world: primitives plus the optional BVH over them.

use std::sync::Arc;
use std::time::Instant;

use prism_core::Primitive;
use prism_math::{Aabb, Interval, Ray};

use crate::{BvhNode, HitRecord, Hittable, RenderStats};

pub struct World {
    primitives: Vec<Primitive>,
    bvh: Option<BvhNode>,
    stats: Arc<RenderStats>,
}

impl World {
    /// Build the world, constructing a BVH when `use_bvh` is set.
    pub fn new(primitives: Vec<Primitive>, use_bvh: bool, stats: Arc<RenderStats>) -> Self {
        let bvh = use_bvh.then(|| {
            let start = Instant::now();
            let bvh = BvhNode::new(&primitives);
            let tree = bvh.stats();
            log::info!(
                "BVH built in {:.2}ms: {} primitives, {} nodes, {} leaves, depth {}",
                start.elapsed().as_secs_f64() * 1000.0,
                primitives.len(),
                tree.nodes,
                tree.leaves,
                tree.depth
            );
            let bbox = bvh.bounding_box();
            log::debug!("BVH root bounds: {:?} - {:?}", bbox.min(), bbox.max());
            bvh
        });
        if bvh.is_none() {
            log::info!("BVH disabled, testing all {} primitives per ray", primitives.len());
        }

        Self {
            primitives,
            bvh,
            stats,
        }
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn bvh(&self) -> Option<&BvhNode> {
        self.bvh.as_ref()
    }

    pub fn stats(&self) -> &Arc<RenderStats> {
        &self.stats
    }

    /// Test every primitive, ignoring the BVH.
    pub fn hit_brute_force<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
    ) -> bool {
        let mut hit_anything = false;
        let mut closest = ray_t.max;
        for prim in &self.primitives {
            if prim.hit(ray, ray_t.with_max(closest), rec) {
                hit_anything = true;
                closest = rec.t;
            }
        }
        self.stats.add_intersection_tests(self.primitives.len() as u64);
        hit_anything
    }
}

impl Hittable for World {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        match &self.bvh {
            Some(bvh) => {
                let mut tests = 0;
                let hit = bvh.hit(&self.primitives, ray, ray_t, rec, &mut tests);
                self.stats.add_intersection_tests(tests);
                hit
            }
            None => self.hit_brute_force(ray, ray_t, rec),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match &self.bvh {
            Some(bvh) => bvh.bounding_box(),
            None => self
                .primitives
                .iter()
                .fold(Aabb::EMPTY, |acc, p| Aabb::surrounding(&acc, &p.bounding_box())),
        }
    }
}
