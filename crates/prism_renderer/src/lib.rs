//! Prism Renderer - Whitted-style CPU ray tracing.
//!
//! Closed-form intersection for spheres, cubes, bounded planes, cylinders,
//! cones and tori (quartic solve plus Newton polish), a median-split BVH,
//! and a recursive tracer with soft shadows, glossy reflection, Fresnel
//! refraction, depth of field and motion blur. Rows render in parallel on
//! rayon.

mod bvh;
mod camera;
mod hittable;
mod renderer;
pub mod shapes;
mod stats;
mod tracer;
mod world;

pub use bvh::{BvhNode, BvhStats, MAX_DEPTH, MAX_LEAF_SIZE};
pub use camera::Camera;
pub use hittable::{HitRecord, Hittable};
pub use renderer::{tone_map, RenderOutput, Renderer};
pub use stats::{RenderStats, StatsSnapshot};
pub use tracer::Tracer;
pub use world::World;

/// Re-export the math types used throughout the renderer API
pub use prism_math::{Aabb, Color, Interval, Ray, Vec3};
