//! Scene primitives.
//!
//! Every primitive is a canonical shape in object space (unit sphere,
//! [-1, 1] cube, z-aligned cylinder/cone/torus) placed in the world by a
//! transform. Planes are the exception: their boundary points are already in
//! world space and they ignore the transform.

use prism_math::{interpolate_matrices, Mat4, Transform, Vec3};

use crate::Material;

/// Canonical shape and its parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Unit sphere centred at the origin
    Sphere,

    /// Cube spanning [-1, 1] on every axis. `uv_scale` keeps texture texels
    /// square under non-uniform scaling.
    Cube { uv_scale: Vec3 },

    /// Bounded plane through a convex polygon of world-space points
    Plane { points: Vec<Vec3> },

    /// Capped cylinder along z, centred at the origin
    Cylinder { radius: f64, depth: f64 },

    /// Cone along z with its base at `-depth/2` and tip at `+depth/2`
    Cone { radius: f64, depth: f64 },

    /// Torus around the z axis
    Torus { major_radius: f64, minor_radius: f64 },
}

impl Shape {
    /// Lower-case kind name, used in logs and counts.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Sphere => "sphere",
            Shape::Cube { .. } => "cube",
            Shape::Plane { .. } => "plane",
            Shape::Cylinder { .. } => "cylinder",
            Shape::Cone { .. } => "cone",
            Shape::Torus { .. } => "torus",
        }
    }
}

/// Keyframe transforms at shutter open (t=0) and close (t=1).
#[derive(Clone, Debug, PartialEq)]
pub struct Motion {
    pub start: Transform,
    pub end: Transform,
}

impl Motion {
    pub fn new(start: Mat4, end: Mat4) -> Self {
        Self {
            start: Transform::from_matrix(start),
            end: Transform::from_matrix(end),
        }
    }

    /// Interpolated transform for a ray time in [0, 1].
    pub fn transform_at(&self, time: f64) -> Transform {
        Transform::from_matrix(interpolate_matrices(
            &self.start.object_to_world,
            &self.end.object_to_world,
            time,
        ))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    pub name: String,
    pub material: Material,
    pub visible: bool,

    /// Static placement, used when there is no motion
    pub transform: Transform,

    pub motion: Option<Motion>,
    pub shape: Shape,
}

impl Primitive {
    pub fn new(name: impl Into<String>, shape: Shape, transform: Transform) -> Self {
        Self {
            name: name.into(),
            material: Material::default(),
            visible: true,
            transform,
            motion: None,
            shape,
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Whether the primitive moves during the shutter interval.
    pub fn has_motion(&self) -> bool {
        self.motion.is_some() && !matches!(self.shape, Shape::Plane { .. })
    }

    /// Transform in effect at `time`.
    pub fn transform_at(&self, time: f64) -> Transform {
        match &self.motion {
            Some(motion) if self.has_motion() => motion.transform_at(time),
            _ => self.transform,
        }
    }
}
