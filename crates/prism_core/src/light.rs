//! Light sources.
//!
//! Point, spot and sun lights are sampled at a single position (or
//! direction). Area lights expose a surface that soft shadows sample with
//! stratified jittered points.

use std::f64::consts::PI;

use prism_math::{Color, Vec3};

/// Shape of an area light's emitting surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AreaShape {
    Square,
    Rectangle,
    Disk,
    Ellipse,
}

impl AreaShape {
    /// Parse the upper-case keyword used in scene files.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "SQUARE" => Some(Self::Square),
            "RECTANGLE" => Some(Self::Rectangle),
            "DISK" => Some(Self::Disk),
            "ELLIPSE" => Some(Self::Ellipse),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LightKind {
    /// Omnidirectional point light
    Point,

    /// Cone-limited point light
    Spot {
        direction: Vec3,
        /// Full cone angle in radians
        size: f64,
        /// Fraction of the cone over which intensity fades out
        blend: f64,
    },

    /// Directional light at infinity
    Sun { direction: Vec3, angle: f64 },

    /// Emitting surface facing `normal`
    Area {
        shape: AreaShape,
        size_x: f64,
        size_y: f64,
        samples: u32,
        normal: Vec3,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub name: String,
    pub location: Vec3,
    pub intensity: f64,
    pub color: Color,
    pub cast_shadows: bool,
    pub kind: LightKind,
}

impl Light {
    /// A white point light.
    pub fn point(name: impl Into<String>, location: Vec3, intensity: f64) -> Self {
        Self {
            name: name.into(),
            location,
            intensity,
            color: Vec3::ONE,
            cast_shadows: true,
            kind: LightKind::Point,
        }
    }

    pub fn with_kind(mut self, kind: LightKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn is_area(&self) -> bool {
        matches!(self.kind, LightKind::Area { .. })
    }

    /// Shadow samples the light asks for (area lights only).
    pub fn sample_count(&self) -> u32 {
        match self.kind {
            LightKind::Area { samples, .. } => samples.max(1),
            _ => 1,
        }
    }

    /// Map two uniforms in [0, 1] to a point on the light.
    ///
    /// Non-area lights always return their location.
    pub fn sample_point(&self, u: f64, v: f64) -> Vec3 {
        let LightKind::Area {
            shape,
            size_x,
            size_y,
            normal,
            ..
        } = self.kind
        else {
            return self.location;
        };

        let (right, up) = area_basis(normal);
        match shape {
            AreaShape::Square | AreaShape::Rectangle => {
                self.location + right * ((u - 0.5) * size_x) + up * ((v - 0.5) * size_y)
            }
            AreaShape::Disk | AreaShape::Ellipse => {
                let r = u.sqrt();
                let theta = 2.0 * PI * v;
                let x = r * theta.cos() * (size_x * 0.5);
                let y = r * theta.sin() * (size_y * 0.5);
                self.location + right * x + up * y
            }
        }
    }

    /// Unit direction from `point` toward `sample` and the distance to it.
    ///
    /// Sun lights ignore the sample and report an infinite distance.
    pub fn incident(&self, point: Vec3, sample: Vec3) -> (Vec3, f64) {
        if let LightKind::Sun { direction, .. } = self.kind {
            return (-direction.try_normalize().unwrap_or(Vec3::NEG_Z), f64::INFINITY);
        }
        let to_light = sample - point;
        let dist = to_light.length();
        if dist > 0.0 {
            (to_light / dist, dist)
        } else {
            (Vec3::Z, 0.0)
        }
    }

    /// Radiance arriving from the light at `dist`, before shadowing.
    pub fn radiance(&self, dist: f64) -> Color {
        match self.kind {
            LightKind::Sun { .. } => self.color * self.intensity,
            _ => self.color * (self.intensity / (dist * dist)),
        }
    }

    /// Angular falloff toward `to_light` (unit vector from the surface).
    ///
    /// Spot lights fade with a smoothstep across the outer `blend` part of
    /// the cone; everything else returns 1.
    pub fn falloff(&self, to_light: Vec3) -> f64 {
        let LightKind::Spot {
            direction,
            size,
            blend,
        } = self.kind
        else {
            return 1.0;
        };

        let axis = direction.try_normalize().unwrap_or(Vec3::NEG_Z);
        let cos_angle = (-to_light).dot(axis);
        let half = size * 0.5;
        let cos_outer = half.cos();
        let cos_inner = (half * (1.0 - blend.clamp(0.0, 1.0))).cos();
        if cos_angle <= cos_outer {
            return 0.0;
        }
        if cos_angle >= cos_inner || cos_inner <= cos_outer {
            return 1.0;
        }
        let t = (cos_angle - cos_outer) / (cos_inner - cos_outer);
        t * t * (3.0 - 2.0 * t)
    }
}

/// Right/up vectors spanning an area light's surface.
fn area_basis(normal: Vec3) -> (Vec3, Vec3) {
    let n = if normal.length_squared() < 0.1 {
        Vec3::NEG_Z
    } else {
        normal.normalize()
    };
    let helper = if n.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
    let right = n.cross(helper).normalize();
    let up = n.cross(right).normalize();
    (right, up)
}
