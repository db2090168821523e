//! Translate-rotate-scale decomposition and keyframe interpolation.
//!
//! Moving primitives store two keyframe matrices. Interpolating those
//! matrices entry by entry shears and shrinks anything that rotates, so the
//! keyframes are split into translation, rotation and scale, blended
//! separately and recomposed.

use glam::{DMat4, DQuat};

use crate::Vec3;

/// Scales below this are treated as degenerate when extracting rotation.
const MIN_SCALE: f64 = 1e-10;

/// A decomposed affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trs {
    pub translation: Vec3,
    pub rotation: DQuat,
    pub scale: Vec3,
}

impl Default for Trs {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: DQuat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Trs {
    /// Split an affine matrix into translation, rotation and scale.
    ///
    /// Scale is the length of each basis column. If any of them is close to
    /// zero the rotation cannot be recovered and falls back to identity.
    pub fn decompose(matrix: &DMat4) -> Self {
        let translation = matrix.w_axis.truncate();
        let c0 = matrix.x_axis.truncate();
        let c1 = matrix.y_axis.truncate();
        let c2 = matrix.z_axis.truncate();
        let scale = Vec3::new(c0.length(), c1.length(), c2.length());

        let rotation = if scale.min_element() < MIN_SCALE {
            DQuat::IDENTITY
        } else {
            rotation_from_columns(c0 / scale.x, c1 / scale.y, c2 / scale.z)
        };

        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Rebuild the matrix `T · R · S`.
    pub fn compose(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Blend two decompositions: linear for translation and scale, SLERP
    /// along the shortest arc for rotation.
    pub fn lerp(&self, other: &Trs, t: f64) -> Trs {
        Trs {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

/// Shepperd's method: pick the numerically largest of w, x, y, z first.
fn rotation_from_columns(c0: Vec3, c1: Vec3, c2: Vec3) -> DQuat {
    // r{row}{col}
    let (r00, r10, r20) = (c0.x, c0.y, c0.z);
    let (r01, r11, r21) = (c1.x, c1.y, c1.z);
    let (r02, r12, r22) = (c2.x, c2.y, c2.z);
    let trace = r00 + r11 + r22;

    let q = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        DQuat::from_xyzw((r21 - r12) / s, (r02 - r20) / s, (r10 - r01) / s, 0.25 * s)
    } else if r00 > r11 && r00 > r22 {
        let s = (1.0 + r00 - r11 - r22).sqrt() * 2.0;
        DQuat::from_xyzw(0.25 * s, (r01 + r10) / s, (r02 + r20) / s, (r21 - r12) / s)
    } else if r11 > r22 {
        let s = (1.0 + r11 - r00 - r22).sqrt() * 2.0;
        DQuat::from_xyzw((r01 + r10) / s, 0.25 * s, (r12 + r21) / s, (r02 - r20) / s)
    } else {
        let s = (1.0 + r22 - r00 - r11).sqrt() * 2.0;
        DQuat::from_xyzw((r02 + r20) / s, (r12 + r21) / s, 0.25 * s, (r10 - r01) / s)
    };
    q.normalize()
}

/// Transform of a moving primitive at time `t` in [0, 1].
pub fn interpolate_matrices(start: &DMat4, end: &DMat4, t: f64) -> DMat4 {
    let a = Trs::decompose(start);
    let b = Trs::decompose(end);
    a.lerp(&b, t).compose()
}
