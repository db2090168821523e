// Object/world transforms
//
// Extends glam::DMat4 with the operations the solvers need and pairs a
// matrix with its inverse so both directions are available per hit.

use glam::{DMat3, DMat4, DVec4};

use crate::{Aabb, Ray, Vec3};

/// Pivots smaller than this mark the matrix as singular.
const SINGULAR_EPSILON: f64 = 1e-10;

/// Extension trait for DMat4 with ray tracing utilities.
pub trait Mat4Ext {
    /// Build a matrix from row-major rows (the layout scene files use).
    fn from_rows(rows: [[f64; 4]; 4]) -> Self;

    /// Row-major copy of the matrix.
    fn to_rows(&self) -> [[f64; 4]; 4];

    /// Transform a vector (w=0): rotation and scale, no translation.
    fn transform_vector3(&self, vector: Vec3) -> Vec3;

    /// Transform an axis-aligned bounding box by all 8 corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Invert by Gauss-Jordan elimination with partial pivoting.
    ///
    /// Returns `None` if a pivot falls below `1e-10`.
    fn gauss_inverse(&self) -> Option<DMat4>;
}

impl Mat4Ext for DMat4 {
    fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        DMat4::from_cols_array_2d(&rows).transpose()
    }

    fn to_rows(&self) -> [[f64; 4]; 4] {
        self.transpose().to_cols_array_2d()
    }

    fn transform_vector3(&self, vector: Vec3) -> Vec3 {
        let transformed = *self * DVec4::new(vector.x, vector.y, vector.z, 0.0);
        Vec3::new(transformed.x, transformed.y, transformed.z)
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return *aabb;
        }
        let transformed = aabb.corners().map(|corner| self.transform_point3(corner));
        Aabb::enclosing(&transformed)
    }

    fn gauss_inverse(&self) -> Option<DMat4> {
        let rows = self.to_rows();

        // Augmented [M | I]
        let mut aug = [[0.0_f64; 8]; 4];
        for (i, row) in rows.iter().enumerate() {
            aug[i][..4].copy_from_slice(row);
            aug[i][4 + i] = 1.0;
        }

        for col in 0..4 {
            let pivot_row = (col..4)
                .max_by(|&a, &b| aug[a][col].abs().total_cmp(&aug[b][col].abs()))
                .unwrap_or(col);
            if aug[pivot_row][col].abs() < SINGULAR_EPSILON {
                return None;
            }
            aug.swap(col, pivot_row);

            let pivot = aug[col][col];
            for value in aug[col].iter_mut() {
                *value /= pivot;
            }

            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = aug[row][col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..8 {
                    aug[row][k] -= factor * aug[col][k];
                }
            }
        }

        let mut inverse = [[0.0_f64; 4]; 4];
        for (i, row) in aug.iter().enumerate() {
            inverse[i].copy_from_slice(&row[4..]);
        }
        Some(DMat4::from_rows(inverse))
    }
}

/// An object-to-world matrix paired with its inverse.
///
/// Primitives are defined in a canonical object space; every solver maps the
/// incoming ray through `world_to_object` and its results back through
/// `object_to_world`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub object_to_world: DMat4,
    pub world_to_object: DMat4,
    /// Inverse-transpose of the linear part, for normals.
    normal_matrix: DMat3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            object_to_world: DMat4::IDENTITY,
            world_to_object: DMat4::IDENTITY,
            normal_matrix: DMat3::IDENTITY,
        }
    }

    /// Wrap a matrix, computing its inverse.
    ///
    /// A singular matrix gets a zero inverse: rays then collapse to a point
    /// in object space and the primitive simply never reports a hit.
    pub fn from_matrix(object_to_world: DMat4) -> Self {
        let world_to_object = object_to_world.gauss_inverse().unwrap_or(DMat4::ZERO);
        Self {
            object_to_world,
            world_to_object,
            normal_matrix: DMat3::from_mat4(world_to_object).transpose(),
        }
    }

    /// `T · Rz · Ry · Rx · S` from a translation, XYZ Euler angles (radians)
    /// and a per-axis scale.
    pub fn from_trs(translation: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        let matrix = DMat4::from_translation(translation)
            * DMat4::from_rotation_z(rotation.z)
            * DMat4::from_rotation_y(rotation.y)
            * DMat4::from_rotation_x(rotation.x)
            * DMat4::from_scale(scale);
        Self::from_matrix(matrix)
    }

    /// Whether the stored matrix could be inverted.
    pub fn is_invertible(&self) -> bool {
        self.world_to_object != DMat4::ZERO
    }

    #[inline]
    pub fn point_to_world(&self, p: Vec3) -> Vec3 {
        self.object_to_world.transform_point3(p)
    }

    #[inline]
    pub fn point_to_object(&self, p: Vec3) -> Vec3 {
        self.world_to_object.transform_point3(p)
    }

    #[inline]
    pub fn vector_to_world(&self, v: Vec3) -> Vec3 {
        Mat4Ext::transform_vector3(&self.object_to_world, v)
    }

    #[inline]
    pub fn vector_to_object(&self, v: Vec3) -> Vec3 {
        Mat4Ext::transform_vector3(&self.world_to_object, v)
    }

    /// Transform a normal with the inverse-transpose rule and renormalize.
    pub fn normal_to_world(&self, n: Vec3) -> Vec3 {
        (self.normal_matrix * n).try_normalize().unwrap_or(Vec3::Z)
    }

    /// Map a world-space ray into object space.
    ///
    /// The direction is not renormalized, so the ray parameter is shared
    /// between both spaces.
    pub fn ray_to_object(&self, ray: &Ray) -> Ray {
        Ray::new(
            self.point_to_object(ray.origin),
            self.vector_to_object(ray.direction),
            ray.time,
        )
    }

    /// World-space bounds of an object-space box.
    pub fn aabb_to_world(&self, aabb: &Aabb) -> Aabb {
        self.object_to_world.transform_aabb(aabb)
    }
}
