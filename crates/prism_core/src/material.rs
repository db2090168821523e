//! Surface materials.
//!
//! A material combines a Blinn-Phong local model with Whitted-style
//! reflection and refraction weights. `reflectivity + transparency` must not
//! exceed 1; the remainder is the weight of local shading.

use prism_math::{Color, Vec3};

/// Reflectivity above this (with low transparency) marks a metal.
const METAL_REFLECTIVITY: f64 = 0.5;
const METAL_MAX_TRANSPARENCY: f64 = 0.1;

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Base color (kd)
    pub diffuse_color: Color,

    /// Specular highlight color (ks)
    pub specular_color: Color,

    /// Ambient color (ka)
    pub ambient_color: Color,

    /// Blinn-Phong exponent
    pub shininess: f64,

    /// Lobe sharpness of glossy reflection (1.0 = mirror)
    pub glossiness: f64,

    /// Mirror reflection coefficient (kr)
    pub reflectivity: f64,

    /// Transmission coefficient (kt)
    pub transparency: f64,

    /// Index of refraction
    pub refractive_index: f64,

    pub emission_color: Color,
    pub emission_strength: f64,

    /// Path to the diffuse texture
    pub texture: Option<String>,

    /// Path to a tangent-space normal map
    pub normal_map: Option<String>,

    /// Path to a grayscale height map
    pub bump_map: Option<String>,

    /// Scales normal map and bump map perturbation
    pub bump_strength: f64,
}

impl Material {
    /// Default material, usable where a `&'static Material` is needed.
    pub const DEFAULT: Material = Material {
        diffuse_color: Vec3::new(0.8, 0.8, 0.8),
        specular_color: Vec3::ONE,
        ambient_color: Vec3::new(0.1, 0.1, 0.1),
        shininess: 32.0,
        glossiness: 0.0,
        reflectivity: 0.0,
        transparency: 0.0,
        refractive_index: 1.0,
        emission_color: Vec3::ZERO,
        emission_strength: 0.0,
        texture: None,
        normal_map: None,
        bump_map: None,
        bump_strength: 1.0,
    };

    /// Create a material with a diffuse color and defaults elsewhere.
    pub fn new(diffuse_color: Color) -> Self {
        Self {
            diffuse_color,
            ..Self::DEFAULT
        }
    }

    /// Blinn-Phong BRDF: the (possibly textured) albedo plus a specular lobe
    /// around the half vector.
    pub fn eval(&self, view_dir: Vec3, light_dir: Vec3, normal: Vec3, albedo: Color) -> Color {
        let mut brdf = albedo;
        let halfway = (light_dir + view_dir).normalize_or_zero();
        let n_dot_h = normal.dot(halfway).max(0.0);
        if n_dot_h > 0.0 {
            brdf += self.specular_color * n_dot_h.powf(self.shininess);
        }
        brdf
    }

    /// Metals tint their reflections by the diffuse color.
    pub fn is_metal(&self) -> bool {
        self.reflectivity > METAL_REFLECTIVITY && self.transparency < METAL_MAX_TRANSPARENCY
    }

    /// Emitted radiance.
    pub fn emission(&self) -> Color {
        self.emission_color * self.emission_strength
    }

    /// Every texture path the material references.
    pub fn texture_paths(&self) -> impl Iterator<Item = &str> {
        [&self.texture, &self.normal_map, &self.bump_map]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let m = Material::default();
        assert_eq!(m.diffuse_color, Vec3::splat(0.8));
        assert_eq!(m.shininess, 32.0);
        assert_eq!(m.refractive_index, 1.0);
        assert!(!m.is_metal());
    }

    #[test]
    fn test_eval_specular_peak() {
        let m = Material::default();
        let n = Vec3::Z;
        // View and light both along the normal: half vector == normal
        let brdf = m.eval(n, n, n, Vec3::splat(0.5));
        assert!((brdf - Vec3::splat(1.5)).length() < 1e-12);
    }

    #[test]
    fn test_eval_no_specular_below_horizon() {
        let m = Material::default();
        let brdf = m.eval(Vec3::Z, Vec3::Z, -Vec3::Z, Vec3::splat(0.2));
        assert_eq!(brdf, Vec3::splat(0.2));
    }

    #[test]
    fn test_metal_classification() {
        let mut m = Material::default();
        m.reflectivity = 0.9;
        assert!(m.is_metal());
        m.transparency = 0.1;
        assert!(!m.is_metal());
    }

    #[test]
    fn test_texture_paths() {
        let mut m = Material::default();
        assert_eq!(m.texture_paths().count(), 0);
        m.texture = Some("wood.png".into());
        m.bump_map = Some("bump.png".into());
        let paths: Vec<_> = m.texture_paths().collect();
        assert_eq!(paths, vec!["wood.png", "bump.png"]);
    }
}
