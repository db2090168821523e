//! Render configuration.
//!
//! Quality, lighting and ray-offset parameters for one render. Loaded from a
//! JSON file (any missing field takes its default) and then overridden from
//! the command line. Treated as immutable once rendering starts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recursion depth is capped regardless of what the configuration asks for.
pub const MAX_RAY_DEPTH_LIMIT: u32 = 64;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Operator applied to each averaged pixel before gamma.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMapping {
    #[default]
    None,
    Reinhard,
    Exposure,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Jittered samples per pixel
    pub aa_samples: u32,

    /// Shadow samples per area light (0 = use each light's own count)
    pub shadow_samples: u32,

    /// Glossy reflection samples (0 or 1 = mirror only)
    pub glossy_samples: u32,

    /// Minimum samples per pixel when the scene has moving primitives
    pub motion_blur_samples: u32,

    /// Maximum recursion depth for reflection/refraction
    pub max_ray_depth: u32,

    pub tone_mapping: ToneMapping,
    pub exposure: f64,

    pub gamma: f64,
    pub enable_gamma_correction: bool,

    /// Global multiplier on light intensities
    pub light_intensity_factor: f64,

    /// Global multiplier on ambient color
    pub ambient_factor: f64,

    /// Base offset for secondary ray origins
    pub ray_offset_epsilon: f64,

    /// Grow the offset with distance from the world origin
    pub use_adaptive_epsilon: bool,
    pub adaptive_epsilon_scale: f64,

    /// Transparency at or above this skips local shading
    pub pure_glass_threshold: f64,

    pub enable_bvh: bool,
    pub enable_textures: bool,
    pub enable_shadows: bool,

    /// Worker threads (0 = rayon's default)
    pub num_threads: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            aa_samples: 4,
            shadow_samples: 16,
            glossy_samples: 0,
            motion_blur_samples: 16,
            max_ray_depth: 12,
            tone_mapping: ToneMapping::None,
            exposure: 1.0,
            gamma: 2.2,
            enable_gamma_correction: true,
            light_intensity_factor: 0.2,
            ambient_factor: 1.0,
            ray_offset_epsilon: 0.001,
            use_adaptive_epsilon: true,
            adaptive_epsilon_scale: 1e-4,
            pure_glass_threshold: 0.99,
            enable_bvh: true,
            enable_textures: true,
            enable_shadows: true,
            num_threads: 0,
        }
    }
}

impl RenderConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: RenderConfig = serde_json::from_str(text)?;
        Ok(config.validated())
    }

    /// Clamp values into the ranges the renderer supports.
    pub fn validated(mut self) -> Self {
        if self.max_ray_depth > MAX_RAY_DEPTH_LIMIT {
            log::warn!(
                "max_ray_depth {} exceeds limit, clamping to {}",
                self.max_ray_depth,
                MAX_RAY_DEPTH_LIMIT
            );
            self.max_ray_depth = MAX_RAY_DEPTH_LIMIT;
        }
        self.aa_samples = self.aa_samples.max(1);
        if self.gamma <= 0.0 {
            self.gamma = 2.2;
        }
        self
    }

    /// Secondary-ray offset at `point`.
    pub fn epsilon_at(&self, point: prism_math::Vec3) -> f64 {
        if self.use_adaptive_epsilon {
            self.ray_offset_epsilon + point.length() * self.adaptive_epsilon_scale
        } else {
            self.ray_offset_epsilon
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::Vec3;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.aa_samples, 4);
        assert_eq!(config.max_ray_depth, 12);
        assert_eq!(config.tone_mapping, ToneMapping::None);
        assert!(config.enable_bvh);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            RenderConfig::from_json(r#"{ "aa_samples": 16, "tone_mapping": "reinhard" }"#).unwrap();
        assert_eq!(config.aa_samples, 16);
        assert_eq!(config.tone_mapping, ToneMapping::Reinhard);
        assert_eq!(config.shadow_samples, 16);
        assert_eq!(config.gamma, 2.2);
    }

    #[test]
    fn test_depth_is_clamped() {
        let config = RenderConfig::from_json(r#"{ "max_ray_depth": 500 }"#).unwrap();
        assert_eq!(config.max_ray_depth, MAX_RAY_DEPTH_LIMIT);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            RenderConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            RenderConfig::from_json(r#"{ "tone_mapping": "aces" }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_round_trip_json() {
        let config = RenderConfig {
            glossy_samples: 8,
            tone_mapping: ToneMapping::Exposure,
            ..RenderConfig::default()
        };
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(RenderConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn test_adaptive_epsilon() {
        let mut config = RenderConfig::default();
        let p = Vec3::new(0.0, 30.0, 40.0);
        assert!((config.epsilon_at(p) - (0.001 + 50.0 * 1e-4)).abs() < 1e-15);

        config.use_adaptive_epsilon = false;
        assert_eq!(config.epsilon_at(p), 0.001);
    }
}
