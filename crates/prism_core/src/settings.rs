//! Scene-wide settings from the `SCENE_SETTINGS` block.

use prism_math::{Color, Vec3};

#[derive(Clone, Debug, PartialEq)]
pub struct SceneSettings {
    /// Radiance returned by rays that escape the scene
    pub background_color: Color,
    pub background_strength: f64,

    pub ambient_light: Color,

    pub frame_current: i32,
    pub frame_start: i32,
    pub frame_end: i32,
    pub fps: i32,

    // Bounce hints exported alongside the scene. Recursion depth is
    // controlled by the render configuration.
    pub max_bounces: u32,
    pub diffuse_bounces: u32,
    pub glossy_bounces: u32,
    pub transmission_bounces: u32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            background_color: Vec3::splat(0.05),
            background_strength: 1.0,
            ambient_light: Vec3::splat(0.1),
            frame_current: 1,
            frame_start: 1,
            frame_end: 250,
            fps: 24,
            max_bounces: 12,
            diffuse_bounces: 4,
            glossy_bounces: 4,
            transmission_bounces: 12,
        }
    }
}

impl SceneSettings {
    /// Background radiance for a missed ray.
    pub fn background(&self) -> Color {
        self.background_color * self.background_strength
    }
}
