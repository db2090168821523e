//! Camera description as stored in scene files.
//!
//! This is plain data; ray generation lives in the renderer.

use prism_math::Vec3;

#[derive(Clone, Debug, PartialEq)]
pub struct SceneCamera {
    pub name: String,
    pub location: Vec3,

    /// Viewing direction (need not be normalized)
    pub gaze: Vec3,

    pub up: Vec3,

    /// Focal length in millimetres
    pub focal_length: f64,

    /// Sensor size in millimetres
    pub sensor_width: f64,
    pub sensor_height: f64,

    /// Film resolution in pixels
    pub resolution_x: u32,
    pub resolution_y: u32,

    // Thin-lens depth of field
    pub dof_enabled: bool,
    pub focus_distance: f64,
    pub aperture_fstop: f64,
    pub aperture_blades: u32,

    /// PERSP, ORTHO or PANO (only perspective projection is rendered)
    pub camera_type: String,
    pub clip_start: f64,
    pub clip_end: f64,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            name: String::new(),
            location: Vec3::ZERO,
            gaze: Vec3::NEG_Z,
            up: Vec3::Y,
            focal_length: 50.0,
            sensor_width: 36.0,
            sensor_height: 24.0,
            resolution_x: 640,
            resolution_y: 480,
            dof_enabled: false,
            focus_distance: 10.0,
            aperture_fstop: 2.8,
            aperture_blades: 0,
            camera_type: "PERSP".to_string(),
            clip_start: 0.1,
            clip_end: 100.0,
        }
    }
}

impl SceneCamera {
    pub fn aspect_ratio(&self) -> f64 {
        self.resolution_x as f64 / self.resolution_y.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let cam = SceneCamera::default();
        assert_eq!(cam.camera_type, "PERSP");
        assert!(!cam.dof_enabled);
        assert!((cam.aspect_ratio() - 4.0 / 3.0).abs() < 1e-12);
    }
}
