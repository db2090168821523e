//! Camera for ray generation.
//!
//! Rays start at the camera location (or a point on the lens when depth of
//! field is on) and pass through a sensor plane placed one focal length
//! behind the viewpoint, mirrored in front of it. Focal length and sensor
//! size are in millimetres; world units are metres.

use std::f64::consts::PI;

use prism_core::SceneCamera;
use prism_math::{Ray, Vec3};
use rand::Rng;

const MM_TO_M: f64 = 0.001;

/// Camera for generating rays into the scene.
#[derive(Clone, Debug)]
pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,

    location: Vec3,
    /// Unit viewing direction
    gaze: Vec3,
    // Orthonormal basis, w points away from the view direction
    u: Vec3,
    v: Vec3,
    w: Vec3,

    focal_length: f64,
    viewport_width: f64,
    viewport_height: f64,

    dof_enabled: bool,
    focus_distance: f64,
    aperture_fstop: f64,
}

impl Camera {
    /// Build a camera from a scene camera and the output resolution.
    pub fn new(scene_camera: &SceneCamera, image_width: u32, image_height: u32) -> Self {
        let image_width = image_width.max(1);
        let image_height = image_height.max(1);

        let w = -scene_camera.gaze.try_normalize().unwrap_or(Vec3::NEG_Z);
        let u = scene_camera
            .up
            .cross(w)
            .try_normalize()
            .unwrap_or_else(|| w.any_orthonormal_vector());
        let v = w.cross(u);

        let focal_length = scene_camera.focal_length * MM_TO_M;
        let viewport_height = scene_camera.sensor_height * MM_TO_M;
        let viewport_width = viewport_height * image_width as f64 / image_height as f64;

        let camera = Self {
            image_width,
            image_height,
            location: scene_camera.location,
            gaze: -w,
            u,
            v,
            w,
            focal_length,
            viewport_width,
            viewport_height,
            dof_enabled: scene_camera.dof_enabled,
            focus_distance: scene_camera.focus_distance,
            aperture_fstop: scene_camera.aperture_fstop,
        };
        log::debug!(
            "Camera '{}': {}x{}, focal {:.1}mm, viewport {:.4}x{:.4}, dof {}",
            scene_camera.name,
            image_width,
            image_height,
            scene_camera.focal_length,
            viewport_width,
            viewport_height,
            camera.has_depth_of_field()
        );
        camera
    }

    /// Force depth of field on with the given aperture and focus distance.
    pub fn with_depth_of_field(mut self, fstop: f64, focus_distance: f64) -> Self {
        self.dof_enabled = true;
        self.aperture_fstop = fstop;
        self.focus_distance = focus_distance;
        self
    }

    pub fn has_depth_of_field(&self) -> bool {
        self.dof_enabled && self.aperture_fstop > 0.0
    }

    /// Lens radius in world units.
    pub fn aperture_radius(&self) -> f64 {
        if self.has_depth_of_field() {
            self.focal_length / (2.0 * self.aperture_fstop)
        } else {
            0.0
        }
    }

    /// Pinhole ray through continuous pixel coordinate (x, y), where (0, 0)
    /// is the top-left corner of the image.
    pub fn pinhole_ray(&self, x: f64, y: f64, time: f64) -> Ray {
        let ndc_x = x / self.image_width as f64;
        let ndc_y = y / self.image_height as f64;
        let sensor_x = (ndc_x - 0.5) * self.viewport_width;
        let sensor_y = (0.5 - ndc_y) * self.viewport_height;

        let image_point = self.location - self.w * self.focal_length
            + self.u * sensor_x
            + self.v * sensor_y;
        let direction = (image_point - self.location).normalize_or_zero();
        Ray::new(self.location, direction, time)
    }

    /// Ray through pixel coordinate (x, y), sampling the lens when depth of
    /// field is enabled.
    pub fn get_ray<R: Rng + ?Sized>(&self, x: f64, y: f64, time: f64, rng: &mut R) -> Ray {
        let ray = self.pinhole_ray(x, y, time);
        if !self.has_depth_of_field() {
            return ray;
        }

        // Distance along the ray to the plane of focus
        let cos_theta = self.gaze.dot(ray.direction);
        if cos_theta <= 1e-8 {
            return ray;
        }
        let focus_point = ray.at(self.focus_distance / cos_theta);

        let radius = self.aperture_radius() * rng.gen::<f64>().sqrt();
        let theta = 2.0 * PI * rng.gen::<f64>();
        let lens_point =
            self.location + self.u * (radius * theta.cos()) + self.v * (radius * theta.sin());

        let direction = (focus_point - lens_point).normalize_or_zero();
        Ray::new(lens_point, direction, time)
    }
}
