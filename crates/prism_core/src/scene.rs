//! The loaded scene: settings, cameras, lights and primitives.
//!
//! Built once by the loader and read-only for the rest of the process.

use std::collections::BTreeSet;

use crate::{Light, Primitive, SceneCamera, SceneSettings};

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub settings: SceneSettings,
    pub cameras: Vec<SceneCamera>,
    pub lights: Vec<Light>,
    pub primitives: Vec<Primitive>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of primitives of a kind (`"sphere"`, `"cube"`, ...).
    pub fn count(&self, kind: &str) -> usize {
        self.primitives
            .iter()
            .filter(|p| p.shape.kind() == kind)
            .count()
    }

    /// True if any primitive moves during the shutter interval.
    pub fn has_motion(&self) -> bool {
        self.primitives.iter().any(Primitive::has_motion)
    }

    /// Distinct texture, normal map and bump map paths, sorted.
    pub fn texture_paths(&self) -> Vec<String> {
        let paths: BTreeSet<&str> = self
            .primitives
            .iter()
            .flat_map(|p| p.material.texture_paths())
            .filter(|p| !p.is_empty())
            .collect();
        paths.into_iter().map(str::to_string).collect()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} cameras, {} lights, {} spheres, {} cubes, {} planes, {} toruses, {} cylinders, {} cones",
            self.cameras.len(),
            self.lights.len(),
            self.count("sphere"),
            self.count("cube"),
            self.count("plane"),
            self.count("torus"),
            self.count("cylinder"),
            self.count("cone"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Shape};
    use prism_math::{Mat4, Transform};

    fn textured(path: &str) -> Material {
        Material {
            texture: Some(path.to_string()),
            ..Material::default()
        }
    }

    #[test]
    fn test_scene_counts() {
        let mut scene = Scene::new();
        scene.primitives.push(Primitive::new("a", Shape::Sphere, Transform::identity()));
        scene.primitives.push(Primitive::new("b", Shape::Sphere, Transform::identity()));
        scene.primitives.push(Primitive::new(
            "c",
            Shape::Torus {
                major_radius: 2.0,
                minor_radius: 0.5,
            },
            Transform::identity(),
        ));

        assert_eq!(scene.count("sphere"), 2);
        assert_eq!(scene.count("torus"), 1);
        assert_eq!(scene.count("cone"), 0);
        assert!(!scene.has_motion());
        assert!(scene.summary().contains("2 spheres"));
    }

    #[test]
    fn test_texture_paths_are_unique() {
        let mut scene = Scene::new();
        for (name, path) in [("a", "b.png"), ("b", "a.png"), ("c", "b.png")] {
            scene.primitives.push(
                Primitive::new(name, Shape::Sphere, Transform::identity())
                    .with_material(textured(path)),
            );
        }
        assert_eq!(scene.texture_paths(), vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_has_motion() {
        let mut scene = Scene::new();
        scene.primitives.push(
            Primitive::new("m", Shape::Sphere, Transform::identity()).with_motion(
                crate::Motion::new(Mat4::IDENTITY, Mat4::from_translation(prism_math::Vec3::X)),
            ),
        );
        assert!(scene.has_motion());
    }
}
