//! Prism Core - Scene model, scene file loading and image output.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `Primitive`, `Shape`, `Material`, `Light`, `SceneCamera`
//! - **Scene files**: parsing of the line-oriented scene text format
//! - **Configuration**: `RenderConfig` loaded from JSON
//! - **Textures**: a thread-safe `TextureCache` with bilinear sampling
//! - **Images**: `ImageBuffer` with PPM and PNG output
//!
//! # Example
//!
//! ```ignore
//! use prism_core::load_scene;
//!
//! let scene = load_scene("scenes/test.txt")?;
//! println!("Loaded {}", scene.summary());
//! ```

pub mod camera;
pub mod config;
pub mod image_buffer;
pub mod light;
pub mod loader;
pub mod material;
pub mod primitive;
pub mod scene;
pub mod settings;
pub mod texture;

// Re-export commonly used types
pub use camera::SceneCamera;
pub use config::{ConfigError, RenderConfig, ToneMapping, MAX_RAY_DEPTH_LIMIT};
pub use image_buffer::{color_to_bytes, ImageBuffer, ImageError, PpmFormat};
pub use light::{AreaShape, Light, LightKind};
pub use loader::{load_scene, parse_scene, ParseError};
pub use material::Material;
pub use primitive::{Motion, Primitive, Shape};
pub use scene::Scene;
pub use settings::SceneSettings;
pub use texture::{Texture, TextureCache, TextureError};
