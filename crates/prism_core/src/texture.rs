//! Texture loading and caching for materials.
//!
//! Textures are decoded once (normally during preload) and then sampled
//! from every render thread. The cache sits behind a reader/writer lock:
//! loads take the exclusive lock with a double-checked lookup, samples take
//! the shared lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use prism_math::{Color, Vec3};
use thiserror::Error;

/// Directory scene exports keep their images in.
const TEXTURE_DIR: &str = "Textures";

/// Returned for paths that were never loaded.
const MISSING_TEXTURE_COLOR: Color = Vec3::new(1.0, 0.0, 1.0);

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture: {0}")]
    LoadError(String),

    #[error("Texture {0} has no pixels")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A decoded texture.
///
/// Texels are stored as `byte / 255` without any sRGB decoding, matching the
/// way scene exports author their colors.
#[derive(Clone, Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,

    /// RGBA texels, row-major, top row first
    pub pixels: Vec<[f32; 4]>,

    /// Where the texture was loaded from (for debugging)
    pub path: String,
}

impl Texture {
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>, path: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Build from 8-bit RGBA bytes.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8], path: impl Into<String>) -> Self {
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| {
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                ]
            })
            .collect();
        Self::new(width, height, pixels, path)
    }

    /// A 1x1 texture of a single color.
    pub fn solid_color(color: Color) -> Self {
        Self::new(
            1,
            1,
            vec![[color.x as f32, color.y as f32, color.z as f32, 1.0]],
            "<solid>",
        )
    }

    /// Bilinear sample at (u, v), with (0, 0) at the bottom-left.
    ///
    /// UVs are clamped rather than wrapped, so a texture stretches once
    /// across the surface. Neighbouring texels are clamped at the borders.
    pub fn sample(&self, u: f64, v: f64) -> Color {
        if self.width == 0 || self.height == 0 {
            return MISSING_TEXTURE_COLOR;
        }
        let w = self.width as i64;
        let h = self.height as i64;

        let u = u.clamp(0.0, 1.0);
        let v = 1.0 - v.clamp(0.0, 1.0);

        // Texel centres sit at half-integer positions
        let x = u * w as f64 - 0.5;
        let y = v * h as f64 - 0.5;
        let x_floor = x.floor();
        let y_floor = y.floor();
        let fx = x - x_floor;
        let fy = y - y_floor;

        let x0 = (x_floor as i64).clamp(0, w - 1);
        let y0 = (y_floor as i64).clamp(0, h - 1);
        let x1 = (x_floor as i64 + 1).clamp(0, w - 1);
        let y1 = (y_floor as i64 + 1).clamp(0, h - 1);

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x1, y0);
        let c01 = self.texel(x0, y1);
        let c11 = self.texel(x1, y1);

        let top = c00.lerp(c10, fx);
        let bottom = c01.lerp(c11, fx);
        top.lerp(bottom, fy)
    }

    fn texel(&self, x: i64, y: i64) -> Color {
        let idx = (y * self.width as i64 + x) as usize;
        self.pixels
            .get(idx)
            .map(|p| Vec3::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .unwrap_or(Vec3::ZERO)
    }

    /// Approximate size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 4]>()
    }
}

/// Shared, thread-safe texture cache keyed by the path a material uses.
#[derive(Debug, Default)]
pub struct TextureCache {
    textures: RwLock<HashMap<String, Arc<Texture>>>,

    /// Base directory for resolving relative paths (usually the scene's)
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a texture cache with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: RwLock::default(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load a texture from file, using the cache if it is already there.
    pub fn load(&self, path: &str) -> TextureResult<Arc<Texture>> {
        if let Some(texture) = self.get(path) {
            return Ok(texture);
        }

        let mut textures = self.textures.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have loaded it while we waited
        if let Some(texture) = textures.get(path) {
            return Ok(texture.clone());
        }

        let full_path = self.resolve_path(path);
        let texture = Arc::new(load_texture_file(&full_path)?);
        textures.insert(path.to_string(), texture.clone());

        log::info!(
            "Loaded texture: {} ({}x{}, {:.1} KB) from {}",
            path,
            texture.width,
            texture.height,
            texture.size_bytes() as f64 / 1024.0,
            full_path.display()
        );
        Ok(texture)
    }

    /// Register an already decoded texture under `path`.
    pub fn insert(&self, path: impl Into<String>, texture: Texture) {
        self.textures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), Arc::new(texture));
    }

    /// Load every path, logging failures. Returns how many were newly loaded.
    pub fn preload<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> usize {
        let mut loaded = 0;
        for path in paths {
            if path.is_empty() || self.has_texture(path) {
                continue;
            }
            match self.load(path) {
                Ok(_) => loaded += 1,
                Err(e) => log::error!("{}", e),
            }
        }
        loaded
    }

    /// Get a cached texture without loading.
    pub fn get(&self, path: &str) -> Option<Arc<Texture>> {
        self.textures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    pub fn has_texture(&self, path: &str) -> bool {
        self.textures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    /// Sample a cached texture. Unknown paths return magenta.
    pub fn sample(&self, path: &str, u: f64, v: f64) -> Color {
        let textures = self.textures.read().unwrap_or_else(PoisonError::into_inner);
        match textures.get(path) {
            Some(texture) => texture.sample(u, v),
            None => {
                log::warn!("Texture not found: {} (returning magenta)", path);
                MISSING_TEXTURE_COLOR
            }
        }
    }

    pub fn len(&self) -> usize {
        self.textures.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total memory used by cached texels.
    pub fn total_size_bytes(&self) -> usize {
        self.textures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|t| t.size_bytes())
            .sum()
    }

    /// First existing candidate among the path itself (relative to the base
    /// directory), then the `Textures/` directories next to it.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            return path.to_path_buf();
        }

        let mut candidates = Vec::new();
        match &self.base_dir {
            Some(base) => {
                candidates.push(base.join(path));
                candidates.push(base.join(TEXTURE_DIR).join(path));
            }
            None => candidates.push(path.to_path_buf()),
        }
        candidates.push(Path::new(TEXTURE_DIR).join(path));
        candidates.push(Path::new("..").join(TEXTURE_DIR).join(path));

        let found = candidates.iter().position(|c| c.is_file()).unwrap_or(0);
        candidates.swap_remove(found)
    }
}

fn load_texture_file(path: &Path) -> TextureResult<Texture> {
    let img = image::open(path).map_err(|e| {
        TextureError::LoadError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty(path.display().to_string()));
    }

    Ok(Texture::from_rgba8(
        width,
        height,
        rgba.as_raw(),
        path.to_string_lossy(),
    ))
}
