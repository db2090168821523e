//! In-memory pixel grid and its writers.
//!
//! `.ppm` files are written directly (ASCII P3 or binary P6, max value 255);
//! every other extension goes through the `image` crate's encoders.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use prism_math::Color;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

pub type ImageResult<T> = Result<T, ImageError>;

/// PPM flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PpmFormat {
    /// P3, whitespace separated decimal values
    Ascii,
    /// P6, raw bytes
    Binary,
}

/// Row-major grid of colors, top row first.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let idx = self.index(x, y);
        self.pixels[idx] = color;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Mutable view of row `y`.
    pub fn row_mut(&mut self, y: u32) -> &mut [Color] {
        let start = self.index(0, y);
        &mut self.pixels[start..start + self.width as usize]
    }

    /// Convert to RGB bytes, `round(clamp(c, 0, 1) * 255)` per channel.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|c| color_to_bytes(*c))
            .collect()
    }

    /// Write a PPM file.
    pub fn write_ppm(&self, path: impl AsRef<Path>, format: PpmFormat) -> ImageResult<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.encode_ppm(&mut out, format)?;
        out.flush()?;
        Ok(())
    }

    /// Encode as PPM into any writer.
    pub fn encode_ppm<W: Write>(&self, out: &mut W, format: PpmFormat) -> ImageResult<()> {
        self.check_dimensions()?;
        match format {
            PpmFormat::Ascii => {
                writeln!(out, "P3")?;
                writeln!(out, "{} {}", self.width, self.height)?;
                writeln!(out, "255")?;
                for row in self.pixels.chunks(self.width as usize) {
                    let line: Vec<String> = row
                        .iter()
                        .map(|c| {
                            let [r, g, b] = color_to_bytes(*c);
                            format!("{} {} {}", r, g, b)
                        })
                        .collect();
                    writeln!(out, "{}", line.join(" "))?;
                }
            }
            PpmFormat::Binary => {
                write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
                out.write_all(&self.to_rgb8())?;
            }
        }
        Ok(())
    }

    /// Save, choosing the encoder from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> ImageResult<()> {
        let path = path.as_ref();
        let is_ppm = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ppm"));

        if is_ppm {
            self.write_ppm(path, PpmFormat::Ascii)?;
        } else {
            self.check_dimensions()?;
            let buffer = image::RgbImage::from_raw(self.width, self.height, self.to_rgb8())
                .ok_or(ImageError::InvalidDimensions {
                    width: self.width,
                    height: self.height,
                })?;
            buffer.save(path)?;
        }
        log::debug!("Wrote {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }

    fn check_dimensions(&self) -> ImageResult<()> {
        if self.width == 0
            || self.height == 0
            || self.pixels.len() != self.width as usize * self.height as usize
        {
            return Err(ImageError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Quantize a color to bytes.
pub fn color_to_bytes(color: Color) -> [u8; 3] {
    let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [q(color.x), q(color.y), q(color.z)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::Vec3;

    #[test]
    fn test_color_to_bytes() {
        assert_eq!(color_to_bytes(Vec3::new(0.0, 0.5, 1.0)), [0, 128, 255]);
        assert_eq!(color_to_bytes(Vec3::new(-1.0, 2.0, f64::NAN)), [0, 255, 0]);
    }

    #[test]
    fn test_get_set_row() {
        let mut img = ImageBuffer::new(3, 2);
        img.set(2, 1, Vec3::ONE);
        assert_eq!(img.get(2, 1), Vec3::ONE);
        assert_eq!(img.row_mut(1)[2], Vec3::ONE);
        assert_eq!(img.row_mut(0).len(), 3);
    }

    #[test]
    fn test_encode_ascii_ppm() {
        let mut img = ImageBuffer::new(2, 1);
        img.set(0, 0, Vec3::new(1.0, 0.0, 0.0));
        img.set(1, 0, Vec3::splat(0.2));

        let mut out = Vec::new();
        img.encode_ppm(&mut out, PpmFormat::Ascii).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "P3\n2 1\n255\n255 0 0 51 51 51\n");
    }

    #[test]
    fn test_encode_binary_ppm() {
        let img = ImageBuffer::new(1, 1);
        let mut out = Vec::new();
        img.encode_ppm(&mut out, PpmFormat::Binary).unwrap();
        assert_eq!(out, b"P6\n1 1\n255\n\0\0\0");
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let img = ImageBuffer::new(0, 4);
        let mut out = Vec::new();
        assert!(matches!(
            img.encode_ppm(&mut out, PpmFormat::Ascii),
            Err(ImageError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_save_png_and_ppm() {
        let dir = std::env::temp_dir().join("prism_image_test");
        std::fs::create_dir_all(&dir).unwrap();
        let mut img = ImageBuffer::new(2, 2);
        img.set(1, 1, Vec3::ONE);

        img.save(dir.join("out.ppm")).unwrap();
        let text = std::fs::read_to_string(dir.join("out.ppm")).unwrap();
        assert!(text.starts_with("P3\n2 2\n255\n"));

        img.save(dir.join("out.png")).unwrap();
        let decoded = image::open(dir.join("out.png")).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(1, 1).0, [255, 255, 255]);
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0]);
    }
}
