use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use prism_core::RenderConfig;

/// Log levels accepted by `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "prism")]
#[command(version, about = "Whitted-style CPU ray tracer")]
pub struct Args {
    /// Scene description file
    #[arg(short, long)]
    pub scene: PathBuf,

    /// Output image (.ppm writes ASCII PPM, anything else goes through the image encoder)
    #[arg(short, long, default_value = "output.ppm")]
    pub output: PathBuf,

    /// JSON render configuration, applied before the flags below
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output resolution, overriding the camera's film size
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    pub resolution: Option<Vec<u32>>,

    /// Output width in pixels
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Output height in pixels
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Antialiasing samples per pixel
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub samples: Option<u32>,

    /// Maximum recursion depth for reflection and refraction
    #[arg(long)]
    pub max_depth: Option<u32>,

    #[arg(long)]
    pub disable_bvh: bool,

    #[arg(long)]
    pub disable_textures: bool,

    #[arg(long)]
    pub disable_shadows: bool,

    /// One sample per pixel
    #[arg(long)]
    pub disable_aa: bool,

    /// Shadow samples for area lights
    #[arg(long, value_name = "N")]
    pub soft_shadows: Option<u32>,

    /// Importance samples for glossy reflections
    #[arg(long, value_name = "N")]
    pub glossy_reflection: Option<u32>,

    /// Time samples per pixel for moving objects
    #[arg(long, value_name = "N")]
    pub motion_blur: Option<u32>,

    /// Enable depth of field with the given f-stop and focus distance
    #[arg(long, num_args = 2, value_names = ["FSTOP", "FOCUS"])]
    pub depth_of_field: Option<Vec<f64>>,

    /// Worker threads (0 = all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Index of the scene camera to render through
    #[arg(long, default_value_t = 0)]
    pub camera: usize,

    /// Write per-row render times to this CSV file
    #[arg(long, value_name = "CSV")]
    pub row_times: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Args {
    /// Apply command line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut RenderConfig) {
        if let Some(samples) = self.samples {
            config.aa_samples = samples;
        }
        if self.disable_aa {
            config.aa_samples = 1;
        }
        if let Some(depth) = self.max_depth {
            config.max_ray_depth = depth;
        }
        if let Some(n) = self.soft_shadows {
            config.shadow_samples = n;
        }
        if let Some(n) = self.glossy_reflection {
            config.glossy_samples = n;
        }
        if let Some(n) = self.motion_blur {
            config.motion_blur_samples = n;
        }
        if let Some(n) = self.threads {
            config.num_threads = n;
        }
        if self.disable_bvh {
            config.enable_bvh = false;
        }
        if self.disable_textures {
            config.enable_textures = false;
        }
        if self.disable_shadows {
            config.enable_shadows = false;
        }
    }

    /// Requested output size, falling back to the camera's film resolution.
    pub fn resolution_or(&self, default: (u32, u32)) -> (u32, u32) {
        let (mut width, mut height) = match self.resolution.as_deref() {
            Some([w, h]) => (*w, *h),
            _ => default,
        };
        if let Some(w) = self.width {
            width = w;
        }
        if let Some(h) = self.height {
            height = h;
        }
        (width.max(1), height.max(1))
    }

    /// `(fstop, focus_distance)` when `--depth-of-field` was given.
    pub fn depth_of_field(&self) -> Option<(f64, f64)> {
        match self.depth_of_field.as_deref() {
            Some([fstop, focus]) => Some((*fstop, *focus)),
            _ => None,
        }
    }
}
