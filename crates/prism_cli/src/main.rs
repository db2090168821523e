//! `prism` - render a scene file to an image.

mod cli;
mod logger;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use prism_core::{load_scene, RenderConfig, TextureCache};
use prism_renderer::{Camera, RenderStats, Renderer};

use cli::Args;
use logger::init_logger;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.into());
    log::info!("Starting Prism {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    args.apply_overrides(&mut config);
    let config = config.validated();
    log::info!(
        "Config: aa {}, shadow {}, glossy {}, motion blur {}, depth {}, tone mapping {:?}, gamma {}",
        config.aa_samples,
        config.shadow_samples,
        config.glossy_samples,
        config.motion_blur_samples,
        config.max_ray_depth,
        config.tone_mapping,
        if config.enable_gamma_correction { config.gamma } else { 1.0 }
    );

    let scene = load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    let Some(scene_camera) = scene.cameras.get(args.camera).cloned() else {
        if scene.cameras.is_empty() {
            bail!("Scene {} has no camera", args.scene.display());
        }
        bail!(
            "Camera index {} out of range, scene has {} cameras",
            args.camera,
            scene.cameras.len()
        );
    };

    let (width, height) =
        args.resolution_or((scene_camera.resolution_x, scene_camera.resolution_y));
    let mut camera = Camera::new(&scene_camera, width, height);
    if let Some((fstop, focus)) = args.depth_of_field() {
        log::info!("Depth of field: f/{fstop}, focus {focus}");
        camera = camera.with_depth_of_field(fstop, focus);
    }

    let textures = Arc::new(match args.scene.parent() {
        Some(dir) => TextureCache::with_base_dir(dir),
        None => TextureCache::new(),
    });
    if config.enable_textures {
        let paths = scene.texture_paths();
        let loaded = textures.preload(paths.iter().map(String::as_str));
        log::info!(
            "Preloaded {}/{} textures ({:.1} MB)",
            loaded,
            paths.len(),
            textures.total_size_bytes() as f64 / (1024.0 * 1024.0)
        );
    }

    let stats = Arc::new(RenderStats::new());
    let renderer = Renderer::new(scene, config, textures, stats);

    let progress = ProgressBar::new(u64::from(height));
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} rows ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let output = renderer.render(&camera, |done| progress.set_position(done));
    progress.finish_and_clear();

    output
        .image
        .save(&args.output)
        .with_context(|| format!("Failed to write image {}", args.output.display()))?;
    log::info!("Saved {}", args.output.display());

    if let Some(path) = &args.row_times {
        write_row_times(path, &output.row_times_ms)
            .with_context(|| format!("Failed to write row times {}", path.display()))?;
        log::info!("Row times written to {}", path.display());
    }

    let snap = renderer.stats().snapshot();
    log::info!(
        "Done in {:.2}s, {} rays, {} intersection tests",
        output.elapsed.as_secs_f64(),
        snap.total_rays(),
        snap.intersection_tests
    );
    Ok(())
}

fn write_row_times(path: &Path, row_times_ms: &[f64]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "Row,Time(ms)")?;
    for (row, ms) in row_times_ms.iter().enumerate() {
        writeln!(out, "{row},{ms:.3}")?;
    }
    out.flush()?;
    Ok(())
}
