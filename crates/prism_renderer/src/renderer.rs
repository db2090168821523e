//! Row-parallel renderer.
//!
//! Rows are handed to rayon, which balances uneven rows (glass, soft
//! shadows) by work stealing. Each worker owns a seeded `StdRng`; the scene,
//! BVH and texture cache are shared read-only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use prism_core::{ImageBuffer, Light, RenderConfig, Scene, SceneSettings, TextureCache, ToneMapping};
use prism_math::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::{Camera, RenderStats, Tracer, World};

/// Everything a finished render produces.
#[derive(Debug)]
pub struct RenderOutput {
    pub image: ImageBuffer,
    /// Wall-clock milliseconds spent on each row, top row first
    pub row_times_ms: Vec<f64>,
    pub elapsed: Duration,
}

pub struct Renderer {
    world: World,
    lights: Vec<Light>,
    settings: SceneSettings,
    has_motion: bool,
    config: RenderConfig,
    textures: Arc<TextureCache>,
    stats: Arc<RenderStats>,
}

impl Renderer {
    /// Take ownership of the scene and build the world (and BVH) from it.
    pub fn new(
        scene: Scene,
        config: RenderConfig,
        textures: Arc<TextureCache>,
        stats: Arc<RenderStats>,
    ) -> Self {
        let has_motion = scene.has_motion();
        let world = World::new(scene.primitives, config.enable_bvh, stats.clone());
        Self {
            world,
            lights: scene.lights,
            settings: scene.settings,
            has_motion,
            config,
            textures,
            stats,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<RenderStats> {
        &self.stats
    }

    pub fn tracer(&self) -> Tracer<'_> {
        Tracer::new(
            &self.world,
            &self.lights,
            &self.settings,
            &self.config,
            &self.textures,
        )
    }

    /// Samples taken per pixel. Moving scenes need enough time samples to
    /// resolve the blur.
    pub fn samples_per_pixel(&self) -> u32 {
        let aa = self.config.aa_samples.max(1);
        if self.has_motion {
            aa.max(self.config.motion_blur_samples)
        } else {
            aa
        }
    }

    /// Render the full image. `on_row` is called from worker threads with
    /// the number of rows finished so far.
    pub fn render<F>(&self, camera: &Camera, on_row: F) -> RenderOutput
    where
        F: Fn(u64) + Sync,
    {
        let threads = self.config.num_threads;
        if threads > 0 {
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => return pool.install(|| self.render_rows(camera, &on_row)),
                Err(e) => log::warn!("Could not build a {threads}-thread pool ({e}), using the global pool"),
            }
        }
        self.render_rows(camera, &on_row)
    }

    fn render_rows<F>(&self, camera: &Camera, on_row: &F) -> RenderOutput
    where
        F: Fn(u64) + Sync,
    {
        let width = camera.image_width;
        let height = camera.image_height;
        let spp = self.samples_per_pixel();
        log::info!(
            "Rendering {}x{} at {} spp, max depth {}, {} threads",
            width,
            height,
            spp,
            self.config.max_ray_depth,
            rayon::current_num_threads()
        );

        let tracer = self.tracer();
        let mut image = ImageBuffer::new(width, height);
        let mut row_times_ms = vec![0.0; height as usize];

        let base_seed: u64 = rand::thread_rng().gen();
        let streams = AtomicU64::new(0);
        let start = Instant::now();

        image
            .pixels
            .par_chunks_mut(width as usize)
            .zip(row_times_ms.par_iter_mut())
            .enumerate()
            .for_each_init(
                || {
                    let thread = rayon::current_thread_index().unwrap_or(0) as u64;
                    let stream = streams.fetch_add(1, Ordering::Relaxed);
                    StdRng::seed_from_u64(base_seed ^ (thread << 32) ^ stream)
                },
                |rng, (y, (row, row_time))| {
                    let row_start = Instant::now();
                    for (x, pixel) in row.iter_mut().enumerate() {
                        let mut sum = Color::ZERO;
                        for _ in 0..spp {
                            let px = x as f64 + rng.gen::<f64>();
                            let py = y as f64 + rng.gen::<f64>();
                            let time = rng.gen::<f64>();
                            let ray = camera.get_ray(px, py, time, rng);
                            sum += tracer.trace(&ray, 0, rng);
                        }
                        *pixel = tone_map(sum / spp as f64, &self.config);
                    }
                    self.stats.add_camera_rays(u64::from(spp) * row.len() as u64);
                    *row_time = row_start.elapsed().as_secs_f64() * 1000.0;
                    on_row(self.stats.row_completed());
                },
            );

        let elapsed = start.elapsed();
        self.log_summary(elapsed, height);

        RenderOutput {
            image,
            row_times_ms,
            elapsed,
        }
    }

    fn log_summary(&self, elapsed: Duration, rows: u32) {
        let snap = self.stats.snapshot();
        let secs = elapsed.as_secs_f64();
        log::info!(
            "Render finished in {:.2}s ({:.2}ms per row)",
            secs,
            secs * 1000.0 / rows.max(1) as f64
        );
        log::info!(
            "Rays: {} total ({} camera, {} shadow, {} reflection, {} refraction), {} intersection tests",
            snap.total_rays(),
            snap.camera_rays,
            snap.shadow_rays,
            snap.reflection_rays,
            snap.refraction_rays,
            snap.intersection_tests
        );
    }
}

/// Map an averaged linear pixel to display range: tone mapping, then gamma.
pub fn tone_map(color: Color, config: &RenderConfig) -> Color {
    let mapped = match config.tone_mapping {
        ToneMapping::None => color,
        ToneMapping::Reinhard => color / (Color::ONE + color),
        ToneMapping::Exposure => (color * config.exposure).min(Color::ONE),
    };
    if config.enable_gamma_correction {
        let inv_gamma = 1.0 / config.gamma;
        mapped.max(Color::ZERO).powf(inv_gamma)
    } else {
        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::{Material, Motion, Primitive, SceneCamera, Shape};
    use prism_math::{Mat4, Transform, Vec3};
    use std::sync::Mutex;

    fn test_scene() -> Scene {
        let mut scene = Scene::new();
        scene.settings.background_color = Vec3::new(0.2, 0.3, 0.4);
        scene.cameras.push(SceneCamera {
            location: Vec3::new(0.0, 0.0, 6.0),
            gaze: Vec3::NEG_Z,
            resolution_x: 16,
            resolution_y: 12,
            ..SceneCamera::default()
        });
        scene.primitives.push(
            Primitive::new("ball", Shape::Sphere, Transform::identity())
                .with_material(Material::new(Vec3::new(0.8, 0.2, 0.2))),
        );
        scene
            .lights
            .push(Light::point("key", Vec3::new(2.0, 3.0, 5.0), 50.0));
        scene
    }

    fn flat_config() -> RenderConfig {
        RenderConfig {
            aa_samples: 2,
            enable_gamma_correction: false,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_tone_mapping() {
        let c = Color::new(1.0, 3.0, 0.0);
        let mut config = flat_config();

        config.tone_mapping = ToneMapping::None;
        assert_eq!(tone_map(c, &config), c);

        config.tone_mapping = ToneMapping::Reinhard;
        assert!((tone_map(c, &config) - Color::new(0.5, 0.75, 0.0)).length() < 1e-12);

        config.tone_mapping = ToneMapping::Exposure;
        config.exposure = 0.5;
        assert!((tone_map(c, &config) - Color::new(0.5, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_gamma_correction() {
        let config = RenderConfig {
            gamma: 2.0,
            enable_gamma_correction: true,
            ..RenderConfig::default()
        };
        let c = tone_map(Color::new(0.25, 1.0, -0.1), &config);
        assert!((c - Color::new(0.5, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_render_fills_image() {
        let _ = env_logger::builder().is_test(true).try_init();
        let scene = test_scene();
        let camera = Camera::new(&scene.cameras[0], 16, 12);
        let background = scene.settings.background();
        let stats = Arc::new(RenderStats::new());
        let renderer = Renderer::new(scene, flat_config(), Arc::new(TextureCache::new()), stats.clone());

        let output = renderer.render(&camera, |_| {});

        assert_eq!(output.image.width, 16);
        assert_eq!(output.image.height, 12);
        assert_eq!(output.row_times_ms.len(), 12);
        // Corner sees the background, centre sees the sphere
        assert!((output.image.get(0, 0) - background).length() < 1e-12);
        assert!((output.image.get(8, 6) - background).length() > 0.01);

        let snap = stats.snapshot();
        assert_eq!(snap.camera_rays, 16 * 12 * 2);
        assert_eq!(snap.rows_completed, 12);
        assert!(snap.intersection_tests > 0);
    }

    #[test]
    fn test_progress_callback_sees_every_row() {
        let scene = test_scene();
        let camera = Camera::new(&scene.cameras[0], 16, 12);
        let renderer = Renderer::new(
            scene,
            flat_config(),
            Arc::new(TextureCache::new()),
            Arc::new(RenderStats::new()),
        );

        let seen = Mutex::new(Vec::new());
        renderer.render(&camera, |done| seen.lock().unwrap().push(done));

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (1..=12).collect::<Vec<u64>>());
    }

    #[test]
    fn test_dedicated_thread_pool() {
        let scene = test_scene();
        let camera = Camera::new(&scene.cameras[0], 16, 12);
        let config = RenderConfig {
            num_threads: 2,
            ..flat_config()
        };
        let renderer = Renderer::new(
            scene,
            config,
            Arc::new(TextureCache::new()),
            Arc::new(RenderStats::new()),
        );
        let output = renderer.render(&camera, |_| {});
        assert_eq!(output.image.pixels.len(), 16 * 12);
    }

    #[test]
    fn test_motion_raises_sample_count() {
        let mut scene = test_scene();
        scene.primitives[0].motion = Some(Motion::new(
            Mat4::IDENTITY,
            Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        ));
        let config = RenderConfig {
            aa_samples: 4,
            motion_blur_samples: 16,
            ..flat_config()
        };
        let renderer = Renderer::new(
            scene,
            config,
            Arc::new(TextureCache::new()),
            Arc::new(RenderStats::new()),
        );
        assert_eq!(renderer.samples_per_pixel(), 16);

        let renderer = Renderer::new(
            test_scene(),
            flat_config(),
            Arc::new(TextureCache::new()),
            Arc::new(RenderStats::new()),
        );
        assert_eq!(renderer.samples_per_pixel(), 2);
    }
}
