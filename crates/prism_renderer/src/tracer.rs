//! Recursive Whitted-style tracer.
//!
//! `trace` finds the nearest hit, shades it with direct lighting from every
//! light (soft shadows for area lights), then blends in mirror or glossy
//! reflection and Fresnel-weighted refraction by recursing on secondary rays.
//! Recursion stops at `max_ray_depth` with a black contribution.

use std::f64::consts::PI;

use prism_core::{Light, Material, RenderConfig, SceneSettings, TextureCache};
use prism_math::{Color, Interval, Ray, Vec3};
use rand::Rng;

use crate::{HitRecord, Hittable, World};

/// Nearest valid hit distance for any traced ray.
const T_MIN: f64 = 1e-5;

/// Above this glossiness reflections are treated as a perfect mirror.
const MIRROR_GLOSSINESS: f64 = 0.94;

/// Glossy importance sampling only happens for the first bounces.
const GLOSSY_MAX_DEPTH: u32 = 2;

/// Shadow marching stops once this little light gets through.
const MIN_TRANSMITTANCE: f64 = 0.01;

/// Finite difference step for bump maps, in UV units.
const BUMP_DELTA: f64 = 0.001;

/// Bump map gradients are scaled by this times the bump strength.
const BUMP_SCALE: f64 = 10.0;

pub struct Tracer<'a> {
    world: &'a World,
    lights: &'a [Light],
    settings: &'a SceneSettings,
    config: &'a RenderConfig,
    textures: &'a TextureCache,
}

impl<'a> Tracer<'a> {
    pub fn new(
        world: &'a World,
        lights: &'a [Light],
        settings: &'a SceneSettings,
        config: &'a RenderConfig,
        textures: &'a TextureCache,
    ) -> Self {
        Self {
            world,
            lights,
            settings,
            config,
            textures,
        }
    }

    /// Radiance arriving along `ray`. `depth` counts bounces so far.
    pub fn trace<R: Rng + ?Sized>(&self, ray: &Ray, depth: u32, rng: &mut R) -> Color {
        if depth >= self.config.max_ray_depth {
            return Color::ZERO;
        }

        let mut rec = HitRecord::default();
        if !self
            .world
            .hit(ray, Interval::new(T_MIN, f64::INFINITY), &mut rec)
        {
            return self.settings.background();
        }

        let material = rec.material;
        let view_dir = -ray.direction;
        let shading_normal = self.shading_normal(&rec);

        // Nearly clear glass gets all of its color from the secondary rays
        let pure_glass = material.transparency >= self.config.pure_glass_threshold;
        let mut color = if pure_glass {
            Color::ZERO
        } else {
            self.shade(&rec, view_dir, shading_normal, ray.time, rng)
        };

        if material.reflectivity > 0.0 {
            let reflected = self.reflection(ray, &rec, shading_normal, depth, rng);
            color = color * (1.0 - material.reflectivity) + reflected * material.reflectivity;
        }

        if material.transparency > 0.0 {
            let transmitted = self.refraction(ray, &rec, depth, rng);
            if pure_glass {
                if let Transmission::Refracted(combined) = transmitted {
                    return combined;
                }
            }
            color = color * (1.0 - material.transparency)
                + transmitted.color() * material.transparency;
        }

        color + material.emission()
    }

    /// Direct lighting at a hit: ambient plus every light the point can see.
    fn shade<R: Rng + ?Sized>(
        &self,
        rec: &HitRecord<'_>,
        view_dir: Vec3,
        shading_normal: Vec3,
        time: f64,
        rng: &mut R,
    ) -> Color {
        let material = rec.material;
        let (base_color, ambient_color) = match self.texture_color(material, rec.u, rec.v) {
            Some(tex) => (tex * material.diffuse_color, tex * material.ambient_color),
            None => (material.diffuse_color, material.ambient_color),
        };

        let ambient = ambient_color * self.config.ambient_factor;
        let mut total_light = Color::ZERO;

        for light in self.lights {
            let shadow = self.compute_shadow(rec.p, light, time, rng);
            if shadow >= 1.0 {
                continue;
            }

            let (light_dir, dist) = light.incident(rec.p, light.location);
            let incoming = light.radiance(dist)
                * (light.falloff(light_dir) * self.config.light_intensity_factor * (1.0 - shadow));

            let n_dot_l = shading_normal.dot(light_dir);
            if n_dot_l > 0.0 {
                let brdf = material.eval(view_dir, light_dir, shading_normal, base_color);
                total_light += brdf * incoming * n_dot_l;
            }
        }

        ambient + total_light
    }

    /// Fraction of `light` blocked as seen from `point`, in [0, 1].
    ///
    /// Area lights are sampled on a jittered `n x n` grid. Each shadow ray
    /// marches through transparent occluders, losing their opacity at every
    /// crossing, and stops at the first opaque one.
    pub fn compute_shadow<R: Rng + ?Sized>(
        &self,
        point: Vec3,
        light: &Light,
        time: f64,
        rng: &mut R,
    ) -> f64 {
        if !self.config.enable_shadows || !light.cast_shadows {
            return 0.0;
        }

        let samples = if light.is_area() && self.config.shadow_samples > 0 {
            self.config.shadow_samples
        } else {
            light.sample_count()
        };
        let grid = ((samples as f64).sqrt() as u32).max(1);
        let eps = self.config.epsilon_at(point);

        let mut total = 0.0;
        let mut rays = 0;
        for i in 0..grid {
            for j in 0..grid {
                let u = (i as f64 + rng.gen::<f64>()) / grid as f64;
                let v = (j as f64 + rng.gen::<f64>()) / grid as f64;
                let sample = light.sample_point(u, v);
                let (dir, dist) = light.incident(point, sample);

                let mut transmittance = 1.0;
                let mut current_t = eps;
                while current_t < dist {
                    let step = Ray::new(point + dir * current_t, dir, time);
                    let mut rec = HitRecord::default();
                    rays += 1;
                    if !self
                        .world
                        .hit(&step, Interval::new(eps, dist - current_t), &mut rec)
                    {
                        break;
                    }

                    let transparency = rec.material.transparency;
                    if transparency > 0.0 {
                        transmittance *= transparency;
                        current_t += rec.t + eps;
                        if transmittance < MIN_TRANSMITTANCE {
                            break;
                        }
                    } else {
                        transmittance = 0.0;
                        break;
                    }
                }
                total += 1.0 - transmittance;
            }
        }
        self.world.stats().add_shadow_rays(rays);

        total / (grid * grid) as f64
    }

    /// Mirror or glossy reflection, tinted for metals.
    fn reflection<R: Rng + ?Sized>(
        &self,
        ray: &Ray,
        rec: &HitRecord<'_>,
        shading_normal: Vec3,
        depth: u32,
        rng: &mut R,
    ) -> Color {
        let material = rec.material;
        let mirror = reflect(ray.direction, shading_normal);
        let origin = rec.p + rec.normal * self.config.epsilon_at(rec.p);

        let samples = if self.config.glossy_samples > 1
            && material.glossiness < MIRROR_GLOSSINESS
            && depth < GLOSSY_MAX_DEPTH
        {
            self.config.glossy_samples
        } else {
            1
        };

        let mut reflected = if samples == 1 {
            self.world.stats().add_reflection_rays(1);
            self.trace(&Ray::new(origin, mirror, ray.time), depth + 1, rng)
        } else {
            // Power-cosine lobe around the mirror direction
            let w = mirror;
            let axis = if w.x.abs() > 0.1 { Vec3::Y } else { Vec3::X };
            let u = axis.cross(w).normalize_or_zero();
            let v = w.cross(u);
            let exponent = 10f64.powf(material.glossiness * 4.0);

            let mut sum = Color::ZERO;
            for _ in 0..samples {
                let cos_theta = rng.gen::<f64>().powf(1.0 / (exponent + 1.0));
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
                let phi = 2.0 * PI * rng.gen::<f64>();

                let mut dir = (u * (sin_theta * phi.cos())
                    + v * (sin_theta * phi.sin())
                    + w * cos_theta)
                    .normalize_or_zero();
                if dir.dot(rec.normal) < 0.0 {
                    dir = mirror;
                }
                sum += self.trace(&Ray::new(origin, dir, ray.time), depth + 1, rng);
            }
            self.world.stats().add_reflection_rays(samples as u64);
            sum / samples as f64
        };

        if material.is_metal() {
            let tint = match self.texture_color(material, rec.u, rec.v) {
                Some(tex) => tex * material.diffuse_color,
                None => material.diffuse_color,
            };
            reflected *= tint;
        }
        reflected
    }

    /// Fresnel-weighted refraction. The reflection branch is always traced;
    /// the transmitted branch only without total internal reflection.
    fn refraction<R: Rng + ?Sized>(
        &self,
        ray: &Ray,
        rec: &HitRecord<'_>,
        depth: u32,
        rng: &mut R,
    ) -> Transmission {
        let material = rec.material;
        let normal = rec.normal;
        let eta = if rec.front_face {
            1.0 / material.refractive_index
        } else {
            material.refractive_index
        };
        let eps = self.config.epsilon_at(rec.p);

        let cos_theta = ray.direction.dot(normal).abs();
        let fresnel = schlick(cos_theta, eta);

        let r_out_perp = (ray.direction + normal * cos_theta) * eta;
        let discriminant = 1.0 - r_out_perp.length_squared();

        let reflect_ray = Ray::new(
            rec.p + normal * eps,
            reflect(ray.direction, normal),
            ray.time,
        );
        let reflected = self.trace(&reflect_ray, depth + 1, rng);
        self.world.stats().add_reflection_rays(1);

        if discriminant < 0.0 {
            return Transmission::TotalInternalReflection(reflected);
        }

        let r_out_parallel = normal * -discriminant.sqrt();
        let refract_ray = Ray::new(rec.p - normal * eps, r_out_perp + r_out_parallel, ray.time);
        let refracted = self.trace(&refract_ray, depth + 1, rng);
        self.world.stats().add_refraction_rays(1);

        Transmission::Refracted(reflected * fresnel + refracted * (1.0 - fresnel))
    }

    /// Normal used for lighting: perturbed by a normal map or bump map when
    /// the material has one loaded, otherwise the geometric normal.
    fn shading_normal(&self, rec: &HitRecord<'_>) -> Vec3 {
        let material = rec.material;
        if let Some(path) = self.loaded(&material.normal_map) {
            let sample = self.textures.sample(path, rec.u, rec.v) * 2.0 - Vec3::ONE;
            let local = Vec3::new(
                sample.x * material.bump_strength,
                sample.y * material.bump_strength,
                sample.z,
            )
            .normalize_or_zero();
            return (rec.tangent * local.x + rec.bitangent * local.y + rec.normal * local.z)
                .try_normalize()
                .unwrap_or(rec.normal);
        }

        if let Some(path) = self.loaded(&material.bump_map) {
            let height = |u: f64, v: f64| luminance(self.textures.sample(path, u, v));
            let center = height(rec.u, rec.v);
            let du = (height(rec.u + BUMP_DELTA, rec.v) - center) / BUMP_DELTA;
            let dv = (height(rec.u, rec.v + BUMP_DELTA) - center) / BUMP_DELTA;
            let scale = BUMP_SCALE * material.bump_strength;
            return (rec.normal - rec.tangent * (du * scale) - rec.bitangent * (dv * scale))
                .try_normalize()
                .unwrap_or(rec.normal);
        }

        rec.normal
    }

    /// Diffuse texture color at (u, v), if the material has one loaded.
    fn texture_color(&self, material: &Material, u: f64, v: f64) -> Option<Color> {
        self.loaded(&material.texture)
            .map(|path| self.textures.sample(path, u, v))
    }

    /// The path, if textures are enabled and it is in the cache.
    fn loaded<'p>(&self, path: &'p Option<String>) -> Option<&'p str> {
        if !self.config.enable_textures {
            return None;
        }
        path.as_deref()
            .filter(|p| !p.is_empty() && self.textures.has_texture(p))
    }
}

/// Result of the transmission branch of a transparent hit.
enum Transmission {
    /// Fresnel blend of the reflected and refracted radiance
    Refracted(Color),
    /// Only the reflected radiance
    TotalInternalReflection(Color),
}

impl Transmission {
    fn color(&self) -> Color {
        match self {
            Transmission::Refracted(c) | Transmission::TotalInternalReflection(c) => *c,
        }
    }
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - normal * (2.0 * incident.dot(normal))
}

/// Schlick's approximation of the Fresnel reflectance.
fn schlick(cosine: f64, eta: f64) -> f64 {
    let r0 = ((eta - 1.0) / (eta + 1.0)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

/// Rec. 601 luma.
fn luminance(c: Color) -> f64 {
    0.299 * c.x + 0.587 * c.y + 0.114 * c.z
}
