//! Scene text format parser.
//!
//! The format is line oriented. A file is a sequence of sections:
//!
//! ```text
//! SCENE_SETTINGS
//! background_color 0.05 0.05 0.05
//! CAMERAS 1
//! name Camera
//! location 0 -10 2
//! gaze 0 1 0
//! up 0 0 1
//! focal 50
//! sensor 36 24
//! resolution 640 480
//! LIGHTS 1
//! name Key
//! location 4 -4 6
//! intensity 1000
//! color 1 1 1
//! light_type POINT
//! SPHERES 1
//! name Ball
//! location 0 0 1
//! rotation 0 0 0
//! scale 1 1 1
//! visible 1
//! material_diffuse 0.8 0.1 0.1
//! ```
//!
//! Every entity starts with a `name` line and a fixed run of positional
//! lines (keyword, then numbers; the keyword itself is not checked). After
//! that come optional keyword lines in any order. The first line whose
//! keyword is not recognised ends the entity and is re-read by the caller.
//! Blank lines and `#` comments are ignored.

use std::collections::VecDeque;
use std::path::Path;

use prism_math::{Mat4, Mat4Ext, Transform, Vec3};
use thiserror::Error;

use crate::{
    AreaShape, Light, LightKind, Material, Motion, Primitive, Scene, SceneCamera, SceneSettings,
    Shape,
};

/// Errors that can occur while reading a scene file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unexpected end of file while reading {0}")]
    UnexpectedEof(String),

    #[error("Invalid number '{value}' at line {line}")]
    InvalidNumber { line: usize, value: String },

    #[error("Unknown section '{name}' at line {line}")]
    UnknownSection { line: usize, name: String },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Shape sections, in the order scene exports write them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShapeSection {
    Spheres,
    Cubes,
    Planes,
    Toruses,
    Cylinders,
    Cones,
}

impl ShapeSection {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "SPHERES" => Some(Self::Spheres),
            "CUBES" => Some(Self::Cubes),
            "PLANES" => Some(Self::Planes),
            "TORUSES" => Some(Self::Toruses),
            "CYLINDERS" => Some(Self::Cylinders),
            "CONES" => Some(Self::Cones),
            _ => None,
        }
    }
}

/// Section headers are upper case; setting keys never are. Unknown headers
/// still count so the top-level loop can reject them.
fn is_section_header(keyword: &str) -> bool {
    keyword.chars().any(|c| c.is_ascii_uppercase())
        && keyword
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Load and parse a scene file.
pub fn load_scene(path: impl AsRef<Path>) -> ParseResult<Scene> {
    let path = path.as_ref();
    log::info!("Loading scene: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_scene(&content)
}

/// Parse scene text.
pub fn parse_scene(content: &str) -> ParseResult<Scene> {
    let scene = SceneParser::new(content).parse()?;
    log::info!("Scene loaded: {}", scene.summary());
    Ok(scene)
}

/// Split a trimmed line into its keyword and the remainder.
fn split_keyword(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    }
}

fn parse_number<T: std::str::FromStr>(token: &str, line: usize) -> ParseResult<T> {
    token.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        value: token.to_string(),
    })
}

/// Parse exactly the first `N` whitespace-separated floats of `text`.
fn parse_floats<const N: usize>(text: &str, line: usize, context: &str) -> ParseResult<[f64; N]> {
    let mut values = [0.0; N];
    let mut tokens = text.split_whitespace();
    for value in values.iter_mut() {
        let token = tokens.next().ok_or_else(|| ParseError::Parse {
            line,
            message: format!("{} expects {} numbers", context, N),
        })?;
        *value = parse_number(token, line)?;
    }
    Ok(values)
}

fn parse_vec3(text: &str, line: usize, context: &str) -> ParseResult<Vec3> {
    parse_floats::<3>(text, line, context).map(Vec3::from_array)
}

fn parse_f64(text: &str, line: usize, context: &str) -> ParseResult<f64> {
    parse_floats::<1>(text, line, context).map(|[v]| v)
}

fn parse_flag(text: &str, line: usize) -> ParseResult<bool> {
    let token = text.split_whitespace().next().unwrap_or_default();
    Ok(parse_number::<i64>(token, line)? != 0)
}

fn parse_count(text: &str, line: usize) -> ParseResult<usize> {
    let token = text.split_whitespace().next().unwrap_or_default();
    parse_number(token, line)
}

/// Raw positional and optional fields of a shape before it is assembled.
struct ShapeFields {
    name: String,
    location: Vec3,
    rotation: Vec3,
    scale: Vec3,
    visible: bool,
    motion_blur: bool,
    matrix_t0: Option<Mat4>,
    matrix_t1: Option<Mat4>,
    material: Material,
}

struct SceneParser {
    lines: VecDeque<(usize, String)>,
}

impl SceneParser {
    fn new(content: &str) -> Self {
        let lines = content
            .lines()
            .enumerate()
            .map(|(i, s)| (i + 1, s.trim().to_string()))
            .filter(|(_, s)| !s.is_empty() && !s.starts_with('#'))
            .collect();
        Self { lines }
    }

    fn parse(mut self) -> ParseResult<Scene> {
        let mut scene = Scene::new();

        while let Some((line_no, line)) = self.lines.pop_front() {
            let (keyword, rest) = split_keyword(&line);
            match keyword {
                "SCENE_SETTINGS" => self.parse_settings(&mut scene.settings)?,
                "CAMERAS" => {
                    let count = parse_count(rest, line_no)?;
                    log::info!("Loading {} cameras", count);
                    for _ in 0..count {
                        let camera = self.parse_camera()?;
                        log::debug!(
                            "Camera '{}': focal {} mm, sensor {}x{} mm, {}x{} px",
                            camera.name,
                            camera.focal_length,
                            camera.sensor_width,
                            camera.sensor_height,
                            camera.resolution_x,
                            camera.resolution_y
                        );
                        scene.cameras.push(camera);
                    }
                }
                "LIGHTS" => {
                    let count = parse_count(rest, line_no)?;
                    log::info!("Loading {} lights", count);
                    for _ in 0..count {
                        let light = self.parse_light()?;
                        log::debug!(
                            "Light '{}': {:?} at {:?}, intensity {}",
                            light.name,
                            light.kind,
                            light.location,
                            light.intensity
                        );
                        scene.lights.push(light);
                    }
                }
                other => match ShapeSection::from_keyword(other) {
                    Some(section) => {
                        let count = parse_count(rest, line_no)?;
                        log::debug!("Loading {} {}", count, other.to_lowercase());
                        for _ in 0..count {
                            let primitive = self.parse_shape(section)?;
                            scene.primitives.push(primitive);
                        }
                    }
                    None => {
                        return Err(ParseError::UnknownSection {
                            line: line_no,
                            name: other.to_string(),
                        })
                    }
                },
            }
        }

        Ok(scene)
    }

    fn next_line(&mut self, context: &str) -> ParseResult<(usize, String)> {
        self.lines
            .pop_front()
            .ok_or_else(|| ParseError::UnexpectedEof(context.to_string()))
    }

    /// Keyword of the next line without consuming it.
    fn peek_keyword(&self) -> Option<&str> {
        self.lines.front().map(|(_, line)| split_keyword(line).0)
    }

    /// Pop the next line if its keyword is one of `accepted`.
    fn next_optional(&mut self, accepted: &[&str]) -> Option<(usize, String)> {
        let keyword = self.peek_keyword()?;
        if accepted.contains(&keyword) {
            self.lines.pop_front()
        } else {
            None
        }
    }

    /// Positional `<keyword> x y z` line.
    fn positional_vec3(&mut self, context: &str) -> ParseResult<Vec3> {
        let (line_no, line) = self.next_line(context)?;
        parse_vec3(split_keyword(&line).1, line_no, context)
    }

    /// Positional `<keyword> value` line.
    fn positional_f64(&mut self, context: &str) -> ParseResult<f64> {
        let (line_no, line) = self.next_line(context)?;
        parse_f64(split_keyword(&line).1, line_no, context)
    }

    fn parse_name(&mut self, context: &str) -> ParseResult<String> {
        let (_, line) = self.next_line(context)?;
        Ok(split_keyword(&line).1.to_string())
    }

    /// Four row-major matrix rows.
    fn parse_matrix(&mut self, context: &str) -> ParseResult<Mat4> {
        let mut rows = [[0.0; 4]; 4];
        for row in rows.iter_mut() {
            let (line_no, line) = self.next_line(context)?;
            *row = parse_floats::<4>(&line, line_no, context)?;
        }
        Ok(Mat4::from_rows(rows))
    }

    fn parse_settings(&mut self, settings: &mut SceneSettings) -> ParseResult<()> {
        while let Some(keyword) = self.peek_keyword() {
            if is_section_header(keyword) {
                break;
            }
            let (line_no, line) = self.next_line("scene settings")?;
            let (key, rest) = split_keyword(&line);
            match key {
                "background_color" => settings.background_color = parse_vec3(rest, line_no, key)?,
                "background_strength" => {
                    settings.background_strength = parse_f64(rest, line_no, key)?
                }
                "ambient_light" => settings.ambient_light = parse_vec3(rest, line_no, key)?,
                "frame_current" => settings.frame_current = parse_number(rest, line_no)?,
                "frame_start" => settings.frame_start = parse_number(rest, line_no)?,
                "frame_end" => settings.frame_end = parse_number(rest, line_no)?,
                "fps" => settings.fps = parse_number(rest, line_no)?,
                "max_bounces" => settings.max_bounces = parse_number(rest, line_no)?,
                "diffuse_bounces" => settings.diffuse_bounces = parse_number(rest, line_no)?,
                "glossy_bounces" => settings.glossy_bounces = parse_number(rest, line_no)?,
                "transmission_bounces" => {
                    settings.transmission_bounces = parse_number(rest, line_no)?
                }
                other => log::warn!("Ignoring unknown scene setting '{}' at line {}", other, line_no),
            }
        }
        Ok(())
    }

    fn parse_camera(&mut self) -> ParseResult<SceneCamera> {
        let mut camera = SceneCamera {
            name: self.parse_name("camera name")?,
            location: self.positional_vec3("camera location")?,
            gaze: self.positional_vec3("camera gaze")?,
            up: self.positional_vec3("camera up")?,
            focal_length: self.positional_f64("camera focal length")?,
            ..SceneCamera::default()
        };

        let (line_no, line) = self.next_line("camera sensor")?;
        [camera.sensor_width, camera.sensor_height] =
            parse_floats::<2>(split_keyword(&line).1, line_no, "camera sensor")?;

        let (line_no, line) = self.next_line("camera resolution")?;
        let mut tokens = split_keyword(&line).1.split_whitespace();
        camera.resolution_x = parse_number(tokens.next().unwrap_or_default(), line_no)?;
        camera.resolution_y = parse_number(tokens.next().unwrap_or_default(), line_no)?;

        const OPTIONAL: &[&str] = &[
            "dof_enabled",
            "focus_distance",
            "aperture_fstop",
            "aperture_blades",
            "camera_type",
            "clip_start",
            "clip_end",
        ];
        while let Some((line_no, line)) = self.next_optional(OPTIONAL) {
            let (key, rest) = split_keyword(&line);
            match key {
                "dof_enabled" => camera.dof_enabled = parse_flag(rest, line_no)?,
                "focus_distance" => camera.focus_distance = parse_f64(rest, line_no, key)?,
                "aperture_fstop" => camera.aperture_fstop = parse_f64(rest, line_no, key)?,
                "aperture_blades" => camera.aperture_blades = parse_number(rest, line_no)?,
                "camera_type" => camera.camera_type = rest.to_string(),
                "clip_start" => camera.clip_start = parse_f64(rest, line_no, key)?,
                _ => camera.clip_end = parse_f64(rest, line_no, key)?,
            }
        }

        Ok(camera)
    }

    fn parse_light(&mut self) -> ParseResult<Light> {
        let name = self.parse_name("light name")?;
        let location = self.positional_vec3("light location")?;
        let intensity = self.positional_f64("light intensity")?;
        let color = self.positional_vec3("light color")?;

        let mut light_type = "POINT".to_string();
        let mut spot_size = std::f64::consts::FRAC_PI_4;
        let mut spot_blend = 0.15;
        let mut area_shape = AreaShape::Square;
        let mut area_size = [1.0, 1.0];
        let mut direction = Vec3::NEG_Z;
        let mut angle = 0.0;
        let mut cast_shadows = true;
        let mut samples = 16;
        let mut normal = Vec3::NEG_Z;

        const OPTIONAL: &[&str] = &[
            "light_type",
            "spot_size",
            "spot_blend",
            "area_shape",
            "area_size",
            "direction",
            "angle",
            "cast_shadows",
            "shadow_soft_size",
            "samples",
            "normal",
        ];
        while let Some((line_no, line)) = self.next_optional(OPTIONAL) {
            let (key, rest) = split_keyword(&line);
            match key {
                "light_type" => light_type = rest.to_string(),
                "spot_size" => spot_size = parse_f64(rest, line_no, key)?,
                "spot_blend" => spot_blend = parse_f64(rest, line_no, key)?,
                "area_shape" => {
                    area_shape = AreaShape::from_keyword(rest).unwrap_or_else(|| {
                        log::warn!("Unknown area shape '{}' at line {}, using SQUARE", rest, line_no);
                        AreaShape::Square
                    })
                }
                "area_size" => area_size = parse_floats::<2>(rest, line_no, key)?,
                "direction" => direction = parse_vec3(rest, line_no, key)?,
                "angle" => angle = parse_f64(rest, line_no, key)?,
                "cast_shadows" => cast_shadows = parse_flag(rest, line_no)?,
                // Soft shadows come from area light sampling instead
                "shadow_soft_size" => {}
                "samples" => samples = parse_number(rest, line_no)?,
                _ => normal = parse_vec3(rest, line_no, key)?,
            }
        }

        let kind = match light_type.as_str() {
            "POINT" => LightKind::Point,
            "SPOT" => LightKind::Spot {
                direction,
                size: spot_size,
                blend: spot_blend,
            },
            "SUN" => LightKind::Sun { direction, angle },
            "AREA" => LightKind::Area {
                shape: area_shape,
                size_x: area_size[0],
                size_y: area_size[1],
                samples,
                normal,
            },
            other => {
                log::warn!("Unknown light type '{}' for '{}', using POINT", other, name);
                LightKind::Point
            }
        };

        Ok(Light {
            name,
            location,
            intensity,
            color,
            cast_shadows,
            kind,
        })
    }

    fn parse_shape(&mut self, section: ShapeSection) -> ParseResult<Primitive> {
        let name = self.parse_name("shape name")?;
        let mut fields = ShapeFields {
            name,
            location: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            visible: true,
            motion_blur: false,
            matrix_t0: None,
            matrix_t1: None,
            material: Material::default(),
        };

        let shape = match section {
            ShapeSection::Planes => {
                let (line_no, line) = self.next_line("plane points")?;
                let count = parse_count(split_keyword(&line).1, line_no)?;
                let mut points = Vec::with_capacity(count);
                for _ in 0..count {
                    let (line_no, line) = self.next_line("plane point")?;
                    points.push(parse_vec3(&line, line_no, "plane point")?);
                }
                if points.len() < 3 {
                    log::warn!(
                        "Plane '{}' has {} points and will never be hit",
                        fields.name,
                        points.len()
                    );
                }
                Shape::Plane { points }
            }
            _ => {
                fields.location = self.positional_vec3("shape location")?;
                fields.rotation = self.positional_vec3("shape rotation")?;
                fields.scale = self.positional_vec3("shape scale")?;
                match section {
                    ShapeSection::Spheres => Shape::Sphere,
                    ShapeSection::Cubes => Shape::Cube {
                        uv_scale: fields.scale,
                    },
                    ShapeSection::Toruses => Shape::Torus {
                        major_radius: self.positional_f64("torus major radius")?,
                        minor_radius: self.positional_f64("torus minor radius")?,
                    },
                    ShapeSection::Cylinders => Shape::Cylinder {
                        radius: self.positional_f64("cylinder radius")?,
                        depth: self.positional_f64("cylinder depth")?,
                    },
                    _ => Shape::Cone {
                        radius: self.positional_f64("cone radius")?,
                        depth: self.positional_f64("cone depth")?,
                    },
                }
            }
        };

        self.parse_shape_options(&mut fields)?;

        let transform = match shape {
            Shape::Plane { .. } => Transform::identity(),
            _ => Transform::from_trs(fields.location, fields.rotation, fields.scale),
        };
        if !transform.is_invertible() {
            log::warn!("Shape '{}' has a singular transform and will never be hit", fields.name);
        }

        let mut primitive = Primitive::new(fields.name, shape, transform)
            .with_material(fields.material)
            .with_visible(fields.visible);

        if fields.motion_blur {
            match (fields.matrix_t0, fields.matrix_t1) {
                (Some(start), Some(end)) => primitive = primitive.with_motion(Motion::new(start, end)),
                _ => log::warn!(
                    "Shape '{}' enables motion blur without both matrices; ignoring motion",
                    primitive.name
                ),
            }
        }

        Ok(primitive)
    }

    /// Visibility, motion and material lines, in any order.
    fn parse_shape_options(&mut self, fields: &mut ShapeFields) -> ParseResult<()> {
        while let Some(keyword) = self.peek_keyword() {
            let is_option = matches!(keyword, "visible" | "motion_blur" | "matrix_t0" | "matrix_t1");
            if !is_option && !keyword.starts_with("material_") {
                break;
            }
            let (line_no, line) = self.next_line("shape options")?;
            let (key, rest) = split_keyword(&line);
            match key {
                "visible" => fields.visible = parse_flag(rest, line_no)?,
                "motion_blur" => fields.motion_blur = parse_flag(rest, line_no)?,
                "matrix_t0" => fields.matrix_t0 = Some(self.parse_matrix("matrix_t0")?),
                "matrix_t1" => fields.matrix_t1 = Some(self.parse_matrix("matrix_t1")?),
                _ => parse_material_line(&mut fields.material, key, rest, line_no)?,
            }
        }
        Ok(())
    }
}

fn parse_material_line(
    material: &mut Material,
    key: &str,
    rest: &str,
    line_no: usize,
) -> ParseResult<()> {
    let path = || (!rest.is_empty()).then(|| rest.to_string());
    match key {
        "material_diffuse" => material.diffuse_color = parse_vec3(rest, line_no, key)?,
        "material_specular" => material.specular_color = parse_vec3(rest, line_no, key)?,
        "material_ambient" => material.ambient_color = parse_vec3(rest, line_no, key)?,
        "material_shininess" => material.shininess = parse_f64(rest, line_no, key)?,
        "material_glossiness" => material.glossiness = parse_f64(rest, line_no, key)?,
        "material_reflectivity" => material.reflectivity = parse_f64(rest, line_no, key)?,
        "material_transparency" => material.transparency = parse_f64(rest, line_no, key)?,
        "material_refractive_index" => material.refractive_index = parse_f64(rest, line_no, key)?,
        "material_texture" => material.texture = path(),
        "material_normal_map" => material.normal_map = path(),
        "material_bump_map" => material.bump_map = path(),
        "material_bump_strength" => material.bump_strength = parse_f64(rest, line_no, key)?,
        "material_emission" => material.emission_color = parse_vec3(rest, line_no, key)?,
        "material_emission_strength" => {
            material.emission_strength = parse_f64(rest, line_no, key)?
        }
        // Exported for other renderers; not part of this shading model
        "material_subsurface" | "material_sheen" | "material_clearcoat"
        | "material_clearcoat_roughness" => {}
        other => {
            return Err(ParseError::Parse {
                line: line_no,
                message: format!("unknown material property '{}'", other),
            })
        }
    }
    Ok(())
}
