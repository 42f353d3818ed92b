// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::integrator::{Integrator, IntegratorType};
use crate::core::scene::{MaterialId, Scene, SceneBuilder};
use crate::core::sensor::Camera;
use crate::emitters::envmap::EnvironmentEmitter;
use crate::integrators::ao::AoIntegrator;
use crate::integrators::bsdf::BsdfIntegrator;
use crate::integrators::path::PathIntegrator;
use crate::io::obj_utils::ObjLoadError;
use crate::materials::material::{Material, MaterialTextures};
use crate::math::constants::{Float, Vector3f, EPSILON};
use crate::math::spectrum::{black, white, RGBSpectrum};
use crate::math::transform::Transform;
use crate::sensors::perspective::PerspectiveCamera;
use crate::sensors::realistic::{LensInterface, RealisticCamera};
use crate::shapes::cube::create_cube;
use crate::shapes::rectangle::create_rectangle;
use crate::shapes::sphere::create_sphere;
use crate::shapes::triangle_mesh::TriangleMesh;
use crate::textures::image::{ImageTexture, TextureError};

#[derive(Debug)]
pub enum SceneLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
    Mesh(ObjLoadError),
    Texture(TextureError),
}

impl From<std::io::Error> for SceneLoadError {
    fn from(err: std::io::Error) -> Self {
        SceneLoadError::Io(err)
    }
}

impl From<ObjLoadError> for SceneLoadError {
    fn from(err: ObjLoadError) -> Self {
        SceneLoadError::Mesh(err)
    }
}

impl From<TextureError> for SceneLoadError {
    fn from(err: TextureError) -> Self {
        SceneLoadError::Texture(err)
    }
}

impl fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneLoadError::Io(err) => write!(f, "io error: {}", err),
            SceneLoadError::Parse(msg) => write!(f, "parse error: {}", msg),
            SceneLoadError::MissingField(field) => write!(f, "missing field: {}", field),
            SceneLoadError::Mesh(err) => write!(f, "mesh load failed: {}", err),
            SceneLoadError::Texture(err) => write!(f, "texture load failed: {}", err),
        }
    }
}

impl std::error::Error for SceneLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneLoadError::Io(err) => Some(err),
            SceneLoadError::Mesh(err) => Some(err),
            SceneLoadError::Texture(err) => Some(err),
            _ => None,
        }
    }
}

pub struct SceneLoadResult {
    pub scene: Scene,
    pub integrator: Option<Integrator>,
    pub samples_per_pixel: Option<u32>,
}

pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneLoadError> {
    let result = load_scene_with_settings(path)?;
    Ok(result.scene)
}

pub fn load_scene_with_settings<P: AsRef<Path>>(path: P) -> Result<SceneLoadResult, SceneLoadError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    log::info!("Loading scene {}.", path.display());
    parse_scene(&xml, base_dir)
}

/// Parses a scene description; relative asset paths resolve against
/// `base_dir`.
pub fn parse_scene(xml: &str, base_dir: &Path) -> Result<SceneLoadResult, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut parser = SceneParser::new(base_dir);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => parser.open(&e)?,
            Ok(Event::Empty(e)) => {
                parser.open(&e)?;
                parser.close(&element_name(&e))?;
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                parser.close(&name)?;
            }
            Err(e) => {
                return Err(SceneLoadError::Parse(format!("error at position {}: {}",
                                                         reader.buffer_position(), e)));
            }
            _ => {}
        }
        buf.clear();
    }

    parser.finish()
}

#[derive(Debug)]
struct SensorDesc {
    kind: String,
    fov: Float,
    near_clip: Float,
    far_clip: Float,
    aperture_radius: Float,
    focus_distance: Float,
    sensor_shift: Float,
    lookat: Option<(Vector3f, Vector3f, Vector3f)>,
    width: usize,
    height: usize,
    lenses: Vec<LensInterface>,
}

impl SensorDesc {
    fn new(kind: String) -> Self {
        Self {
            kind,
            fov: 45.0,
            near_clip: EPSILON,
            far_clip: 1e5,
            aperture_radius: 0.0,
            focus_distance: 1.0,
            sensor_shift: 0.0,
            lookat: None,
            width: 800,
            height: 800,
            lenses: Vec::new(),
        }
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), SceneLoadError> {
        match name {
            "fov" => self.fov = parse_float(value)?,
            "near_clip" => self.near_clip = parse_float(value)?,
            "far_clip" => self.far_clip = parse_float(value)?,
            "aperture_radius" => self.aperture_radius = parse_float(value)?,
            "focus_distance" => self.focus_distance = parse_float(value)?,
            "sensor_shift" => self.sensor_shift = parse_float(value)?,
            "width" => self.width = parse_usize(value)?,
            "height" => self.height = parse_usize(value)?,
            _ => log::warn!("Ignoring sensor parameter '{}'.", name),
        }
        Ok(())
    }

    fn build(self) -> Result<Camera, SceneLoadError> {
        let (origin, target, up) = self.lookat.ok_or(SceneLoadError::MissingField("sensor.lookat"))?;
        match self.kind.as_str() {
            "perspective" | "thinlens" => {
                let camera = PerspectiveCamera::new(&origin, &target, &up, self.fov,
                                                    self.width, self.height,
                                                    self.near_clip, self.far_clip);
                Ok(Camera::Perspective(camera.with_thin_lens(self.aperture_radius, self.focus_distance)))
            }
            "realistic" => Ok(Camera::Realistic(RealisticCamera::new(&origin, &target, &up,
                                                                      self.lenses,
                                                                      self.sensor_shift,
                                                                      self.width, self.height))),
            other => Err(SceneLoadError::Parse(format!("unsupported sensor type: {}", other))),
        }
    }
}

#[derive(Debug)]
struct BsdfDesc {
    id: Option<String>,
    diffuse: RGBSpectrum,
    emission: RGBSpectrum,
    specular: Float,
    specular_tint: Float,
    roughness: Float,
    ior: Float,
    textures: MaterialTextures,
}

impl BsdfDesc {
    fn new(id: Option<String>) -> Self {
        Self {
            id,
            diffuse: white(),
            emission: black(),
            specular: 0.0,
            specular_tint: 0.0,
            roughness: 0.3,
            ior: 1.33,
            textures: MaterialTextures::default(),
        }
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), SceneLoadError> {
        match name {
            "diffuse" | "reflectance" | "base_color" => self.diffuse = parse_spectrum(value)?,
            "emission" | "radiance" => self.emission = parse_spectrum(value)?,
            "specular" => self.specular = parse_float(value)?,
            "specular_tint" => self.specular_tint = parse_float(value)?,
            "roughness" => self.roughness = parse_float(value)?,
            "ior" | "int_ior" => self.ior = parse_float(value)?,
            _ => log::warn!("Ignoring bsdf parameter '{}'.", name),
        }
        Ok(())
    }

    fn set_texture(&mut self, name: &str, texture: ImageTexture) {
        match name {
            "diffuse" | "reflectance" | "base_color" => self.textures.diffuse = Some(texture),
            "specular" => self.textures.specular = Some(texture),
            "specular_tint" => self.textures.specular_tint = Some(texture),
            "roughness" => self.textures.roughness = Some(texture),
            "opacity" | "alpha" => self.textures.opacity = Some(texture),
            _ => log::warn!("Ignoring texture slot '{}'.", name),
        }
    }

    fn build(self) -> Material {
        Material::new(self.diffuse, self.emission, self.specular, self.specular_tint,
                      self.roughness, self.ior)
            .with_textures(self.textures)
    }
}

#[derive(Debug)]
struct TextureDesc {
    name: String,
    filename: Option<String>,
}

#[derive(Debug)]
struct ShapeDesc {
    kind: String,
    filename: Option<String>,
    stacks: usize,
    slices: usize,
    smooth: bool,
    center: Vector3f,
    radius: Float,
    to_world: Transform,
    material_ref: Option<String>,
    material: Option<Material>,
    emission: Option<RGBSpectrum>,
}

impl ShapeDesc {
    fn new(kind: String) -> Self {
        Self {
            kind,
            filename: None,
            stacks: 32,
            slices: 64,
            smooth: true,
            center: Vector3f::zeros(),
            radius: 1.0,
            to_world: Transform::default(),
            material_ref: None,
            material: None,
            emission: None,
        }
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), SceneLoadError> {
        match name {
            "filename" => self.filename = Some(value.to_string()),
            "stacks" => self.stacks = parse_usize(value)?,
            "slices" => self.slices = parse_usize(value)?,
            "smooth" | "face_normals" => {
                let flag = parse_bool(value)?;
                self.smooth = if name == "smooth" { flag } else { !flag };
            }
            "center" => self.center = parse_vec3(value)?,
            "radius" => self.radius = parse_float(value)?,
            _ => log::warn!("Ignoring shape parameter '{}'.", name),
        }
        Ok(())
    }

    /// Later transform elements apply after earlier ones.
    fn push_transform(&mut self, transform: Transform) {
        self.to_world = transform.compose(&self.to_world);
    }
}

#[derive(Debug)]
struct EmitterDesc {
    kind: String,
    filename: Option<String>,
    scale: Float,
    radiance: Option<RGBSpectrum>,
}

impl EmitterDesc {
    fn set(&mut self, name: &str, value: &str) -> Result<(), SceneLoadError> {
        match name {
            "filename" => self.filename = Some(value.to_string()),
            "scale" | "intensity" => self.scale = parse_float(value)?,
            "radiance" => self.radiance = Some(parse_spectrum(value)?),
            _ => log::warn!("Ignoring emitter parameter '{}'.", name),
        }
        Ok(())
    }
}

#[derive(Debug)]
struct IntegratorDesc {
    kind: IntegratorType,
    max_depth: usize,
    max_distance: Float,
    include_environment: bool,
    sample_count: Option<u32>,
}

impl IntegratorDesc {
    fn set(&mut self, name: &str, value: &str) -> Result<(), SceneLoadError> {
        match name {
            // Negative depths mean unlimited.
            "max_depth" => self.max_depth = parse_int(value)?.max(0) as usize,
            "max_distance" => self.max_distance = parse_float(value)?,
            "include_environment" => self.include_environment = parse_bool(value)?,
            "hide_emitters" => self.include_environment = !parse_bool(value)?,
            "sample_count" | "spp" => self.sample_count = Some(parse_int(value)?.max(1) as u32),
            _ => log::warn!("Ignoring integrator parameter '{}'.", name),
        }
        Ok(())
    }

    fn build(&self) -> Integrator {
        match self.kind {
            IntegratorType::Ao => Integrator::Ao(AoIntegrator::new(self.max_distance)),
            IntegratorType::Bsdf => Integrator::Bsdf(BsdfIntegrator {
                max_depth: self.max_depth,
                include_environment: self.include_environment,
            }),
            IntegratorType::Unidirectional => {
                if !self.include_environment {
                    log::warn!("The path integrator always shows emitters; ignoring hide_emitters.");
                }
                Integrator::Unidirectional(PathIntegrator::new(self.max_depth))
            }
        }
    }
}

struct SceneParser<'a> {
    base_dir: &'a Path,
    defaults: HashMap<String, String>,
    builder: SceneBuilder,
    materials: HashMap<String, (MaterialId, Material)>,
    default_material: Option<MaterialId>,
    sensor: Option<SensorDesc>,
    bsdf: Option<BsdfDesc>,
    texture: Option<TextureDesc>,
    shape: Option<ShapeDesc>,
    emitter: Option<EmitterDesc>,
    integrator: Option<IntegratorDesc>,
    result_integrator: Option<Integrator>,
    samples_per_pixel: Option<u32>,
}

impl<'a> SceneParser<'a> {
    fn new(base_dir: &'a Path) -> Self {
        Self {
            base_dir,
            defaults: HashMap::new(),
            builder: SceneBuilder::new(),
            materials: HashMap::new(),
            default_material: None,
            sensor: None,
            bsdf: None,
            texture: None,
            shape: None,
            emitter: None,
            integrator: None,
            result_integrator: None,
            samples_per_pixel: None,
        }
    }

    fn resolve_path(&self, filename: &str) -> PathBuf {
        let path = Path::new(filename);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn open(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let attrs = attributes(e, &self.defaults)?;
        let kind = attrs.get("type").cloned().unwrap_or_default();

        match element_name(e).as_str() {
            "default" => {
                if let (Some(k), Some(v)) = (attrs.get("name"), attrs.get("value")) {
                    self.defaults.insert(k.clone(), v.clone());
                }
            }
            "integrator" => {
                let kind = kind.parse::<IntegratorType>().map_err(SceneLoadError::Parse)?;
                self.integrator = Some(IntegratorDesc {
                    kind,
                    max_depth: 0,
                    max_distance: 1e5,
                    include_environment: true,
                    sample_count: None,
                });
            }
            "sensor" | "camera" => self.sensor = Some(SensorDesc::new(kind)),
            "lookat" => {
                if let Some(sensor) = self.sensor.as_mut() {
                    let origin = parse_vec3(attr(&attrs, "origin", "lookat.origin")?)?;
                    let target = parse_vec3(attr(&attrs, "target", "lookat.target")?)?;
                    let up = match attrs.get("up") {
                        Some(v) => parse_vec3(v)?,
                        None => Vector3f::new(0.0, 1.0, 0.0),
                    };
                    sensor.lookat = Some((origin, target, up));
                }
            }
            "lens" => {
                if let Some(sensor) = self.sensor.as_mut() {
                    let curvature = parse_float(attr(&attrs, "curvature", "lens.curvature")?)?;
                    let thickness = parse_float(attr(&attrs, "thickness", "lens.thickness")?)?;
                    let eta = match attrs.get("eta") {
                        Some(v) => parse_float(v)?,
                        None => 0.0,
                    };
                    let aperture = parse_float(attr(&attrs, "aperture", "lens.aperture")?)?;
                    sensor.lenses.push(LensInterface::new(curvature, thickness, eta, aperture));
                }
            }
            "translate" | "scale" | "rotate" => {
                if self.shape.is_some() {
                    let transform = parse_transform(element_name(e).as_str(), &attrs)?;
                    if let Some(shape) = self.shape.as_mut() {
                        shape.push_transform(transform);
                    }
                }
            }
            "bsdf" | "material" => self.bsdf = Some(BsdfDesc::new(attrs.get("id").cloned())),
            "texture" => {
                let name = attr(&attrs, "name", "texture.name")?.clone();
                self.texture = Some(TextureDesc { name, filename: attrs.get("filename").cloned() });
            }
            "shape" => self.shape = Some(ShapeDesc::new(kind)),
            "ref" => {
                if let Some(shape) = self.shape.as_mut() {
                    shape.material_ref = Some(attr(&attrs, "id", "ref.id")?.clone());
                }
            }
            "emitter" => {
                self.emitter = Some(EmitterDesc { kind, filename: None, scale: 1.0, radiance: None });
            }
            "float" | "integer" | "boolean" | "rgb" | "string" | "vector" | "point" | "spectrum" => {
                let name = attr(&attrs, "name", "parameter.name")?;
                let value = attr(&attrs, "value", "parameter.value")?;
                self.set_param(name, value)?;
            }
            "scene" | "transform" | "film" | "sampler" => {}
            other => log::debug!("Skipping element <{}>.", other),
        }
        Ok(())
    }

    /// Routes a parameter to the innermost open element.
    fn set_param(&mut self, name: &str, value: &str) -> Result<(), SceneLoadError> {
        if let Some(texture) = self.texture.as_mut() {
            if name == "filename" {
                texture.filename = Some(value.to_string());
            }
            Ok(())
        } else if let Some(bsdf) = self.bsdf.as_mut() {
            bsdf.set(name, value)
        } else if let Some(emitter) = self.emitter.as_mut() {
            emitter.set(name, value)
        } else if let Some(shape) = self.shape.as_mut() {
            shape.set(name, value)
        } else if let Some(sensor) = self.sensor.as_mut() {
            sensor.set(name, value)
        } else if let Some(integrator) = self.integrator.as_mut() {
            integrator.set(name, value)
        } else {
            log::warn!("Parameter '{}' outside of any element.", name);
            Ok(())
        }
    }

    fn close(&mut self, name: &str) -> Result<(), SceneLoadError> {
        match name {
            "integrator" => {
                if let Some(desc) = self.integrator.take() {
                    self.result_integrator = Some(desc.build());
                    self.samples_per_pixel = desc.sample_count;
                }
            }
            "sensor" | "camera" => {
                if let Some(desc) = self.sensor.take() {
                    let camera = desc.build()?;
                    self.builder.set_camera(camera);
                }
            }
            "texture" => {
                if let Some(desc) = self.texture.take() {
                    let filename = desc.filename.ok_or(SceneLoadError::MissingField("texture.filename"))?;
                    let path = self.resolve_path(&filename);
                    let colour = matches!(desc.name.as_str(), "diffuse" | "reflectance" | "base_color");
                    let texture = if colour {
                        ImageTexture::from_file(&path)?
                    } else {
                        ImageTexture::from_file_with_srgb(&path, false)?
                    };
                    match self.bsdf.as_mut() {
                        Some(bsdf) => bsdf.set_texture(&desc.name, texture),
                        None => log::warn!("Texture '{}' outside of a bsdf.", desc.name),
                    }
                }
            }
            "bsdf" | "material" => {
                if let Some(desc) = self.bsdf.take() {
                    let id = desc.id.clone();
                    let material = desc.build();
                    if let Some(shape) = self.shape.as_mut() {
                        shape.material = Some(material);
                    } else if let Some(id) = id {
                        let material_id = self.builder.add_material(material.clone());
                        self.materials.insert(id, (material_id, material));
                    } else {
                        log::warn!("Ignoring a bsdf without id outside of a shape.");
                    }
                }
            }
            "emitter" => {
                if let Some(desc) = self.emitter.take() {
                    if let Some(shape) = self.shape.as_mut() {
                        shape.emission = Some(desc.radiance.unwrap_or_else(white));
                    } else {
                        self.add_environment(desc)?;
                    }
                }
            }
            "shape" => {
                if let Some(desc) = self.shape.take() {
                    self.add_shape(desc)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn add_environment(&mut self, desc: EmitterDesc) -> Result<(), SceneLoadError> {
        let environment = match desc.kind.as_str() {
            "envmap" => {
                let filename = desc.filename.ok_or(SceneLoadError::MissingField("envmap.filename"))?;
                EnvironmentEmitter::from_file(&self.resolve_path(&filename), desc.scale)?
            }
            "constant" => {
                let c = desc.radiance.unwrap_or_else(white);
                EnvironmentEmitter::new(ImageTexture::from_rgb(c.x, c.y, c.z), desc.scale)
            }
            other => return Err(SceneLoadError::Parse(format!("unsupported emitter type: {}", other))),
        };
        self.builder.set_environment(environment);
        Ok(())
    }

    fn add_shape(&mut self, mut desc: ShapeDesc) -> Result<(), SceneLoadError> {
        let material_id = match (desc.material.take(), desc.material_ref.as_ref(), desc.emission) {
            (Some(inline), _, Some(radiance)) => self.builder.add_material(inline.with_emission(radiance)),
            (Some(inline), _, None) => self.builder.add_material(inline),
            (None, Some(id), emission) => {
                let (material_id, material) = self.materials.get(id)
                    .ok_or_else(|| SceneLoadError::Parse(format!("missing bsdf ref: {}", id)))?;
                match emission {
                    // Emission lives on the material, so emissive shapes get their own copy.
                    Some(radiance) => self.builder.add_material(material.clone().with_emission(radiance)),
                    None => *material_id,
                }
            }
            (None, None, Some(radiance)) => self.builder.add_material(Material::emissive(radiance)),
            (None, None, None) => self.default_material_id(),
        };
        self.finish_shape(desc, material_id)
    }

    fn default_material_id(&mut self) -> MaterialId {
        match self.default_material {
            Some(id) => id,
            None => {
                let id = self.builder.add_material(Material::default());
                self.default_material = Some(id);
                id
            }
        }
    }

    fn finish_shape(&mut self, desc: ShapeDesc, material: MaterialId) -> Result<(), SceneLoadError> {
        let mesh = match desc.kind.as_str() {
            "obj" => {
                let filename = desc.filename.as_ref().ok_or(SceneLoadError::MissingField("shape.filename"))?;
                let mut mesh = TriangleMesh::from_obj(self.resolve_path(filename), material)?;
                mesh.transform(&desc.to_world);
                mesh
            }
            "rectangle" => create_rectangle(&desc.to_world, material),
            "cube" => create_cube(&desc.to_world, material),
            "sphere" => {
                let local = Transform::translate(&desc.center)
                    .compose(&Transform::scale(&Vector3f::new(desc.radius, desc.radius, desc.radius)));
                create_sphere(&desc.to_world.compose(&local), desc.stacks, desc.slices, desc.smooth, material)
            }
            other => return Err(SceneLoadError::Parse(format!("unsupported shape type: {}", other))),
        };

        if mesh.num_triangles() == 0 {
            log::warn!("Shape '{}' produced no triangles.", desc.kind);
        }
        self.builder.add_mesh(mesh);
        Ok(())
    }

    fn finish(self) -> Result<SceneLoadResult, SceneLoadError> {
        Ok(SceneLoadResult {
            scene: self.builder.build(),
            integrator: self.result_integrator,
            samples_per_pixel: self.samples_per_pixel,
        })
    }
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart, defaults: &HashMap<String, String>) -> Result<HashMap<String, String>, SceneLoadError> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| SceneLoadError::Parse(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|err| SceneLoadError::Parse(err.to_string()))?;
        out.insert(key, resolve_value(&value, defaults));
    }
    Ok(out)
}

fn attr<'m>(attrs: &'m HashMap<String, String>,
            key: &str,
            field: &'static str) -> Result<&'m String, SceneLoadError> {
    attrs.get(key).ok_or(SceneLoadError::MissingField(field))
}

fn parse_transform(kind: &str, attrs: &HashMap<String, String>) -> Result<Transform, SceneLoadError> {
    let component = |key: &str, fallback: Float| -> Result<Float, SceneLoadError> {
        match attrs.get(key) {
            Some(v) => parse_float(v),
            None => Ok(fallback),
        }
    };

    match kind {
        "translate" => {
            if let Some(v) = attrs.get("value") {
                return Ok(Transform::translate(&parse_vec3(v)?));
            }
            Ok(Transform::translate(&Vector3f::new(component("x", 0.0)?, component("y", 0.0)?, component("z", 0.0)?)))
        }
        "scale" => {
            if let Some(v) = attrs.get("value") {
                let s = parse_vec3(v)?;
                return Ok(Transform::scale(&s));
            }
            Ok(Transform::scale(&Vector3f::new(component("x", 1.0)?, component("y", 1.0)?, component("z", 1.0)?)))
        }
        _ => {
            let axis = Vector3f::new(component("x", 0.0)?, component("y", 0.0)?, component("z", 0.0)?);
            if axis.norm() == 0.0 {
                return Err(SceneLoadError::Parse("rotate needs a non-zero axis".to_string()));
            }
            Ok(Transform::rotate(&axis, component("angle", 0.0)?))
        }
    }
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse::<Float>().map_err(|_| SceneLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_int(value: &str) -> Result<i64, SceneLoadError> {
    value.trim().parse::<i64>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_usize(value: &str) -> Result<usize, SceneLoadError> {
    value.trim().parse::<usize>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_bool(value: &str) -> Result<bool, SceneLoadError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(SceneLoadError::Parse(format!("invalid boolean: {}", other))),
    }
}

/// Three components separated by commas or whitespace, or one value for all.
fn parse_vec3(value: &str) -> Result<Vector3f, SceneLoadError> {
    let parts: Vec<&str> = value.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    match parts.as_slice() {
        [v] => {
            let v = parse_float(v)?;
            Ok(Vector3f::new(v, v, v))
        }
        [x, y, z] => Ok(Vector3f::new(parse_float(x)?, parse_float(y)?, parse_float(z)?)),
        _ => Err(SceneLoadError::Parse(format!("invalid vec3: {}", value))),
    }
}

fn parse_spectrum(value: &str) -> Result<RGBSpectrum, SceneLoadError> {
    parse_vec3(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::spectrum::rgb;

    const CORNELL_LIKE: &str = r#"
        <scene>
            <default name="spp" value="4"/>
            <integrator type="path">
                <integer name="max_depth" value="5"/>
                <integer name="sample_count" value="$spp"/>
            </integrator>
            <sensor type="perspective">
                <float name="fov" value="40"/>
                <transform name="to_world">
                    <lookat origin="0, 1, 4" target="0, 1, 0" up="0, 1, 0"/>
                </transform>
                <film type="hdrfilm">
                    <integer name="width" value="64"/>
                    <integer name="height" value="48"/>
                </film>
            </sensor>
            <bsdf type="principled" id="grey">
                <rgb name="diffuse" value="0.5, 0.5, 0.5"/>
                <float name="specular" value="0.2"/>
                <float name="roughness" value="0.4"/>
            </bsdf>
            <shape type="rectangle">
                <transform name="to_world">
                    <scale value="5"/>
                    <rotate x="1" angle="-90"/>
                </transform>
                <ref id="grey"/>
            </shape>
            <shape type="rectangle">
                <transform name="to_world">
                    <scale x="0.5" y="0.5"/>
                    <rotate x="1" angle="90"/>
                    <translate y="2"/>
                </transform>
                <emitter type="area">
                    <rgb name="radiance" value="10"/>
                </emitter>
            </shape>
            <shape type="cube">
                <ref id="grey"/>
                <transform name="to_world">
                    <scale value="0.3"/>
                    <translate x="0.5" y="0.3"/>
                </transform>
            </shape>
            <shape type="sphere">
                <float name="radius" value="0.25"/>
                <point name="center" value="-0.5, 0.25, 0"/>
                <integer name="stacks" value="8"/>
                <integer name="slices" value="16"/>
                <bsdf type="principled">
                    <rgb name="diffuse" value="0.9, 0.1, 0.1"/>
                </bsdf>
            </shape>
            <emitter type="constant">
                <rgb name="radiance" value="0.1"/>
            </emitter>
        </scene>
    "#;

    fn parse(xml: &str) -> Result<SceneLoadResult, SceneLoadError> {
        parse_scene(xml, Path::new("/nonexistent-glimmer-scene-dir"))
    }

    #[test]
    fn test_parse_full_scene() {
        let result = parse(CORNELL_LIKE).unwrap();
        let scene = &result.scene;

        assert_eq!(result.samples_per_pixel, Some(4));
        assert_eq!(result.integrator, Some(Integrator::Unidirectional(PathIntegrator::new(5))));
        assert_eq!(scene.camera().resolution(), (64, 48));
        assert_eq!(scene.meshes().len(), 4);
        // Area light plus the constant environment.
        assert_eq!(scene.emitters().len(), 2);
        assert!(scene.environment().is_some());

        let light = &scene.meshes()[1];
        assert!(scene.material(light.material()).is_emissive());
        assert_eq!(scene.material(light.material()).emission(), rgb(10.0, 10.0, 10.0));
        assert!((light.surface_area() - 1.0).abs() < 1e-4);
        let light_box = light.bounding_box();
        assert!((light_box.center().y - 2.0).abs() < 1e-4);

        // The floor and the cube share the referenced material.
        assert_eq!(scene.meshes()[0].material(), scene.meshes()[2].material());
        let cube_box = scene.meshes()[2].bounding_box();
        assert!((cube_box.center() - Vector3f::new(0.5, 0.3, 0.0)).norm() < 1e-3);

        let sphere_box = scene.meshes()[3].bounding_box();
        assert!((sphere_box.center() - Vector3f::new(-0.5, 0.25, 0.0)).norm() < 1e-3);
        assert_eq!(scene.meshes()[3].num_triangles(), 2 * 8 * 16 - 2 * 16);
    }

    #[test]
    fn test_realistic_camera_with_lens_stack() {
        let xml = r#"
            <scene>
                <sensor type="realistic">
                    <float name="sensor_shift" value="0.001"/>
                    <transform name="to_world"><lookat origin="0,0,1" target="0,0,0"/></transform>
                    <lens curvature="0.1" thickness="0.05" eta="1.5" aperture="0.01"/>
                    <lens curvature="-0.1" thickness="0.002" aperture="0.01"/>
                </sensor>
            </scene>"#;
        let scene = parse(xml).unwrap().scene;
        match scene.camera() {
            Camera::Realistic(camera) => {
                assert_eq!(camera.interfaces().len(), 2);
                assert_eq!(camera.interfaces()[1].eta, 0.0);
                assert_eq!(camera.resolution(), (800, 800));
            }
            other => panic!("unexpected camera {:?}", other),
        }
    }

    #[test]
    fn test_integrator_variants() {
        let ao = parse(r#"<scene><integrator type="ao"><float name="max_distance" value="2"/></integrator></scene>"#)
            .unwrap();
        assert_eq!(ao.integrator, Some(Integrator::Ao(AoIntegrator::new(2.0))));

        let bsdf = parse(r#"<scene><integrator type="bsdf">
                                <integer name="max_depth" value="-1"/>
                                <boolean name="hide_emitters" value="true"/>
                            </integrator></scene>"#).unwrap();
        assert_eq!(bsdf.integrator,
                   Some(Integrator::Bsdf(BsdfIntegrator { max_depth: 0, include_environment: false })));

        let path = parse(r#"<scene><integrator type="path">
                                <integer name="max_depth" value="6"/>
                                <boolean name="hide_emitters" value="true"/>
                            </integrator></scene>"#).unwrap();
        assert_eq!(path.integrator, Some(Integrator::Unidirectional(PathIntegrator::new(6))));

        assert!(matches!(parse(r#"<scene><integrator type="photon"/></scene>"#),
                         Err(SceneLoadError::Parse(_))));
        assert!(parse("<scene/>").unwrap().integrator.is_none());
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(parse(r#"<scene><shape type="cube"><ref id="nope"/></shape></scene>"#),
                         Err(SceneLoadError::Parse(_))));
        assert!(matches!(parse(r#"<scene><sensor type="perspective"/></scene>"#),
                         Err(SceneLoadError::MissingField("sensor.lookat"))));
        assert!(matches!(parse(r#"<scene><shape type="obj"/></scene>"#),
                         Err(SceneLoadError::MissingField("shape.filename"))));
        assert!(matches!(parse(r#"<scene><shape type="obj"><string name="filename" value="missing.obj"/></shape></scene>"#),
                         Err(SceneLoadError::Mesh(ObjLoadError::Io(_)))));
        assert!(matches!(parse(r#"<scene><emitter type="envmap"><string name="filename" value="sky.exr"/></emitter></scene>"#),
                         Err(SceneLoadError::Texture(_))));
        assert!(matches!(parse(r#"<scene><bsdf id="a"><float name="roughness" value="rough"/></bsdf></scene>"#),
                         Err(SceneLoadError::Parse(_))));
        assert!(matches!(parse(r#"<scene><shape type="torus"/></scene>"#),
                         Err(SceneLoadError::Parse(_))));
        assert!(matches!(load_scene("/nonexistent-glimmer-scene-dir/scene.xml"),
                         Err(SceneLoadError::Io(_))));
    }

    #[test]
    fn test_obj_path_is_relative_to_scene_file() {
        let dir = std::env::temp_dir().join(format!("glimmer-loader-{}", std::process::id()));
        fs::create_dir_all(dir.join("meshes")).unwrap();
        fs::write(dir.join("meshes").join("quad.obj"),
                  "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        fs::write(dir.join("scene.xml"),
                  r#"<scene>
                       <shape type="obj">
                         <string name="filename" value="meshes/quad.obj"/>
                         <transform name="to_world"><translate z="-2"/></transform>
                       </shape>
                     </scene>"#).unwrap();

        let scene = load_scene(dir.join("scene.xml")).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(scene.num_triangles(), 2);
        assert!((scene.bounds().center().z + 2.0).abs() < 1e-3);
        assert_eq!(scene.materials().len(), 1);
    }

    #[test]
    fn test_parse_vec3_forms() {
        assert_eq!(parse_vec3("1, 2, 3").unwrap(), Vector3f::new(1.0, 2.0, 3.0));
        assert_eq!(parse_vec3("1 2 3").unwrap(), Vector3f::new(1.0, 2.0, 3.0));
        assert_eq!(parse_vec3("0.5").unwrap(), Vector3f::new(0.5, 0.5, 0.5));
        assert!(parse_vec3("1, 2").is_err());
    }
}
