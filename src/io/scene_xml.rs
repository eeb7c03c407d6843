// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quick_xml::events::{ BytesStart, Event };
use quick_xml::Reader;

use super::format_registry::{ ImportError, IoSettings, SceneReader };
use super::obj_utils;
use crate::core::layer_element::{ LayerElement, MappingMode, ReferenceMode };
use crate::core::mesh::{ LayerKind, Mesh };
use crate::core::node::{ Camera, Light, Node, NodeAttribute };
use crate::core::scene::{ FormatVersion, Scene, FORMAT_VERSION };
use crate::math::constants::{ Float, Vector3f, Vector4f };
use crate::math::vector::vec4;

pub struct XmlSceneReader;

impl SceneReader for XmlSceneReader {
    fn description(&self) -> &str {
        "Tangent scene XML"
    }

    fn extension(&self) -> &str {
        "xml"
    }

    fn read(&self, path: &Path, settings: &IoSettings) -> Result<Scene, ImportError> {
        load_scene(path, settings)
    }
}

pub fn load_scene<P: AsRef<Path>>(path: P, settings: &IoSettings) -> Result<Scene, ImportError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_scene(&xml, base_dir, settings)
}

pub fn parse_scene(xml: &str, base_dir: &Path, settings: &IoSettings) -> Result<Scene, ImportError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut parser = SceneParser::new(base_dir, settings);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => parser.open(&e)?,
            Ok(Event::Empty(e)) => {
                parser.open(&e)?;
                parser.close(e.name().as_ref())?;
            }
            Ok(Event::End(e)) => parser.close(e.name().as_ref())?,
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| ImportError::Parse(e.to_string()))?;
                parser.text.push_str(&text);
                parser.text.push(' ');
            }
            Err(e) => {
                return Err(ImportError::Parse(e.to_string()));
            }
            _ => {}
        }

        buf.clear();
    }

    parser.finish()
}

struct SceneParser<'a> {
    base_dir: &'a Path,
    settings: &'a IoSettings,
    defaults: HashMap<String, String>,
    header: Option<(FormatVersion, Option<String>)>,
    stack: Vec<Node>,
    root: Option<Node>,
    in_transform: bool,
    mesh: Option<Mesh>,
    layer: Option<(LayerKind, LayerElement)>,
    polygon_sizes: Option<Vec<usize>>,
    text: String,
}

impl<'a> SceneParser<'a> {
    fn new(base_dir: &'a Path, settings: &'a IoSettings) -> Self {
        Self {
            base_dir,
            settings,
            defaults: HashMap::new(),
            header: None,
            stack: Vec::new(),
            root: None,
            in_transform: false,
            mesh: None,
            layer: None,
            polygon_sizes: None,
            text: String::new(),
        }
    }

    fn current_node(&mut self) -> Result<&mut Node, ImportError> {
        self.stack.last_mut()
            .ok_or_else(|| ImportError::Parse("attribute outside of a node".to_string()))
    }

    fn open(&mut self, e: &BytesStart) -> Result<(), ImportError> {
        let attrs = attributes(e, &self.defaults)?;
        match e.name().as_ref() {
            b"scene" => {
                let version = match attrs.get("version") {
                    Some(v) => v.parse::<FormatVersion>().map_err(ImportError::Parse)?,
                    None => FORMAT_VERSION,
                };
                if !version.is_readable_by(&FORMAT_VERSION) {
                    return Err(ImportError::InvalidVersion { file: version, supported: FORMAT_VERSION });
                }
                let password = attrs.get("password").cloned();
                if let Some(expected) = &password {
                    if self.settings.password.as_deref() != Some(expected.as_str()) {
                        return Err(ImportError::Password);
                    }
                }
                self.header = Some((version, password));
            }
            b"default" => {
                if let (Some(k), Some(v)) = (attrs.get("name"), attrs.get("value")) {
                    self.defaults.insert(k.clone(), v.clone());
                }
            }
            b"node" => {
                let name = attrs.get("name").cloned().unwrap_or_default();
                self.stack.push(Node::new(name));
            }
            b"transform" => {
                self.in_transform = true;
            }
            b"translate" | b"rotate" | b"scale" => {
                if self.in_transform {
                    let is_scale = e.name().as_ref() == b"scale";
                    let fallback = if is_scale { 1.0 } else { 0.0 };
                    let v = match attrs.get("value") {
                        Some(u) => {
                            let u = parse_float(u)?;
                            Vector3f::new(u, u, u)
                        }
                        None => Vector3f::new(
                            attrs.get("x").map(|s| parse_float(s)).transpose()?.unwrap_or(fallback),
                            attrs.get("y").map(|s| parse_float(s)).transpose()?.unwrap_or(fallback),
                            attrs.get("z").map(|s| parse_float(s)).transpose()?.unwrap_or(fallback),
                        ),
                    };
                    let transform = &mut self.current_node()?.transform;
                    match e.name().as_ref() {
                        b"translate" => transform.translate += v,
                        b"rotate" => transform.rotate += v,
                        _ => transform.scale = transform.scale.component_mul(&v),
                    }
                }
            }
            b"null" => {
                self.current_node()?.attribute = Some(NodeAttribute::Null);
            }
            b"light" => {
                let mut light = Light::default();
                if let Some(t) = attrs.get("type") {
                    light.light_type = t.clone();
                }
                if let Some(c) = attrs.get("color") {
                    light.color = parse_vec3(c)?;
                }
                if let Some(i) = attrs.get("intensity") {
                    light.intensity = parse_float(i)?;
                }
                self.current_node()?.attribute = Some(NodeAttribute::Light(light));
            }
            b"camera" => {
                let mut camera = Camera::default();
                if let Some(v) = attrs.get("fov") {
                    camera.fov = parse_float(v)?;
                }
                if let Some(v) = attrs.get("near") {
                    camera.near_clip = parse_float(v)?;
                }
                if let Some(v) = attrs.get("far") {
                    camera.far_clip = parse_float(v)?;
                }
                self.current_node()?.attribute = Some(NodeAttribute::Camera(camera));
            }
            b"mesh" => {
                match attrs.get("filename") {
                    Some(filename) => {
                        let filename = if Path::new(filename).is_absolute() {
                            Path::new(filename).to_path_buf()
                        } else {
                            self.base_dir.join(filename)
                        };
                        let mesh = obj_utils::load_mesh_from_file(&filename)?;
                        self.current_node()?.attribute = Some(NodeAttribute::Mesh(mesh));
                    }
                    None => {
                        self.current_node()?;
                        self.mesh = Some(Mesh::default());
                    }
                }
            }
            b"points" | b"values" | b"indices" => {
                self.text.clear();
            }
            b"polygons" => {
                let sizes = attrs.get("sizes").ok_or(ImportError::MissingField("polygons.sizes"))?;
                self.polygon_sizes = Some(parse_usizes(sizes)?);
                self.text.clear();
            }
            b"layer" => {
                if self.mesh.is_none() {
                    return Err(ImportError::Parse("layer outside of a mesh".to_string()));
                }
                let kind = attrs.get("kind").ok_or(ImportError::MissingField("layer.kind"))?;
                let kind = LayerKind::from_name(kind)
                    .ok_or_else(|| ImportError::Parse(format!("unknown layer kind: {}", kind)))?;
                let mapping = attrs.get("mapping").ok_or(ImportError::MissingField("layer.mapping"))?
                    .parse::<MappingMode>().map_err(ImportError::Parse)?;
                let reference = attrs.get("reference").ok_or(ImportError::MissingField("layer.reference"))?
                    .parse::<ReferenceMode>().map_err(ImportError::Parse)?;
                self.layer = Some((kind, LayerElement::new(mapping, reference)));
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<(), ImportError> {
        match name {
            b"node" => {
                let node = self.stack.pop()
                    .ok_or_else(|| ImportError::Parse("unbalanced node".to_string()))?;
                match self.stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => {
                        if self.root.is_some() {
                            return Err(ImportError::Parse("more than one root node".to_string()));
                        }
                        self.root = Some(node);
                    }
                }
            }
            b"transform" => {
                self.in_transform = false;
            }
            b"mesh" => {
                if let Some(mesh) = self.mesh.take() {
                    validate_mesh(&mesh)?;
                    self.current_node()?.attribute = Some(NodeAttribute::Mesh(mesh));
                }
            }
            b"points" => {
                let values = parse_floats(&self.text)?;
                if values.len() % 3 != 0 {
                    return Err(ImportError::Parse("point list is not a multiple of 3".to_string()));
                }
                let mesh = self.mesh.as_mut()
                    .ok_or_else(|| ImportError::Parse("points outside of a mesh".to_string()))?;
                mesh.control_points = values.chunks(3)
                    .map(|c| vec4(c[0], c[1], c[2], 1.0))
                    .collect();
            }
            b"polygons" => {
                let indices = parse_usizes(&self.text)?;
                let sizes = self.polygon_sizes.take().ok_or(ImportError::MissingField("polygons.sizes"))?;
                if sizes.iter().sum::<usize>() != indices.len() {
                    return Err(ImportError::Parse(format!(
                        "polygon sizes add up to {} but {} indices were given",
                        sizes.iter().sum::<usize>(), indices.len())));
                }
                let mesh = self.mesh.as_mut()
                    .ok_or_else(|| ImportError::Parse("polygons outside of a mesh".to_string()))?;
                let mut rest = indices.as_slice();
                mesh.polygons = sizes.iter().map(|&size| {
                    let (polygon, tail) = rest.split_at(size);
                    rest = tail;
                    polygon.to_vec()
                }).collect();
            }
            b"values" => {
                let values = parse_floats(&self.text)?;
                if values.len() % 4 != 0 {
                    return Err(ImportError::Parse("layer values are not a multiple of 4".to_string()));
                }
                if let Some((_, layer)) = self.layer.as_mut() {
                    layer.direct = values.chunks(4)
                        .map(|c| Vector4f::new(c[0], c[1], c[2], c[3]))
                        .collect();
                }
            }
            b"indices" => {
                let indices = parse_usizes(&self.text)?;
                if let Some((_, layer)) = self.layer.as_mut() {
                    layer.index = indices;
                }
            }
            b"layer" => {
                if let Some((kind, layer)) = self.layer.take() {
                    let wanted = match kind {
                        LayerKind::Normal => true,
                        LayerKind::Tangent => self.settings.import_tangents,
                        LayerKind::Binormal => self.settings.import_binormals,
                    };
                    if wanted {
                        if let Some(mesh) = self.mesh.as_mut() {
                            mesh.layers_mut(kind).push(layer);
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<Scene, ImportError> {
        let (version, password) = self.header.ok_or(ImportError::MissingField("scene"))?;
        if !self.stack.is_empty() {
            return Err(ImportError::Parse("unclosed node".to_string()));
        }
        let mut scene = match self.root {
            Some(root) => Scene::with_root(root),
            None => Scene::new(),
        };
        scene.version = version;
        scene.password = password;
        Ok(scene)
    }
}

fn validate_mesh(mesh: &Mesh) -> Result<(), ImportError> {
    let count = mesh.control_points_count();
    if let Some(bad) = mesh.polygons.iter().flatten().find(|&&i| i >= count) {
        return Err(ImportError::Parse(format!("polygon references control point {} of {}", bad, count)));
    }
    for layer in mesh.normals.iter().chain(mesh.tangents.iter()).chain(mesh.binormals.iter()) {
        if layer.reference_mode == ReferenceMode::IndexToDirect {
            if let Some(bad) = layer.index.iter().find(|&&i| i >= layer.direct.len()) {
                return Err(ImportError::Parse(format!(
                    "layer index {} past {} values", bad, layer.direct.len())));
            }
        }
    }
    Ok(())
}

fn attributes(e: &BytesStart, defaults: &HashMap<String, String>) -> Result<HashMap<String, String>, ImportError> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ImportError::Parse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(|e| ImportError::Parse(e.to_string()))?;
        out.insert(key, resolve_value(&value, defaults));
    }
    Ok(out)
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn parse_float(value: &str) -> Result<Float, ImportError> {
    value.trim().parse::<Float>().map_err(|_| ImportError::Parse(format!("invalid float: {}", value)))
}

fn tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split(|c: char| c.is_whitespace() || c == ',').filter(|s| !s.is_empty())
}

fn parse_floats(value: &str) -> Result<Vec<Float>, ImportError> {
    tokens(value).map(parse_float).collect()
}

fn parse_usizes(value: &str) -> Result<Vec<usize>, ImportError> {
    tokens(value)
        .map(|s| s.parse::<usize>().map_err(|_| ImportError::Parse(format!("invalid integer: {}", s))))
        .collect()
}

fn parse_vec3(value: &str) -> Result<Vector3f, ImportError> {
    let v = parse_floats(value)?;
    if v.len() != 3 {
        return Err(ImportError::Parse(format!("invalid vec3: {}", value)));
    }
    Ok(Vector3f::new(v[0], v[1], v[2]))
}
