use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use wavefront_obj::{obj, ParseError};

use super::format_registry::{ ExportError, ImportError, IoSettings, SceneReader, SceneWriter };
use crate::core::layer_element::{ LayerElement, MappingMode };
use crate::core::mesh::Mesh;
use crate::core::node::{ Node, NodeAttribute };
use crate::core::scene::Scene;
use crate::math::vector::vec4;

#[derive(Debug)]
pub enum ObjLoadError {
    Io(std::io::Error),
    Parse(ParseError),
    Geometry(String),
}

impl From<std::io::Error> for ObjLoadError {
    fn from(err: std::io::Error) -> Self {
        ObjLoadError::Io(err)
    }
}

impl From<ParseError> for ObjLoadError {
    fn from(err: ParseError) -> Self {
        ObjLoadError::Parse(err)
    }
}

impl fmt::Display for ObjLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjLoadError::Io(err) => write!(f, "io error: {}", err),
            ObjLoadError::Parse(err) => write!(f, "parse error: {}", err),
            ObjLoadError::Geometry(msg) => write!(f, "geometry error: {}", msg),
        }
    }
}

impl std::error::Error for ObjLoadError {}

pub fn load_obj_from_str<S: AsRef<str>>(input: S) -> Result<obj::ObjSet, ParseError> {
    let triangulated = triangulate_faces(input.as_ref());
    obj::parse(triangulated)
}

pub fn load_obj_from_file<P: AsRef<Path>>(path: P) -> Result<obj::ObjSet, ObjLoadError> {
    let data = fs::read_to_string(path)?;
    let obj_set = load_obj_from_str(data)?;
    Ok(obj_set)
}

fn triangulate_faces(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for line in input.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("f ") || trimmed.starts_with("f\t") {
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() > 4 {
                let base = parts[1];
                for i in 2..(parts.len() - 1) {
                    out.push_str("f ");
                    out.push_str(base);
                    out.push(' ');
                    out.push_str(parts[i]);
                    out.push(' ');
                    out.push_str(parts[i + 1]);
                    out.push('\n');
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Builds a mesh from one OBJ object. Normals become a per-polygon-vertex
/// indexed layer, and only when every face corner carries one.
pub fn mesh_from_object(object: &obj::Object) -> Result<Mesh, ObjLoadError> {
    let control_points = object.vertices.iter()
        .map(|v| vec4(v.x, v.y, v.z, 1.0))
        .collect::<Vec<_>>();

    let mut polygons = Vec::new();
    let mut normal_index = Vec::new();
    let mut all_normals = true;
    for geom in &object.geometry {
        for shape in &geom.shapes {
            if let obj::Primitive::Triangle(a, b, c) = &shape.primitive {
                // wavefront_obj yields (last, first, second); restore file order
                let mut polygon = Vec::with_capacity(3);
                for corner in [*b, *c, *a] {
                    if corner.0 >= control_points.len() {
                        return Err(ObjLoadError::Geometry(
                            format!("vertex index {} out of range in object {}", corner.0, object.name)));
                    }
                    polygon.push(corner.0);
                    match corner.2 {
                        Some(n) if n < object.normals.len() => normal_index.push(n),
                        _ => all_normals = false,
                    }
                }
                polygons.push(polygon);
            }
        }
    }

    let mut mesh = Mesh::new(control_points, polygons);
    if all_normals && !object.normals.is_empty() {
        let values = object.normals.iter()
            .map(|n| vec4(n.x, n.y, n.z, 0.0))
            .collect();
        mesh.normals.push(LayerElement::indexed(MappingMode::ByPolygonVertex, values, normal_index));
    }
    Ok(mesh)
}

pub fn scene_from_obj_set(obj_set: &obj::ObjSet) -> Result<Scene, ObjLoadError> {
    let mut scene = Scene::new();
    for object in &obj_set.objects {
        let mesh = mesh_from_object(object)?;
        scene.add_child(Node::new(object.name.clone()).with_attribute(NodeAttribute::Mesh(mesh)));
    }
    Ok(scene)
}

/// All objects of an OBJ file merged into one mesh.
pub fn load_mesh_from_file<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjLoadError> {
    let obj_set = load_obj_from_file(path)?;
    let mut merged = Mesh::default();
    let mut merged_normals: Option<LayerElement> = Some(LayerElement::indexed(
        MappingMode::ByPolygonVertex, Vec::new(), Vec::new()));

    for object in &obj_set.objects {
        let mesh = mesh_from_object(object)?;
        let point_offset = merged.control_points.len();
        let kept = match (merged_normals.as_mut(), mesh.normals.first()) {
            (Some(acc), Some(layer)) => {
                let value_offset = acc.direct.len();
                acc.direct.extend_from_slice(&layer.direct);
                acc.index.extend(layer.index.iter().map(|i| i + value_offset));
                true
            }
            _ => false,
        };
        if !kept {
            merged_normals = None;
        }
        merged.control_points.extend(mesh.control_points);
        merged.polygons.extend(mesh.polygons.into_iter()
            .map(|p| p.into_iter().map(|i| i + point_offset).collect()));
    }

    if let Some(layer) = merged_normals {
        if !layer.direct.is_empty() {
            merged.normals.push(layer);
        }
    }
    Ok(merged)
}

pub struct ObjSceneReader;

impl SceneReader for ObjSceneReader {
    fn description(&self) -> &str {
        "Wavefront OBJ"
    }

    fn extension(&self) -> &str {
        "obj"
    }

    fn read(&self, path: &Path, _settings: &IoSettings) -> Result<Scene, ImportError> {
        let obj_set = load_obj_from_file(path)?;
        Ok(scene_from_obj_set(&obj_set)?)
    }
}

/// Flattens every mesh node into OBJ text. Normals are written once per
/// polygon-vertex; tangent space has no OBJ representation and is dropped.
pub fn render_obj(scene: &Scene) -> Result<String, ExportError> {
    let mut out = String::new();
    let mut point_base = 1;
    let mut normal_base = 1;
    let mut dropped_basis = false;
    let mut failure: Option<ExportError> = None;

    scene.root().visit(&mut |node| {
        if failure.is_some() {
            return;
        }
        let mesh = match node.mesh() {
            Some(mesh) => mesh,
            None => return,
        };
        match write_obj_mesh(&mut out, &node.name, mesh, point_base, normal_base) {
            Ok(normals_written) => normal_base += normals_written,
            Err(e) => {
                failure = Some(e);
                return;
            }
        }
        dropped_basis |= !mesh.tangents.is_empty() || !mesh.binormals.is_empty();
        point_base += mesh.control_points_count();
    });

    if let Some(e) = failure {
        return Err(e);
    }
    if dropped_basis {
        log::warn!("OBJ has no tangent/binormal records; those layers were not exported.");
    }
    Ok(out)
}

fn write_obj_mesh(out: &mut String,
                  name: &str,
                  mesh: &Mesh,
                  point_base: usize,
                  normal_base: usize) -> Result<usize, ExportError> {
    let fmt_err = |e: fmt::Error| ExportError::Encode(e.to_string());
    writeln!(out, "o {}", name).map_err(fmt_err)?;
    for p in &mesh.control_points {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z).map_err(fmt_err)?;
    }

    let mut normals = Vec::new();
    if let Some(layer) = mesh.element_normal(0) {
        let mut complete = true;
        mesh.for_each_polygon_vertex(|polygon, control_point, polygon_vertex| {
            match Mesh::layer_value_at(layer, polygon, control_point, polygon_vertex)? {
                Some(n) => normals.push(n),
                None => complete = false,
            }
            Ok(())
        }).map_err(|e| ExportError::Encode(format!("normal layer of {}: {}", name, e)))?;
        if !complete {
            normals.clear();
        }
    }
    for n in &normals {
        writeln!(out, "vn {} {} {}", n.x, n.y, n.z).map_err(fmt_err)?;
    }

    let mut polygon_vertex = 0;
    for polygon in &mesh.polygons {
        out.push('f');
        for control_point in polygon {
            if normals.is_empty() {
                write!(out, " {}", control_point + point_base).map_err(fmt_err)?;
            } else {
                write!(out, " {}//{}", control_point + point_base, polygon_vertex + normal_base).map_err(fmt_err)?;
            }
            polygon_vertex += 1;
        }
        out.push('\n');
    }
    Ok(normals.len())
}

pub struct ObjSceneWriter;

impl SceneWriter for ObjSceneWriter {
    fn description(&self) -> &str {
        "Wavefront OBJ"
    }

    fn extension(&self) -> &str {
        "obj"
    }

    fn is_native(&self) -> bool {
        false
    }

    fn write(&self, scene: &Scene) -> Result<Vec<u8>, ExportError> {
        Ok(render_obj(scene)?.into_bytes())
    }
}
