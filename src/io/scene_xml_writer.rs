// Copyright @yucwang 2026

use quick_xml::events::{ BytesDecl, BytesEnd, BytesStart, BytesText, Event };
use quick_xml::Writer;

use super::format_registry::{ ExportError, SceneWriter };
use crate::core::layer_element::LayerElement;
use crate::core::mesh::{ LayerKind, Mesh };
use crate::core::node::{ Node, NodeAttribute };
use crate::core::scene::Scene;
use crate::math::constants::Vector3f;

/// Native scene writer. The ascii flavour indents its output, the compact
/// one writes everything on a single line.
pub struct XmlSceneWriter {
    ascii: bool,
}

impl XmlSceneWriter {
    pub fn compact() -> Self {
        Self { ascii: false }
    }

    pub fn ascii() -> Self {
        Self { ascii: true }
    }
}

impl SceneWriter for XmlSceneWriter {
    fn description(&self) -> &str {
        if self.ascii {
            "Tangent scene XML ascii"
        } else {
            "Tangent scene XML compact"
        }
    }

    fn extension(&self) -> &str {
        "xml"
    }

    fn is_native(&self) -> bool {
        true
    }

    fn write(&self, scene: &Scene) -> Result<Vec<u8>, ExportError> {
        if self.ascii {
            render_scene(Writer::new_with_indent(Vec::new(), b' ', 2), scene)
        } else {
            render_scene(Writer::new(Vec::new()), scene)
        }
    }
}

type XmlWriter = Writer<Vec<u8>>;

fn encode<E: std::fmt::Display>(err: E) -> ExportError {
    ExportError::Encode(err.to_string())
}

fn render_scene(mut writer: XmlWriter, scene: &Scene) -> Result<Vec<u8>, ExportError> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None))).map_err(encode)?;

    let version = scene.version.to_string();
    let mut start = BytesStart::new("scene");
    start.push_attribute(("version", version.as_str()));
    if let Some(password) = &scene.password {
        start.push_attribute(("password", password.as_str()));
    }
    writer.write_event(Event::Start(start)).map_err(encode)?;
    write_node(&mut writer, scene.root())?;
    writer.write_event(Event::End(BytesEnd::new("scene"))).map_err(encode)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_node(writer: &mut XmlWriter, node: &Node) -> Result<(), ExportError> {
    let mut start = BytesStart::new("node");
    start.push_attribute(("name", node.name.as_str()));
    if node.transform.is_identity() && node.attribute.is_none() && node.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(encode);
    }
    writer.write_event(Event::Start(start)).map_err(encode)?;

    if !node.transform.is_identity() {
        writer.write_event(Event::Start(BytesStart::new("transform"))).map_err(encode)?;
        write_xyz(writer, "translate", &node.transform.translate)?;
        write_xyz(writer, "rotate", &node.transform.rotate)?;
        write_xyz(writer, "scale", &node.transform.scale)?;
        writer.write_event(Event::End(BytesEnd::new("transform"))).map_err(encode)?;
    }

    match &node.attribute {
        Some(NodeAttribute::Null) => {
            writer.write_event(Event::Empty(BytesStart::new("null"))).map_err(encode)?;
        }
        Some(NodeAttribute::Light(light)) => {
            let color = join(&[light.color.x, light.color.y, light.color.z]);
            let intensity = light.intensity.to_string();
            let mut e = BytesStart::new("light");
            e.push_attribute(("type", light.light_type.as_str()));
            e.push_attribute(("color", color.as_str()));
            e.push_attribute(("intensity", intensity.as_str()));
            writer.write_event(Event::Empty(e)).map_err(encode)?;
        }
        Some(NodeAttribute::Camera(camera)) => {
            let (fov, near, far) = (camera.fov.to_string(), camera.near_clip.to_string(), camera.far_clip.to_string());
            let mut e = BytesStart::new("camera");
            e.push_attribute(("fov", fov.as_str()));
            e.push_attribute(("near", near.as_str()));
            e.push_attribute(("far", far.as_str()));
            writer.write_event(Event::Empty(e)).map_err(encode)?;
        }
        Some(NodeAttribute::Mesh(mesh)) => write_mesh(writer, mesh)?,
        None => {}
    }

    for child in node.children.iter() {
        write_node(writer, child)?;
    }

    writer.write_event(Event::End(BytesEnd::new("node"))).map_err(encode)
}

fn write_xyz(writer: &mut XmlWriter, tag: &str, v: &Vector3f) -> Result<(), ExportError> {
    let (x, y, z) = (v.x.to_string(), v.y.to_string(), v.z.to_string());
    let mut e = BytesStart::new(tag);
    e.push_attribute(("x", x.as_str()));
    e.push_attribute(("y", y.as_str()));
    e.push_attribute(("z", z.as_str()));
    writer.write_event(Event::Empty(e)).map_err(encode)
}

fn write_mesh(writer: &mut XmlWriter, mesh: &Mesh) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new("mesh"))).map_err(encode)?;

    let points: Vec<f64> = mesh.control_points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
    write_text_element(writer, BytesStart::new("points"), &join(&points))?;

    let sizes: Vec<String> = mesh.polygons.iter().map(|p| p.len().to_string()).collect();
    let sizes = sizes.join(" ");
    let mut polygons = BytesStart::new("polygons");
    polygons.push_attribute(("sizes", sizes.as_str()));
    let indices: Vec<String> = mesh.polygons.iter().flatten().map(|i| i.to_string()).collect();
    write_text_element(writer, polygons, &indices.join(" "))?;

    for kind in [LayerKind::Normal, LayerKind::Tangent, LayerKind::Binormal] {
        for layer in mesh.layers(kind).iter() {
            write_layer(writer, kind, layer)?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("mesh"))).map_err(encode)
}

fn write_layer(writer: &mut XmlWriter, kind: LayerKind, layer: &LayerElement) -> Result<(), ExportError> {
    let mut start = BytesStart::new("layer");
    start.push_attribute(("kind", kind.as_str()));
    start.push_attribute(("mapping", layer.mapping_mode.as_str()));
    start.push_attribute(("reference", layer.reference_mode.as_str()));
    writer.write_event(Event::Start(start)).map_err(encode)?;

    let values: Vec<f64> = layer.direct.iter().flat_map(|v| [v.x, v.y, v.z, v.w]).collect();
    write_text_element(writer, BytesStart::new("values"), &join(&values))?;
    if !layer.index.is_empty() {
        let indices: Vec<String> = layer.index.iter().map(|i| i.to_string()).collect();
        write_text_element(writer, BytesStart::new("indices"), &indices.join(" "))?;
    }

    writer.write_event(Event::End(BytesEnd::new("layer"))).map_err(encode)
}

fn write_text_element(writer: &mut XmlWriter, start: BytesStart, text: &str) -> Result<(), ExportError> {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start)).map_err(encode)?;
    writer.write_event(Event::Text(BytesText::new(text))).map_err(encode)?;
    writer.write_event(Event::End(end)).map_err(encode)
}

fn join(values: &[f64]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::core::layer_element::MappingMode;
    use crate::core::node::{ Camera, Light };
    use crate::io::format_registry::IoSettings;
    use crate::io::scene_xml::parse_scene;
    use crate::math::vector::vec4;

    fn sample_scene() -> Scene {
        let mut mesh = Mesh::new(vec![
            vec4(0.0, 0.0, 0.0, 1.0),
            vec4(1.5, 0.0, 0.0, 1.0),
            vec4(0.0, -2.25, 0.0, 1.0),
        ], vec![vec![0, 1, 2]]);
        mesh.normals.push(LayerElement::indexed(MappingMode::ByPolygonVertex,
                                                vec![vec4(0.0, 0.0, 1.0, 0.0)],
                                                vec![0, 0, 0]));
        mesh.tangents.push(LayerElement::direct(MappingMode::ByControlPoint,
                                                vec![vec4(1.0, 0.0, 0.0, 0.0); 3]));

        let mut body = Node::new("body").with_attribute(NodeAttribute::Mesh(mesh));
        body.transform.translate = Vector3f::new(0.0, 1.0, 0.0);
        let root = Node::new("RootNode")
            .with_child(body)
            .with_child(Node::new("lamp").with_attribute(NodeAttribute::Light(Light::default())))
            .with_child(Node::new("eye").with_attribute(NodeAttribute::Camera(Camera::default())))
            .with_child(Node::new("marker & <pivot>").with_attribute(NodeAttribute::Null));
        let mut scene = Scene::with_root(root);
        scene.password = Some(String::from("s3cret"));
        scene
    }

    #[test]
    fn test_written_scene_reads_back() {
        let scene = sample_scene();
        let settings = IoSettings { password: Some(String::from("s3cret")), ..IoSettings::default() };
        for writer in [XmlSceneWriter::compact(), XmlSceneWriter::ascii()] {
            let bytes = writer.write(&scene).expect("write failed");
            let xml = String::from_utf8(bytes).expect("utf8");
            let read = parse_scene(&xml, Path::new("."), &settings).expect("read back failed");
            assert_eq!(read, scene);
        }
    }

    #[test]
    fn test_ascii_output_is_indented() {
        let scene = sample_scene();
        let compact = String::from_utf8(XmlSceneWriter::compact().write(&scene).expect("write")).expect("utf8");
        let ascii = String::from_utf8(XmlSceneWriter::ascii().write(&scene).expect("write")).expect("utf8");
        assert_eq!(compact.trim_end().lines().count(), 1);
        assert!(ascii.lines().count() > 10);
        assert!(ascii.contains("\n  <node name=\"RootNode\">"));
        assert!(ascii.contains("reference=\"index_to_direct\""));
    }

    #[test]
    fn test_descriptions() {
        assert!(XmlSceneWriter::ascii().description().contains("ascii"));
        assert!(!XmlSceneWriter::compact().description().contains("ascii"));
        assert!(XmlSceneWriter::compact().is_native());
        assert_eq!(XmlSceneWriter::ascii().extension(), "xml");
    }
}
