use tangent_graft::core::layer_element::{ LayerElement, LayerError };
use tangent_graft::core::mesh::{ LayerKind, Mesh };
use tangent_graft::core::node::Node;
use tangent_graft::core::session::{ NoPrompt, Session };
use tangent_graft::math::constants::Float;
use tangent_graft::math::vector::dot_xyz;

fn print_layer(kind: LayerKind, i: usize, layer: &LayerElement) {
    println!("    {} {}: mapping={} reference={} values={} indices={}",
             kind.as_str(), i, layer.mapping_mode, layer.reference_mode,
             layer.direct.len(), layer.index.len());
}

/// Largest |t.b| and |n.b| over all polygon-vertices, using layer 0.
fn basis_dots(mesh: &Mesh) -> Result<Option<(Float, Float)>, LayerError> {
    let (normals, tangents, binormals) = match (mesh.element_normal(0),
                                                mesh.element_tangent(0),
                                                mesh.element_binormal(0)) {
        (Some(n), Some(t), Some(b)) => (n, t, b),
        _ => return Ok(None),
    };

    let mut worst = (0.0 as Float, 0.0 as Float);
    mesh.for_each_polygon_vertex(|polygon, control_point, polygon_vertex| {
        let read = |layer: &LayerElement| Mesh::layer_value_at(layer, polygon, control_point, polygon_vertex);
        if let (Some(n), Some(t), Some(b)) = (read(normals)?, read(tangents)?, read(binormals)?) {
            worst.0 = worst.0.max(dot_xyz(&t, &b).abs());
            worst.1 = worst.1.max(dot_xyz(&n, &b).abs());
        }
        Ok(())
    })?;
    Ok(Some(worst))
}

fn print_mesh(path: &str, mesh: &Mesh) {
    println!("{}", path);
    println!("    control points: {}, polygons: {}, polygon-vertices: {}",
             mesh.control_points_count(), mesh.polygon_count(), mesh.polygon_vertex_count());
    for kind in [LayerKind::Normal, LayerKind::Tangent, LayerKind::Binormal] {
        for (i, layer) in mesh.layers(kind).iter().enumerate() {
            print_layer(kind, i, layer);
        }
    }
    match basis_dots(mesh) {
        Ok(Some((tb, nb))) => println!("    max |t.b|: {:.6}, max |n.b|: {:.6}", tb, nb),
        Ok(None) => println!("    no complete tangent frame"),
        Err(e) => println!("    unreadable layers: {}", e),
    }
}

fn walk(node: &Node, path: &mut String) {
    let len = path.len();
    path.push('/');
    path.push_str(&node.name);
    if let Some(mesh) = node.mesh() {
        print_mesh(path, mesh);
    }
    for child in node.children.iter() {
        walk(child, path);
    }
    path.truncate(len);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <scene>", args[0]);
        std::process::exit(1);
    }

    let mut session = Session::new();
    let scene = match session.load_scene(&args[1], &mut NoPrompt) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("failed to read {}: {}", args[1], e);
            std::process::exit(1);
        }
    };

    println!("Version: {}, nodes: {}, meshes: {}", scene.version, scene.node_count(), scene.mesh_count());
    walk(scene.root(), &mut String::new());
}
