// Copyright @yucwang 2026

//! Tangent/binormal reconstruction from a borrowed normal layer.
//!
//! The destination mesh keeps its own normals as the "up" axis of the frame.
//! Both normal arrays are read at the slot resolved through the source layer.
//! The source mesh's normals become the tangent directions, and the binormal
//! is `up x tangent`. The new layers copy the destination normal layer's
//! addressing, so anything reading the destination afterwards sees the three
//! layers laid out the same way.

use std::fmt;

use super::layer_element::{ LayerElement, LayerError, MappingMode, ReferenceMode };
use super::mesh::Mesh;
use crate::math::vector::{ cross_xyz, normalize_xyz };

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MeshRole {
    Destination,
    Source,
}

impl fmt::Display for MeshRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshRole::Destination => f.write_str("destination"),
            MeshRole::Source => f.write_str("source"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BasisError {
    MissingNormals(MeshRole),
    Layer(LayerError),
    UnsupportedMappingMode(MappingMode),
}

impl From<LayerError> for BasisError {
    fn from(err: LayerError) -> Self {
        BasisError::Layer(err)
    }
}

impl fmt::Display for BasisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasisError::MissingNormals(role) => write!(f, "{} mesh has no normal layer", role),
            BasisError::Layer(err) => write!(f, "layer error: {}", err),
            BasisError::UnsupportedMappingMode(mode) =>
                write!(f, "source normals use unsupported mapping mode {}", mode),
        }
    }
}

impl std::error::Error for BasisError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasisReport {
    /// Logical positions visited (control points or polygon-vertices).
    pub positions: usize,
    pub slots_written: usize,
    /// Writes whose slot fell past the resized value array.
    pub dropped_writes: usize,
}

fn check_reference_mode(layer: &LayerElement) -> Result<(), LayerError> {
    match layer.reference_mode {
        ReferenceMode::Direct | ReferenceMode::IndexToDirect => Ok(()),
        mode => Err(LayerError::UnsupportedReferenceMode(mode)),
    }
}

/// Fresh tangent-space layer sized to the source normal layer's value array
/// and addressed like the destination normal layer.
fn basis_layer(dst_normals: &LayerElement, len: usize) -> LayerElement {
    let mut layer = LayerElement::new(dst_normals.mapping_mode, dst_normals.reference_mode);
    layer.reset(len);
    if layer.reference_mode == ReferenceMode::IndexToDirect {
        layer.index = dst_normals.index.clone();
    }
    layer
}

struct BasisWriter<'a> {
    src_normals: &'a LayerElement,
    dst_normals: &'a LayerElement,
    tangents: LayerElement,
    binormals: LayerElement,
    report: BasisReport,
}

impl<'a> BasisWriter<'a> {
    fn write(&mut self, position: usize) -> Result<(), LayerError> {
        let normal_index = self.src_normals.resolve(position)?;
        let raw_tangent = self.src_normals.direct.get(normal_index).copied()
            .ok_or(LayerError::SlotOutOfRange { slot: normal_index, len: self.src_normals.direct.len() })?;
        let up = self.dst_normals.direct.get(normal_index).copied()
            .ok_or(LayerError::SlotOutOfRange { slot: normal_index, len: self.dst_normals.direct.len() })?;

        let tangent = normalize_xyz(&raw_tangent);
        let binormal = cross_xyz(&up, &tangent);

        let wrote = self.tangents.set(position, tangent)?;
        self.binormals.set(position, binormal)?;

        self.report.positions += 1;
        if wrote {
            self.report.slots_written += 1;
        } else {
            self.report.dropped_writes += 1;
        }
        Ok(())
    }
}

/// Fills layer 0 of `dst`'s tangents and binormals from `src`'s normals.
///
/// Reference modes are checked before anything is touched. The layers are
/// built on the side and committed at the end, so a read failure leaves `dst`
/// as it was. An unsupported source mapping mode still commits the sized,
/// zero-filled layers before reporting the error.
pub fn compute_tangent_basis(dst: &mut Mesh, src: &Mesh) -> Result<BasisReport, BasisError> {
    let src_normals = src.element_normal(0).ok_or(BasisError::MissingNormals(MeshRole::Source))?;
    let dst_normals = dst.element_normal(0).ok_or(BasisError::MissingNormals(MeshRole::Destination))?;
    check_reference_mode(src_normals)?;
    check_reference_mode(dst_normals)?;

    let len = src_normals.direct.len();
    let mut writer = BasisWriter {
        src_normals,
        dst_normals,
        tangents: basis_layer(dst_normals, len),
        binormals: basis_layer(dst_normals, len),
        report: BasisReport::default(),
    };

    let walked = match src_normals.mapping_mode {
        MappingMode::ByControlPoint => {
            for vertex in 0..dst.control_points_count() {
                writer.write(vertex)?;
            }
            Ok(())
        }
        MappingMode::ByPolygonVertex => {
            dst.for_each_polygon_vertex(|_, _, polygon_vertex| writer.write(polygon_vertex))?;
            Ok(())
        }
        mode => Err(BasisError::UnsupportedMappingMode(mode)),
    };

    let BasisWriter { tangents, binormals, report, .. } = writer;
    commit(dst, tangents, binormals);
    walked.map(|_| report)
}

fn commit(dst: &mut Mesh, tangents: LayerElement, binormals: LayerElement) {
    match dst.tangents.first_mut() {
        Some(layer) => *layer = tangents,
        None => dst.tangents.push(tangents),
    }
    match dst.binormals.first_mut() {
        Some(layer) => *layer = binormals,
        None => dst.binormals.push(binormals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::{ Float, Vector4f };
    use crate::math::vector::{ dot_xyz, vec4 };

    fn approx(a: &Vector4f, b: &Vector4f) -> bool {
        (a - b).norm() < 1e-9
    }

    fn square(normals: LayerElement) -> Mesh {
        let mut mesh = Mesh::new(vec![
            vec4(0.0, 0.0, 0.0, 1.0),
            vec4(1.0, 0.0, 0.0, 1.0),
            vec4(1.0, 1.0, 0.0, 1.0),
            vec4(0.0, 1.0, 0.0, 1.0),
        ], vec![vec![0, 1, 2], vec![0, 2, 3]]);
        mesh.normals.push(normals);
        mesh
    }

    fn up_normals() -> LayerElement {
        LayerElement::direct(MappingMode::ByControlPoint, vec![vec4(0.0, 0.0, 1.0, 0.0); 4])
    }

    #[test]
    fn test_control_point_direct() {
        let source: Vec<Vector4f> = (0..4)
            .map(|i| vec4(2.0 + i as Float, 0.0, 0.0, 0.0))
            .collect();
        let src = square(LayerElement::direct(MappingMode::ByControlPoint, source.clone()));
        let mut dst = square(up_normals());

        let report = compute_tangent_basis(&mut dst, &src).expect("basis failed");
        assert_eq!(report, BasisReport { positions: 4, slots_written: 4, dropped_writes: 0 });

        let tangents = dst.element_tangent(0).expect("tangent layer");
        let binormals = dst.element_binormal(0).expect("binormal layer");
        for i in 0..4 {
            let t = tangents.get(i).expect("tangent read");
            let b = binormals.get(i).expect("binormal read");
            assert!(approx(&t, &normalize_xyz(&source[i])));
            assert!(approx(&b, &cross_xyz(&vec4(0.0, 0.0, 1.0, 0.0), &t)));
            assert!(dot_xyz(&t, &b).abs() < 1e-9);
            assert!(approx(&b, &vec4(0.0, 1.0, 0.0, 0.0)));
        }
    }

    #[test]
    fn test_indexed_source_example() {
        let src = square(LayerElement::indexed(MappingMode::ByControlPoint,
                                               vec![vec4(0.0, 0.0, 1.0, 0.0)],
                                               vec![0, 0, 0, 0]));
        let dst_normals = LayerElement::direct(MappingMode::ByControlPoint, vec![
            vec4(1.0, 0.0, 0.0, 0.0),
            vec4(0.0, 1.0, 0.0, 0.0),
            vec4(1.0, 0.0, 0.0, 0.0),
            vec4(0.0, 1.0, 0.0, 0.0),
        ]);
        let mut dst = square(dst_normals);

        let report = compute_tangent_basis(&mut dst, &src).expect("basis failed");
        assert_eq!(report.positions, 4);
        assert_eq!(report.slots_written, 1);
        assert_eq!(report.dropped_writes, 3);

        let tangents = dst.element_tangent(0).expect("tangent layer");
        let binormals = dst.element_binormal(0).expect("binormal layer");
        assert_eq!(tangents.direct.len(), 1);
        assert_eq!(binormals.direct.len(), 1);
        assert!(approx(&tangents.direct[0], &vec4(0.0, 0.0, 1.0, 0.0)));
        // x cross z
        assert!(approx(&binormals.direct[0], &vec4(0.0, -1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_layers_copy_destination_modes() {
        let src = square(LayerElement::direct(MappingMode::ByPolygonVertex,
                                              vec![vec4(1.0, 0.0, 0.0, 0.0); 6]));
        let dst_normals = LayerElement::indexed(MappingMode::ByPolygonVertex,
                                                vec![vec4(0.0, 0.0, 1.0, 0.0); 6],
                                                vec![0, 1, 0, 1, 0, 1]);
        let mut dst = square(dst_normals);

        compute_tangent_basis(&mut dst, &src).expect("basis failed");

        for layer in [dst.element_tangent(0), dst.element_binormal(0)] {
            let layer = layer.expect("layer created");
            assert_eq!(layer.mapping_mode, MappingMode::ByPolygonVertex);
            assert_eq!(layer.reference_mode, ReferenceMode::IndexToDirect);
            assert_eq!(layer.direct.len(), 6);
            assert_eq!(layer.index, vec![0, 1, 0, 1, 0, 1]);
        }
        let tangents = dst.element_tangent(0).expect("tangent layer");
        assert!(approx(&tangents.direct[0], &vec4(1.0, 0.0, 0.0, 0.0)));
        assert!(approx(&tangents.direct[1], &vec4(1.0, 0.0, 0.0, 0.0)));
        assert_eq!(tangents.direct[2], Vector4f::zeros());
    }

    #[test]
    fn test_polygon_vertex_counter() {
        let source: Vec<Vector4f> = (0..6)
            .map(|i| vec4(1.0, i as Float, 0.0, 0.0))
            .collect();
        let src = square(LayerElement::direct(MappingMode::ByPolygonVertex, source.clone()));
        let mut dst = square(LayerElement::direct(MappingMode::ByPolygonVertex,
                                                  vec![vec4(0.0, 0.0, 1.0, 0.0); 6]));

        let report = compute_tangent_basis(&mut dst, &src).expect("basis failed");
        assert_eq!(report.positions, dst.polygon_vertex_count());
        assert_eq!(report.slots_written, 6);

        let tangents = dst.element_tangent(0).expect("tangent layer");
        let binormals = dst.element_binormal(0).expect("binormal layer");
        for k in 0..6 {
            let expected = normalize_xyz(&source[k]);
            assert!(approx(&tangents.direct[k], &expected), "tangent {} out of order", k);
            assert!(approx(&binormals.direct[k], &cross_xyz(&vec4(0.0, 0.0, 1.0, 0.0), &expected)));
        }
    }

    #[test]
    fn test_up_normal_follows_source_index() {
        let src = square(LayerElement::indexed(MappingMode::ByControlPoint,
                                               vec![vec4(0.0, 0.0, 1.0, 0.0), vec4(0.0, 1.0, 0.0, 0.0)],
                                               vec![1, 1, 1, 1]));
        let mut dst = square(LayerElement::direct(MappingMode::ByControlPoint, vec![
            vec4(0.0, 0.0, 1.0, 0.0),
            vec4(1.0, 0.0, 0.0, 0.0),
            vec4(0.0, 0.0, 1.0, 0.0),
            vec4(1.0, 0.0, 0.0, 0.0),
        ]));

        let report = compute_tangent_basis(&mut dst, &src).expect("basis failed");
        assert_eq!(report.slots_written, 2);
        assert_eq!(report.dropped_writes, 2);

        let tangents = dst.element_tangent(0).expect("tangent layer");
        let binormals = dst.element_binormal(0).expect("binormal layer");
        assert!(approx(&tangents.direct[0], &vec4(0.0, 1.0, 0.0, 0.0)));
        // dst normal 1 is x, x cross y
        assert!(approx(&binormals.direct[0], &vec4(0.0, 0.0, 1.0, 0.0)));
        assert!(approx(&binormals.direct[1], &vec4(0.0, 0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_polygon_vertex_source_on_control_point_destination() {
        let src = square(LayerElement::indexed(MappingMode::ByPolygonVertex,
                                               vec![vec4(2.0, 0.0, 0.0, 0.0)],
                                               vec![0; 6]));
        let mut dst = square(up_normals());

        let report = compute_tangent_basis(&mut dst, &src).expect("basis failed");
        assert_eq!(report.positions, 6);
        assert_eq!(report.slots_written, 1);
        assert_eq!(report.dropped_writes, 5);

        let tangents = dst.element_tangent(0).expect("tangent layer");
        let binormals = dst.element_binormal(0).expect("binormal layer");
        assert_eq!(tangents.mapping_mode, MappingMode::ByControlPoint);
        assert_eq!(tangents.direct, vec![vec4(1.0, 0.0, 0.0, 0.0)]);
        assert_eq!(binormals.direct, vec![vec4(0.0, 1.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_existing_layers_are_replaced() {
        let src = square(LayerElement::direct(MappingMode::ByControlPoint, vec![vec4(0.0, 2.0, 0.0, 0.0); 4]));
        let mut dst = square(up_normals());
        dst.tangents.push(LayerElement::direct(MappingMode::ByPolygon, vec![vec4(9.0, 9.0, 9.0, 9.0); 10]));

        compute_tangent_basis(&mut dst, &src).expect("basis failed");
        assert_eq!(dst.tangents.len(), 1);
        assert_eq!(dst.binormals.len(), 1);
        let tangents = dst.element_tangent(0).expect("tangent layer");
        assert_eq!(tangents.mapping_mode, MappingMode::ByControlPoint);
        assert_eq!(tangents.direct, vec![vec4(0.0, 1.0, 0.0, 0.0); 4]);
    }

    #[test]
    fn test_missing_normals_write_nothing() {
        let src = Mesh::new(vec![vec4(0.0, 0.0, 0.0, 1.0)], vec![]);
        let mut dst = square(up_normals());
        let before = dst.clone();
        assert_eq!(compute_tangent_basis(&mut dst, &src), Err(BasisError::MissingNormals(MeshRole::Source)));
        assert_eq!(dst, before);

        let src = square(up_normals());
        let mut dst = Mesh::new(vec![vec4(0.0, 0.0, 0.0, 1.0)], vec![]);
        assert_eq!(compute_tangent_basis(&mut dst, &src), Err(BasisError::MissingNormals(MeshRole::Destination)));
        assert!(dst.tangents.is_empty());
    }

    #[test]
    fn test_unsupported_reference_mode_writes_nothing() {
        let src = square(LayerElement::new(MappingMode::ByControlPoint, ReferenceMode::Index));
        let mut dst = square(up_normals());
        let result = compute_tangent_basis(&mut dst, &src);
        assert_eq!(result, Err(BasisError::Layer(LayerError::UnsupportedReferenceMode(ReferenceMode::Index))));
        assert!(dst.tangents.is_empty());
        assert!(dst.binormals.is_empty());
    }

    #[test]
    fn test_unsupported_mapping_mode_leaves_zeroed_layers() {
        let src = square(LayerElement::direct(MappingMode::ByPolygon, vec![vec4(1.0, 0.0, 0.0, 0.0); 2]));
        let mut dst = square(up_normals());
        let result = compute_tangent_basis(&mut dst, &src);
        assert_eq!(result, Err(BasisError::UnsupportedMappingMode(MappingMode::ByPolygon)));
        let tangents = dst.element_tangent(0).expect("tangent layer");
        assert_eq!(tangents.direct, vec![Vector4f::zeros(); 2]);
        assert_eq!(dst.element_binormal(0).map(|l| l.direct.len()), Some(2));
    }

    #[test]
    fn test_bad_index_leaves_destination_untouched() {
        let src = square(LayerElement::indexed(MappingMode::ByControlPoint,
                                               vec![vec4(1.0, 0.0, 0.0, 0.0)],
                                               vec![0, 0]));
        let mut dst = square(up_normals());
        let result = compute_tangent_basis(&mut dst, &src);
        assert_eq!(result, Err(BasisError::Layer(LayerError::IndexOutOfRange { position: 2, len: 2 })));
        assert!(dst.tangents.is_empty());
    }
}
