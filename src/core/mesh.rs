// Copyright @yucwang 2026

use super::layer_element::{ LayerElement, LayerError };
use crate::math::constants::Vector4f;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerKind {
    Normal,
    Tangent,
    Binormal,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Normal => "normal",
            LayerKind::Tangent => "tangent",
            LayerKind::Binormal => "binormal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(LayerKind::Normal),
            "tangent" => Some(LayerKind::Tangent),
            "binormal" => Some(LayerKind::Binormal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub control_points: Vec<Vector4f>,
    pub polygons: Vec<Vec<usize>>,
    pub normals: Vec<LayerElement>,
    pub tangents: Vec<LayerElement>,
    pub binormals: Vec<LayerElement>,
}

impl Mesh {
    pub fn new(control_points: Vec<Vector4f>, polygons: Vec<Vec<usize>>) -> Self {
        Self { control_points, polygons, ..Default::default() }
    }

    pub fn control_points_count(&self) -> usize {
        self.control_points.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn polygon_size(&self, polygon: usize) -> usize {
        self.polygons.get(polygon).map(|p| p.len()).unwrap_or(0)
    }

    pub fn polygon_vertex_count(&self) -> usize {
        self.polygons.iter().map(|p| p.len()).sum()
    }

    pub fn layers(&self, kind: LayerKind) -> &Vec<LayerElement> {
        match kind {
            LayerKind::Normal => &self.normals,
            LayerKind::Tangent => &self.tangents,
            LayerKind::Binormal => &self.binormals,
        }
    }

    pub fn layers_mut(&mut self, kind: LayerKind) -> &mut Vec<LayerElement> {
        match kind {
            LayerKind::Normal => &mut self.normals,
            LayerKind::Tangent => &mut self.tangents,
            LayerKind::Binormal => &mut self.binormals,
        }
    }

    pub fn element_normal(&self, layer: usize) -> Option<&LayerElement> {
        self.normals.get(layer)
    }

    pub fn element_tangent(&self, layer: usize) -> Option<&LayerElement> {
        self.tangents.get(layer)
    }

    pub fn element_binormal(&self, layer: usize) -> Option<&LayerElement> {
        self.binormals.get(layer)
    }

    /// Calls `f(polygon, control_point, polygon_vertex)` for every occurrence,
    /// polygons in order, vertices in polygon order.
    pub fn for_each_polygon_vertex<F>(&self, mut f: F) -> Result<(), LayerError>
        where F: FnMut(usize, usize, usize) -> Result<(), LayerError> {
        let mut polygon_vertex = 0;
        for (polygon, vertices) in self.polygons.iter().enumerate() {
            for control_point in vertices {
                f(polygon, *control_point, polygon_vertex)?;
                polygon_vertex += 1;
            }
        }
        Ok(())
    }

    /// Reads a layer value for one polygon-vertex occurrence, whatever the
    /// layer's mapping mode. `Ok(None)` when the mode carries no vertex data.
    pub fn layer_value_at(layer: &LayerElement,
                          polygon: usize,
                          control_point: usize,
                          polygon_vertex: usize) -> Result<Option<Vector4f>, LayerError> {
        match layer.position_for(polygon_vertex, control_point, polygon) {
            Some(position) => layer.get(position).map(Some),
            None => Ok(None),
        }
    }
}
