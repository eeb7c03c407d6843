// Copyright @yucwang 2026

//! Per-mesh vertex attribute storage (normals, tangents, binormals).
//!
//! A layer is addressed by a logical position whose meaning depends on the
//! mapping mode: a control point index, a polygon-vertex occurrence index,
//! or a polygon index. The reference mode then decides whether that position
//! reads the value array directly or goes through the index array first.

use std::fmt;
use std::str::FromStr;

use crate::math::constants::Vector4f;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MappingMode {
    None,
    ByControlPoint,
    ByPolygonVertex,
    ByPolygon,
    ByEdge,
    AllSame,
}

impl MappingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingMode::None => "none",
            MappingMode::ByControlPoint => "by_control_point",
            MappingMode::ByPolygonVertex => "by_polygon_vertex",
            MappingMode::ByPolygon => "by_polygon",
            MappingMode::ByEdge => "by_edge",
            MappingMode::AllSame => "all_same",
        }
    }
}

impl FromStr for MappingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(MappingMode::None),
            "by_control_point" => Ok(MappingMode::ByControlPoint),
            "by_polygon_vertex" => Ok(MappingMode::ByPolygonVertex),
            "by_polygon" => Ok(MappingMode::ByPolygon),
            "by_edge" => Ok(MappingMode::ByEdge),
            "all_same" => Ok(MappingMode::AllSame),
            _ => Err(format!("unknown mapping mode: {}", s)),
        }
    }
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReferenceMode {
    Direct,
    IndexToDirect,
    /// Index array only, with no value array behind it. Stored so files
    /// round-trip, never resolved.
    Index,
}

impl ReferenceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceMode::Direct => "direct",
            ReferenceMode::IndexToDirect => "index_to_direct",
            ReferenceMode::Index => "index",
        }
    }
}

impl FromStr for ReferenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(ReferenceMode::Direct),
            "index_to_direct" => Ok(ReferenceMode::IndexToDirect),
            "index" => Ok(ReferenceMode::Index),
            _ => Err(format!("unknown reference mode: {}", s)),
        }
    }
}

impl fmt::Display for ReferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerError {
    UnsupportedReferenceMode(ReferenceMode),
    IndexOutOfRange { position: usize, len: usize },
    SlotOutOfRange { slot: usize, len: usize },
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerError::UnsupportedReferenceMode(mode) =>
                write!(f, "unsupported reference mode: {}", mode),
            LayerError::IndexOutOfRange { position, len } =>
                write!(f, "position {} is outside the index array ({} entries)", position, len),
            LayerError::SlotOutOfRange { slot, len } =>
                write!(f, "slot {} is outside the value array ({} entries)", slot, len),
        }
    }
}

impl std::error::Error for LayerError {}

/// Resolves a logical position to a slot of the value array.
pub fn resolve_slot(reference_mode: ReferenceMode,
                    index: &[usize],
                    position: usize) -> Result<usize, LayerError> {
    match reference_mode {
        ReferenceMode::Direct => Ok(position),
        ReferenceMode::IndexToDirect => index.get(position).copied()
            .ok_or(LayerError::IndexOutOfRange { position, len: index.len() }),
        ReferenceMode::Index => Err(LayerError::UnsupportedReferenceMode(reference_mode)),
    }
}

pub fn get(reference_mode: ReferenceMode,
           index: &[usize],
           direct: &[Vector4f],
           position: usize) -> Result<Vector4f, LayerError> {
    let slot = resolve_slot(reference_mode, index, position)?;
    direct.get(slot).copied()
        .ok_or(LayerError::SlotOutOfRange { slot, len: direct.len() })
}

/// Writes through the same slot `get` reads. A slot past the end of the value
/// array drops the write and returns `Ok(false)`.
pub fn set(reference_mode: ReferenceMode,
           index: &[usize],
           direct: &mut [Vector4f],
           position: usize,
           value: Vector4f) -> Result<bool, LayerError> {
    let slot = resolve_slot(reference_mode, index, position)?;
    match direct.get_mut(slot) {
        Some(target) => {
            *target = value;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerElement {
    pub mapping_mode: MappingMode,
    pub reference_mode: ReferenceMode,
    pub direct: Vec<Vector4f>,
    pub index: Vec<usize>,
}

impl Default for LayerElement {
    fn default() -> Self {
        Self {
            mapping_mode: MappingMode::ByControlPoint,
            reference_mode: ReferenceMode::Direct,
            direct: Vec::new(),
            index: Vec::new(),
        }
    }
}

impl LayerElement {
    pub fn new(mapping_mode: MappingMode, reference_mode: ReferenceMode) -> Self {
        Self { mapping_mode, reference_mode, direct: Vec::new(), index: Vec::new() }
    }

    pub fn direct(mapping_mode: MappingMode, values: Vec<Vector4f>) -> Self {
        Self { mapping_mode, reference_mode: ReferenceMode::Direct, direct: values, index: Vec::new() }
    }

    pub fn indexed(mapping_mode: MappingMode, values: Vec<Vector4f>, index: Vec<usize>) -> Self {
        Self { mapping_mode, reference_mode: ReferenceMode::IndexToDirect, direct: values, index }
    }

    pub fn resolve(&self, position: usize) -> Result<usize, LayerError> {
        resolve_slot(self.reference_mode, &self.index, position)
    }

    pub fn get(&self, position: usize) -> Result<Vector4f, LayerError> {
        get(self.reference_mode, &self.index, &self.direct, position)
    }

    pub fn set(&mut self, position: usize, value: Vector4f) -> Result<bool, LayerError> {
        set(self.reference_mode, &self.index, &mut self.direct, position, value)
    }

    /// Number of logical positions the layer answers for.
    pub fn addressable_len(&self) -> usize {
        match self.reference_mode {
            ReferenceMode::Direct => self.direct.len(),
            ReferenceMode::IndexToDirect | ReferenceMode::Index => self.index.len(),
        }
    }

    /// Clears the value array and refills it with `len` zero vectors.
    pub fn reset(&mut self, len: usize) {
        self.direct.clear();
        self.direct.resize(len, Vector4f::zeros());
    }

    /// Logical position of one polygon-vertex occurrence under this layer's
    /// mapping mode. `None` for modes that carry no per-vertex data.
    pub fn position_for(&self,
                        polygon_vertex: usize,
                        control_point: usize,
                        polygon: usize) -> Option<usize> {
        match self.mapping_mode {
            MappingMode::ByControlPoint => Some(control_point),
            MappingMode::ByPolygonVertex => Some(polygon_vertex),
            MappingMode::ByPolygon => Some(polygon),
            MappingMode::AllSame => Some(0),
            MappingMode::None | MappingMode::ByEdge => None,
        }
    }

    /// Rewrites an indexed layer as a direct one holding the same logical data.
    pub fn to_direct(&self) -> Result<LayerElement, LayerError> {
        let values = (0..self.addressable_len())
            .map(|position| self.get(position))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LayerElement::direct(self.mapping_mode, values))
    }
}
