// Copyright @yucwang 2026

use std::fmt;

use super::mesh::Mesh;
use crate::math::constants::{ Float, Vector3f };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NodeTransform {
    pub translate: Vector3f,
    /// Euler angles in degrees.
    pub rotate: Vector3f,
    pub scale: Vector3f,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translate: Vector3f::zeros(),
            rotate: Vector3f::zeros(),
            scale: Vector3f::new(1.0, 1.0, 1.0),
        }
    }
}

impl NodeTransform {
    pub fn is_identity(&self) -> bool {
        *self == NodeTransform::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub light_type: String,
    pub color: Vector3f,
    pub intensity: Float,
}

impl Default for Light {
    fn default() -> Self {
        Self { light_type: String::from("point"), color: Vector3f::new(1.0, 1.0, 1.0), intensity: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov: Float,
    pub near_clip: Float,
    pub far_clip: Float,
}

impl Default for Camera {
    fn default() -> Self {
        Self { fov: 45.0, near_clip: 0.1, far_clip: 1000.0 }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    Null,
    Mesh,
    Light,
    Camera,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::Null => "null",
            AttributeKind::Mesh => "mesh",
            AttributeKind::Light => "light",
            AttributeKind::Camera => "camera",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeAttribute {
    Null,
    Mesh(Mesh),
    Light(Light),
    Camera(Camera),
}

impl NodeAttribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            NodeAttribute::Null => AttributeKind::Null,
            NodeAttribute::Mesh(_) => AttributeKind::Mesh,
            NodeAttribute::Light(_) => AttributeKind::Light,
            NodeAttribute::Camera(_) => AttributeKind::Camera,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub transform: NodeTransform,
    pub attribute: Option<NodeAttribute>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), transform: NodeTransform::default(), attribute: None, children: Vec::new() }
    }

    pub fn with_attribute(mut self, attribute: NodeAttribute) -> Self {
        self.attribute = Some(attribute);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute_kind(&self) -> Option<AttributeKind> {
        self.attribute.as_ref().map(|a| a.kind())
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.attribute {
            Some(NodeAttribute::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.attribute {
            Some(NodeAttribute::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Pre-order visit of this node and all its descendants.
    pub fn visit<'a, F: FnMut(&'a Node)>(&'a self, f: &mut F) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |node| {
            if node.mesh().is_some() {
                count += 1;
            }
        });
        count
    }
}
