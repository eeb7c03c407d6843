// Copyright @yucwang 2026

pub mod import_export;
pub mod layer_element;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod scene_matcher;
pub mod session;
pub mod tangent_basis;
