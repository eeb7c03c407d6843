// Copyright @yucwang 2026

//! Lockstep walk over two scene trees.
//!
//! Nodes are paired by position only: same depth, same child slot. Names
//! are never compared. Any difference in shape or attribute kind stops the
//! walk at the first place it shows up.

use std::fmt;

use indicatif::{ ProgressBar, ProgressStyle };

use super::node::{ AttributeKind, Node };
use super::scene::Scene;
use super::tangent_basis::{ compute_tangent_basis, BasisError, BasisReport };

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MatchState {
    Matching,
    Mismatched,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchKind {
    AttributeKind { first: AttributeKind, second: AttributeKind },
    ChildCount { first: usize, second: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralMismatch {
    /// Slash-separated names of the first scene's nodes down to the mismatch.
    pub path: String,
    pub kind: MismatchKind,
}

impl fmt::Display for StructuralMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MismatchKind::AttributeKind { first, second } =>
                write!(f, "input meshes don't match at {}: {} vs {}", self.path, first, second),
            MismatchKind::ChildCount { first, second } =>
                write!(f, "input meshes don't match at {}: {} vs {} children", self.path, first, second),
        }
    }
}

impl std::error::Error for StructuralMismatch {}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMesh {
    pub path: String,
    pub error: BasisError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferReport {
    pub nodes_visited: usize,
    pub meshes_processed: Vec<(String, BasisReport)>,
    pub skipped: Vec<SkippedMesh>,
}

impl TransferReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub struct SceneMatcher {
    state: MatchState,
    report: TransferReport,
    progress: ProgressBar,
}

impl SceneMatcher {
    pub fn new(mesh_pairs: usize) -> Self {
        let progress = ProgressBar::new(mesh_pairs as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} meshes")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { state: MatchState::Matching, report: TransferReport::default(), progress }
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn report(&self) -> &TransferReport {
        &self.report
    }

    pub fn into_report(self) -> TransferReport {
        self.report
    }

    /// Walks the pair rooted at `first`/`second`. `first` receives the
    /// tangent and binormal layers.
    pub fn run(&mut self, first: &mut Node, second: &Node) -> Result<(), StructuralMismatch> {
        let mut path = String::new();
        let result = self.visit(first, second, &mut path);
        self.progress.finish_and_clear();
        self.state = match result {
            Ok(()) => MatchState::Done,
            Err(_) => MatchState::Mismatched,
        };
        result
    }

    fn visit(&mut self, first: &mut Node, second: &Node, path: &mut String) -> Result<(), StructuralMismatch> {
        let path_len = path.len();
        path.push('/');
        path.push_str(&first.name);
        self.report.nodes_visited += 1;

        if let (Some(first_kind), Some(second_kind)) = (first.attribute_kind(), second.attribute_kind()) {
            if first_kind != second_kind {
                return Err(self.mismatch(path, MismatchKind::AttributeKind { first: first_kind, second: second_kind }));
            }
        }

        if let (Some(dst), Some(src)) = (first.mesh_mut(), second.mesh()) {
            match compute_tangent_basis(dst, src) {
                Ok(basis) => {
                    log::info!("{}: {} tangent slots written, {} dropped",
                               path, basis.slots_written, basis.dropped_writes);
                    self.report.meshes_processed.push((path.clone(), basis));
                }
                Err(error) => {
                    log::error!("{}: mesh pair skipped: {}", path, error);
                    self.report.skipped.push(SkippedMesh { path: path.clone(), error });
                }
            }
            self.progress.inc(1);
        }

        if first.child_count() != second.child_count() {
            return Err(self.mismatch(path, MismatchKind::ChildCount {
                first: first.child_count(),
                second: second.child_count(),
            }));
        }

        for (first_child, second_child) in first.children.iter_mut().zip(second.children.iter()) {
            self.visit(first_child, second_child, path)?;
        }

        path.truncate(path_len);
        Ok(())
    }

    fn mismatch(&mut self, path: &str, kind: MismatchKind) -> StructuralMismatch {
        self.state = MatchState::Mismatched;
        let mismatch = StructuralMismatch { path: path.to_string(), kind };
        log::error!("------- ERROR! {} -------", mismatch);
        mismatch
    }
}

/// Transfers tangent space from `second` onto `first` for every mesh pair.
pub fn transfer_tangents(first: &mut Scene, second: &Scene) -> Result<TransferReport, StructuralMismatch> {
    let mut matcher = SceneMatcher::new(first.mesh_count());
    matcher.run(first.root_mut(), second.root())?;
    Ok(matcher.into_report())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layer_element::{ LayerElement, MappingMode };
    use crate::core::mesh::Mesh;
    use crate::core::node::{ Camera, Light, NodeAttribute };
    use crate::math::vector::vec4;

    fn mesh_node(name: &str, normal: (f64, f64, f64)) -> Node {
        let mut mesh = Mesh::new(vec![
            vec4(0.0, 0.0, 0.0, 1.0),
            vec4(1.0, 0.0, 0.0, 1.0),
            vec4(0.0, 1.0, 0.0, 1.0),
        ], vec![vec![0, 1, 2]]);
        mesh.normals.push(LayerElement::direct(MappingMode::ByControlPoint,
                                               vec![vec4(normal.0, normal.1, normal.2, 0.0); 3]));
        Node::new(name).with_attribute(NodeAttribute::Mesh(mesh))
    }

    fn rig(normal: (f64, f64, f64)) -> Scene {
        let root = Node::new("RootNode")
            .with_child(mesh_node("body", normal)
                .with_child(mesh_node("arm", normal)))
            .with_child(Node::new("lamp").with_attribute(NodeAttribute::Light(Light::default())))
            .with_child(Node::new("pivot"));
        Scene::with_root(root)
    }

    #[test]
    fn test_equal_shapes_finish_done() {
        let mut first = rig((0.0, 0.0, 1.0));
        let second = rig((1.0, 0.0, 0.0));
        let mut matcher = SceneMatcher::new(first.mesh_count());
        assert_eq!(matcher.state(), MatchState::Matching);
        matcher.run(first.root_mut(), second.root()).expect("walk failed");
        assert_eq!(matcher.state(), MatchState::Done);

        let report = matcher.into_report();
        assert!(report.is_clean());
        assert_eq!(report.nodes_visited, 5);
        let paths: Vec<&str> = report.meshes_processed.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["/RootNode/body", "/RootNode/body/arm"]);

        let arm = &first.root().children[0].children[0];
        let tangents = arm.mesh().and_then(|m| m.element_tangent(0)).expect("tangents written");
        assert_eq!(tangents.direct, vec![vec4(1.0, 0.0, 0.0, 0.0); 3]);
    }

    #[test]
    fn test_child_count_mismatch() {
        let mut first = rig((0.0, 0.0, 1.0));
        let mut second = rig((1.0, 0.0, 0.0));
        second.root_mut().children[2].children.push(Node::new("extra"));

        let err = transfer_tangents(&mut first, &second).expect_err("expected mismatch");
        assert_eq!(err.path, "/RootNode/pivot");
        assert_eq!(err.kind, MismatchKind::ChildCount { first: 0, second: 1 });
    }

    #[test]
    fn test_attribute_kind_mismatch() {
        let mut first = rig((0.0, 0.0, 1.0));
        let mut second = rig((1.0, 0.0, 0.0));
        second.root_mut().children[1].attribute = Some(NodeAttribute::Camera(Camera::default()));

        let mut matcher = SceneMatcher::new(first.mesh_count());
        let err = matcher.run(first.root_mut(), second.root()).expect_err("expected mismatch");
        assert_eq!(matcher.state(), MatchState::Mismatched);
        assert_eq!(err.kind, MismatchKind::AttributeKind { first: AttributeKind::Light, second: AttributeKind::Camera });
        assert_eq!(err.path, "/RootNode/lamp");
    }

    #[test]
    fn test_one_sided_attribute_is_not_compared() {
        let mut first = rig((0.0, 0.0, 1.0));
        let mut second = rig((1.0, 0.0, 0.0));
        second.root_mut().children[2].attribute = Some(NodeAttribute::Null);
        assert!(transfer_tangents(&mut first, &second).is_ok());
    }

    #[test]
    fn test_mesh_pair_failure_does_not_stop_walk() {
        let mut first = rig((0.0, 0.0, 1.0));
        let second = rig((1.0, 0.0, 0.0));
        if let Some(mesh) = first.root_mut().children[0].mesh_mut() {
            mesh.normals.clear();
        }

        let report = transfer_tangents(&mut first, &second).expect("walk failed");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, "/RootNode/body");
        assert_eq!(report.meshes_processed.len(), 1);
        assert_eq!(report.nodes_visited, 5);
    }

    #[test]
    fn test_names_are_ignored() {
        let mut first = rig((0.0, 0.0, 1.0));
        let mut second = rig((1.0, 0.0, 0.0));
        second.root_mut().children[0].name = String::from("something_else");
        let report = transfer_tangents(&mut first, &second).expect("walk failed");
        assert_eq!(report.meshes_processed.len(), 2);
    }
}
