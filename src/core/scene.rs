// Copyright @yucwang 2026

use std::fmt;
use std::str::FromStr;

use super::node::Node;

/// Version of the scene format written by this crate.
pub const FORMAT_VERSION: FormatVersion = FormatVersion { major: 1, minor: 0, revision: 0 };

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
}

impl FormatVersion {
    /// Files from the same or an older major version can be read.
    pub fn is_readable_by(&self, reader: &FormatVersion) -> bool {
        self.major <= reader.major
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        FORMAT_VERSION
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

impl FromStr for FormatVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u32, String> {
            match parts.next() {
                Some(p) => p.parse::<u32>().map_err(|_| format!("invalid version: {}", s)),
                None => Ok(0),
            }
        };
        let major = next()?;
        let minor = next()?;
        let revision = next()?;
        Ok(FormatVersion { major, minor, revision })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub version: FormatVersion,
    pub password: Option<String>,
    root: Node,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_root(Node::new("RootNode"))
    }

    pub fn with_root(root: Node) -> Self {
        Self { version: FORMAT_VERSION, password: None, root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn add_child(&mut self, node: Node) {
        self.root.children.push(node);
    }

    pub fn mesh_count(&self) -> usize {
        self.root.mesh_count()
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.root.visit(&mut |_| count += 1);
        count
    }
}
