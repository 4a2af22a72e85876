//! Graph node types.

use serde::Serialize;
use std::fmt;

use crate::manifest::{dev_only_edges, visible_edges, DependencyMap, PackageManifest, Repository};

/// Lifecycle of a node.
///
/// `Unseen → Queued → InFlight → {Resolved | Failed}`. Terminal statuses are
/// never left except by a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Stub created by lazy expansion, not scheduled.
    Unseen,
    /// Waiting in the frontier.
    Queued,
    /// Submitted to the worker pool.
    InFlight,
    Resolved,
    Failed,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unseen => "unseen",
            Self::Queued => "queued",
            Self::InFlight => "in-flight",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One package in the dependency graph, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub name: String,
    /// Concrete version once resolved; the requested specifier before that.
    pub version: String,
    /// Specifier that first referenced this node.
    pub requested: String,
    pub description: Option<String>,
    pub dependencies: DependencyMap,
    pub dev_dependencies: DependencyMap,
    pub homepage: Option<String>,
    pub repository: Option<Repository>,
    pub license: Option<String>,
    pub status: NodeStatus,
    pub depth: usize,
    pub has_no_dependencies: bool,
    /// Children have been materialized (as stubs or queued items).
    pub expanded: bool,
    /// Node that first referenced this one. `None` for the root.
    pub parent: Option<String>,
}

impl GraphNode {
    /// Root node built from the user-supplied manifest.
    pub fn root(manifest: PackageManifest, include_dev: bool) -> Self {
        let mut node = Self::from_manifest(manifest, 0, None, include_dev);
        node.requested = node.version.clone();
        node.expanded = true;
        node
    }

    /// Placeholder for a referenced but not yet resolved package.
    pub fn stub(
        name: impl Into<String>,
        spec: impl Into<String>,
        depth: usize,
        parent: Option<String>,
        status: NodeStatus,
    ) -> Self {
        let spec = spec.into();
        Self {
            name: name.into(),
            version: spec.clone(),
            requested: spec,
            description: None,
            dependencies: DependencyMap::new(),
            dev_dependencies: DependencyMap::new(),
            homepage: None,
            repository: None,
            license: None,
            status,
            depth,
            has_no_dependencies: false,
            expanded: false,
            parent,
        }
    }

    /// Node for a successfully fetched manifest.
    ///
    /// `name` is the dependency key, which differs from the manifest name for
    /// `npm:` aliases.
    pub fn resolved(
        name: &str,
        spec: &str,
        manifest: PackageManifest,
        depth: usize,
        parent: Option<String>,
        include_dev: bool,
    ) -> Self {
        let mut node = Self::from_manifest(manifest, depth, parent, include_dev);
        node.name = name.to_string();
        node.requested = spec.to_string();
        node
    }

    /// Node for a fetch that failed. The node stays visible as a leaf.
    pub fn failed(
        name: &str,
        spec: &str,
        reason: impl fmt::Display,
        depth: usize,
        parent: Option<String>,
    ) -> Self {
        let mut node = Self::stub(name, spec, depth, parent, NodeStatus::Failed);
        node.description = Some(format!("Failed to load: {}", reason));
        node.has_no_dependencies = true;
        node
    }

    fn from_manifest(
        manifest: PackageManifest,
        depth: usize,
        parent: Option<String>,
        include_dev: bool,
    ) -> Self {
        let has_no_dependencies = manifest.has_no_dependencies(include_dev);
        Self {
            requested: String::new(),
            name: manifest.name,
            version: manifest.version,
            description: manifest.description,
            dependencies: manifest.dependencies,
            dev_dependencies: manifest.dev_dependencies,
            homepage: manifest.homepage,
            repository: manifest.repository,
            license: manifest.license,
            status: NodeStatus::Resolved,
            depth,
            has_no_dependencies,
            expanded: false,
            parent,
        }
    }

    /// Edges visible under the given dev visibility.
    pub fn visible_dependencies(&self, include_dev: bool) -> Vec<(&str, &str)> {
        visible_edges(&self.dependencies, &self.dev_dependencies, include_dev)
    }

    /// Dev dependencies not shadowed by a regular dependency of the same name.
    pub fn dev_only_dependencies(&self) -> Vec<(&str, &str)> {
        dev_only_edges(&self.dependencies, &self.dev_dependencies).collect()
    }

    /// Recomputes the leaf marker after a visibility change.
    pub fn refresh_leaf_marker(&mut self, include_dev: bool) {
        if self.status == NodeStatus::Resolved {
            self.has_no_dependencies = self.dependencies.is_empty()
                && (!include_dev || self.dev_dependencies.is_empty());
        }
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0 && self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;

    #[test]
    fn test_status_display() {
        assert_eq!(NodeStatus::InFlight.to_string(), "in-flight");
        assert_eq!(NodeStatus::Unseen.to_string(), "unseen");
    }

    #[test]
    fn test_root_node() {
        let manifest = PackageManifest::new("app", "1.0.0").with_dependency("a", "^1");
        let node = GraphNode::root(manifest, false);

        assert!(node.is_root());
        assert_eq!(node.status, NodeStatus::Resolved);
        assert!(node.expanded);
        assert!(!node.has_no_dependencies);
    }

    #[test]
    fn test_resolved_uses_dependency_key() {
        let manifest = PackageManifest::new("string-width", "4.2.3");
        let node = GraphNode::resolved(
            "string-width-cjs",
            "npm:string-width@^4",
            manifest,
            2,
            Some("cliui".to_string()),
            false,
        );

        assert_eq!(node.name, "string-width-cjs");
        assert_eq!(node.version, "4.2.3");
        assert_eq!(node.requested, "npm:string-width@^4");
        assert!(node.has_no_dependencies);
    }

    #[test]
    fn test_failed_node() {
        let err = RegistryError::NotFound {
            name: "ghost".to_string(),
        };
        let node = GraphNode::failed("ghost", "^1.0.0", &err, 1, Some("app".to_string()));

        assert_eq!(node.status, NodeStatus::Failed);
        let description = node.description.unwrap();
        assert!(description.starts_with("Failed to load:"));
        assert!(description.contains("not found"));
        assert!(node.has_no_dependencies);
        assert!(node.dependencies.is_empty());
    }

    #[test]
    fn test_refresh_leaf_marker() {
        let manifest = PackageManifest::new("x", "1.0.0").with_dev_dependency("d", "*");
        let mut node = GraphNode::resolved("x", "*", manifest, 1, None, false);
        assert!(node.has_no_dependencies);

        node.refresh_leaf_marker(true);
        assert!(!node.has_no_dependencies);
        assert_eq!(node.visible_dependencies(true), vec![("d", "*")]);
    }

    #[test]
    fn test_dev_only_dependencies_skip_shadowed_names() {
        let manifest = PackageManifest::new("x", "1.0.0")
            .with_dependency("a", "^1")
            .with_dev_dependency("a", "^2")
            .with_dev_dependency("d", "*");
        let node = GraphNode::resolved("x", "*", manifest, 1, None, true);

        assert_eq!(node.dev_only_dependencies(), vec![("d", "*")]);
        assert_eq!(node.visible_dependencies(true), vec![("a", "^1"), ("d", "*")]);
    }
}
