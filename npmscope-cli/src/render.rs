//! Text and JSON rendering of a resolved graph.

use std::collections::HashSet;
use std::fmt::Write;

use npmscope::graph::{GraphNode, GraphSnapshot, NodeStatus};

/// Marker appended to a package already printed elsewhere in the tree.
const REPEAT_MARKER: &str = "(*)";

/// Renders the graph as an indented tree rooted at the manifest.
///
/// Each package is expanded at its first occurrence only; later occurrences,
/// including cycles back to an ancestor, are printed once with a marker.
pub fn render_tree(snapshot: &GraphSnapshot) -> String {
    let mut out = String::new();
    let Some(root) = snapshot.root_node() else {
        return out;
    };

    let mut printed = HashSet::new();
    printed.insert(root.name.as_str());
    let _ = writeln!(out, "{}", label(root));
    render_children(snapshot, root, "", &mut printed, &mut out);
    out
}

fn render_children<'a>(
    snapshot: &'a GraphSnapshot,
    node: &'a GraphNode,
    prefix: &str,
    printed: &mut HashSet<&'a str>,
    out: &mut String,
) {
    let children = snapshot.children(&node.name);
    let count = children.len();

    for (i, child) in children.into_iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };

        if !printed.insert(child.name.as_str()) {
            let _ = writeln!(out, "{}{}{} {}", prefix, branch, label(child), REPEAT_MARKER);
            continue;
        }

        let _ = writeln!(out, "{}{}{}", prefix, branch, label(child));
        let next_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_children(snapshot, child, &next_prefix, printed, out);
    }
}

fn label(node: &GraphNode) -> String {
    match node.status {
        NodeStatus::Resolved => format!("{}@{}", node.name, node.version),
        NodeStatus::Failed => format!(
            "{} [{}]",
            node.name,
            node.description.as_deref().unwrap_or("failed")
        ),
        status => format!("{}@{} [{}]", node.name, node.requested, status),
    }
}

/// One-line session summary.
pub fn summary(snapshot: &GraphSnapshot, elapsed_ms: u128) -> String {
    let counts = snapshot.counts();
    format!(
        "{} packages: {} resolved, {} failed ({} ms)",
        snapshot.len(),
        counts.resolved,
        counts.failed,
        elapsed_ms
    )
}

/// Pretty-printed JSON snapshot.
pub fn render_json(snapshot: &GraphSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use npmscope::graph::GraphState;
    use npmscope::manifest::PackageManifest;

    fn resolved(name: &str, manifest: PackageManifest, depth: usize, parent: &str) -> GraphNode {
        GraphNode::resolved(name, "^1", manifest, depth, Some(parent.to_string()), false)
    }

    fn snapshot() -> GraphSnapshot {
        let mut state = GraphState::new();
        state.set_root(GraphNode::root(
            PackageManifest::new("app", "1.0.0")
                .with_dependency("a", "^1")
                .with_dependency("b", "^1")
                .with_dependency("ghost", "^1"),
            false,
        ));
        state.upsert(resolved(
            "a",
            PackageManifest::new("a", "1.2.0").with_dependency("b", "^1"),
            1,
            "app",
        ));
        state.upsert(resolved(
            "b",
            PackageManifest::new("b", "1.0.0").with_dependency("a", "^1"),
            1,
            "app",
        ));
        state.upsert(GraphNode::failed(
            "ghost",
            "^1",
            "package 'ghost' not found in registry",
            1,
            Some("app".to_string()),
        ));
        state.snapshot(false, 1, None)
    }

    #[test]
    fn test_tree_marks_repeats_and_cycles() {
        let tree = render_tree(&snapshot());
        let expected = "\
app@1.0.0
├── a@1.2.0
│   └── b@1.0.0
│       └── a@1.2.0 (*)
├── b@1.0.0 (*)
└── ghost [Failed to load: package 'ghost' not found in registry]
";
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_empty_snapshot_renders_nothing() {
        assert_eq!(render_tree(&GraphSnapshot::default()), "");
    }

    #[test]
    fn test_summary_counts_statuses() {
        let line = summary(&snapshot(), 42);
        assert_eq!(line, "4 packages: 3 resolved, 1 failed (42 ms)");
    }

    #[test]
    fn test_json_uses_camel_case() {
        let json = render_json(&snapshot()).unwrap();
        assert!(json.contains("\"includeDev\": false"));
        assert!(json.contains("\"hasNoDependencies\""));
    }
}
