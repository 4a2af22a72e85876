//! Mutable graph owned by the orchestrator, and its read-only snapshots.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};

use super::node::{GraphNode, NodeStatus};

/// Node counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub unseen: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub resolved: usize,
    pub failed: usize,
}

impl StatusCounts {
    /// Tallies the statuses of `nodes`.
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a GraphNode>) -> Self {
        let mut counts = Self::default();
        for node in nodes {
            match node.status {
                NodeStatus::Unseen => counts.unseen += 1,
                NodeStatus::Queued => counts.queued += 1,
                NodeStatus::InFlight => counts.in_flight += 1,
                NodeStatus::Resolved => counts.resolved += 1,
                NodeStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.unseen + self.queued + self.in_flight + self.resolved + self.failed
    }
}

/// Name-keyed node map plus the root name.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    nodes: BTreeMap<String, GraphNode>,
    root: Option<String>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the root node, replacing any previous graph.
    pub fn set_root(&mut self, node: GraphNode) {
        self.nodes.clear();
        self.root = Some(node.name.clone());
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Inserts or overwrites the node with the same name.
    pub fn upsert(&mut self, node: GraphNode) {
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn get(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut GraphNode> {
        self.nodes.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Updates the status of an existing node. Returns false if absent.
    pub fn set_status(&mut self, name: &str, status: NodeStatus) -> bool {
        match self.nodes.get_mut(name) {
            Some(node) => {
                node.status = status;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
        self.nodes.values_mut()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_nodes(self.nodes.values())
    }

    /// Names reachable from the root through edges visible under `include_dev`.
    pub fn reachable(&self, include_dev: bool) -> HashSet<String> {
        let mut seen = HashSet::new();
        let Some(root) = self.root.as_ref() else {
            return seen;
        };

        let mut queue = VecDeque::from([root.clone()]);
        seen.insert(root.clone());

        while let Some(name) = queue.pop_front() {
            let Some(node) = self.nodes.get(&name) else {
                continue;
            };
            for (child, _) in node.visible_dependencies(include_dev) {
                if self.nodes.contains_key(child) && seen.insert(child.to_string()) {
                    queue.push_back(child.to_string());
                }
            }
        }

        seen
    }

    /// Removes nodes unreachable from the root and returns their names.
    pub fn prune_unreachable(&mut self, include_dev: bool) -> Vec<String> {
        let keep = self.reachable(include_dev);
        let removed: Vec<String> = self
            .nodes
            .keys()
            .filter(|name| !keep.contains(*name))
            .cloned()
            .collect();
        for name in &removed {
            self.nodes.remove(name);
        }
        removed
    }

    /// Captures an immutable copy of the graph.
    pub fn snapshot(
        &self,
        include_dev: bool,
        generation: u64,
        last_error: Option<String>,
    ) -> GraphSnapshot {
        GraphSnapshot {
            root: self.root.clone(),
            include_dev,
            generation,
            last_error,
            nodes: self.nodes.clone(),
        }
    }
}

/// Point-in-time, read-only view of the graph for renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub root: Option<String>,
    pub include_dev: bool,
    pub generation: u64,
    pub last_error: Option<String>,
    pub nodes: BTreeMap<String, GraphNode>,
}

impl GraphSnapshot {
    pub fn get(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    pub fn root_node(&self) -> Option<&GraphNode> {
        self.root.as_deref().and_then(|r| self.nodes.get(r))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child nodes of `name` that exist in the graph, in dependency order.
    pub fn children(&self, name: &str) -> Vec<&GraphNode> {
        let Some(node) = self.nodes.get(name) else {
            return Vec::new();
        };
        node.visible_dependencies(self.include_dev)
            .into_iter()
            .filter_map(|(child, _)| self.nodes.get(child))
            .collect()
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_nodes(self.nodes.values())
    }
}
