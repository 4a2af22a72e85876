//! Resolution orchestrator.
//!
//! Single-owner scheduler: every mutation goes through `&mut self`, one
//! completion at a time. Fetches run on the [`WorkerPool`]; their handles are
//! collected in a `FuturesUnordered` and drained by [`Orchestrator::step`].

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::{FetchFailure, NodeError};
use super::work::{WorkItem, WorkPurpose, WorkTracker};
use super::{ResolverConfig, TraversalMode};
use crate::graph::{GraphNode, GraphSnapshot, GraphState, NodeStatus, Progress};
use crate::manifest::{parse_root_manifest, ManifestError, PackageManifest};
use crate::pool::{FetchTask, PoolStats, WorkerPool};
use crate::registry::ManifestSource;

/// Result of [`Orchestrator::expand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// No node with that name.
    Unknown,
    /// A fetch for the node is queued or running.
    AlreadyLoading,
    /// Children were already materialized.
    AlreadyExpanded,
    /// Failed nodes have nothing to expand.
    NotExpandable,
    /// The stub was scheduled for fetching; children follow on resolution.
    Scheduled,
    /// Children of an already-resolved node were materialized as stubs.
    Expanded,
}

struct Completion {
    generation: u64,
    item: WorkItem,
    result: Result<PackageManifest, FetchFailure>,
}

/// Drives incremental resolution of one root manifest at a time.
pub struct Orchestrator<S: ManifestSource> {
    source: Arc<S>,
    pool: WorkerPool,
    config: ResolverConfig,
    include_dev: bool,
    graph: GraphState,
    tracker: WorkTracker,
    running: FuturesUnordered<BoxFuture<'static, Completion>>,
    generation: u64,
    /// Terminal transitions in the current session.
    session_completed: usize,
    errors: Vec<NodeError>,
    progress_tx: watch::Sender<Progress>,
    fetches_dispatched: usize,
}

impl<S: ManifestSource> Orchestrator<S> {
    /// Creates an orchestrator with its own worker pool.
    pub fn new(source: Arc<S>, config: ResolverConfig) -> Self {
        let pool = WorkerPool::new(config.workers.max(1), "registry");
        Self::with_pool(source, pool, config)
    }

    /// Creates an orchestrator that submits to an existing pool.
    pub fn with_pool(source: Arc<S>, pool: WorkerPool, config: ResolverConfig) -> Self {
        let (progress_tx, _) = watch::channel(Progress::default());
        Self {
            source,
            pool,
            include_dev: config.include_dev,
            config,
            graph: GraphState::new(),
            tracker: WorkTracker::new(),
            running: FuturesUnordered::new(),
            generation: 0,
            session_completed: 0,
            errors: Vec::new(),
            progress_tx,
            fetches_dispatched: 0,
        }
    }

    // =========================================================================
    // Session control
    // =========================================================================

    /// Starts a new session for `root`, discarding any previous graph.
    ///
    /// The root is inserted Resolved at depth 0 and its direct dependencies
    /// are queued at depth 1. Fetching begins on the next [`step`](Self::step).
    pub fn analyze(&mut self, root: PackageManifest) {
        self.reset();

        info!(
            root = %root.name,
            version = %root.version,
            dependencies = root.dependencies.len(),
            dev_dependencies = root.dev_dependencies.len(),
            include_dev = self.include_dev,
            max_depth = self.max_depth(),
            mode = %self.config.mode,
            workers = self.pool.capacity(),
            "Starting dependency resolution"
        );

        let root_name = root.name.clone();
        self.graph.set_root(GraphNode::root(root, self.include_dev));
        self.tracker.mark_completed(&root_name);
        self.enqueue_children(&root_name);
        self.publish_progress(None, 0);
    }

    /// Parses `package.json` text and starts a session for it.
    ///
    /// Malformed input is rejected before any state changes.
    pub fn analyze_json(&mut self, text: &str) -> Result<(), ManifestError> {
        let root = parse_root_manifest(text)?;
        self.analyze(root);
        Ok(())
    }

    /// Discards the graph, the frontier and all errors, and starts a new
    /// generation. Outstanding fetches are detached; their results are dropped.
    pub fn reset(&mut self) {
        let detached = self.running.len();
        self.generation += 1;
        self.graph.clear();
        self.tracker.clear();
        self.errors.clear();
        self.running = FuturesUnordered::new();
        self.session_completed = 0;
        self.progress_tx.send_replace(Progress::default());

        debug!(generation = self.generation, detached, "Resolver reset");
    }

    /// Queues a package at depth 1 under the root.
    ///
    /// Returns false when there is no root or the name was already seen in
    /// this session; terminal nodes are never re-fetched.
    pub fn schedule(&mut self, name: &str, spec: &str) -> bool {
        let Some(root) = self.graph.root().map(str::to_string) else {
            return false;
        };
        let queued = self.enqueue(WorkItem::traverse(name, spec, 1, Some(root)));
        if queued {
            self.publish_progress(None, 0);
        }
        queued
    }

    // =========================================================================
    // Driving loop
    // =========================================================================

    /// Processes completions until nothing is pending or in flight.
    pub async fn run_until_idle(&mut self) -> Arc<GraphSnapshot> {
        while self.step().await {}
        self.snapshot()
    }

    /// Dispatches what the pool can take and applies the next completion.
    ///
    /// Returns false once the session is idle.
    pub async fn step(&mut self) -> bool {
        self.dispatch();

        while let Some(completion) = self.running.next().await {
            if completion.generation != self.generation {
                debug!(
                    package = %completion.item.name,
                    generation = completion.generation,
                    current = self.generation,
                    "Ignoring result from previous session"
                );
                continue;
            }

            self.apply(completion);
            self.dispatch();
            self.finish_if_idle();
            return true;
        }

        self.finish_if_idle();
        false
    }

    /// Submits pending items while the pool has free slots. One item is
    /// always submitted when nothing of this session is running.
    fn dispatch(&mut self) {
        loop {
            let stats = self.pool.stats();
            if stats.available == 0 && self.tracker.in_flight_len() > 0 {
                break;
            }
            let Some(item) = self.tracker.next_pending() else {
                break;
            };

            self.graph.set_status(&item.name, NodeStatus::InFlight);
            self.publish_progress(Some(item.name.clone()), item.depth);
            debug!(
                package = %item.name,
                spec = %item.spec,
                depth = item.depth,
                available = stats.available,
                "Dispatching fetch"
            );

            let task = FetchTask::new(item.name.clone(), item.spec.clone(), self.config.fetch);
            let handle = self.pool.submit(task.run(Arc::clone(&self.source)));
            let generation = self.generation;
            self.fetches_dispatched += 1;

            self.running.push(
                async move {
                    let result = match handle.await {
                        Ok(inner) => inner.map_err(FetchFailure::from),
                        Err(pool_error) => Err(FetchFailure::from(pool_error)),
                    };
                    Completion {
                        generation,
                        item,
                        result,
                    }
                }
                .boxed(),
            );
        }
    }

    fn apply(&mut self, completion: Completion) {
        let Completion { item, result, .. } = completion;

        if !self.tracker.complete(&item.name) {
            debug!(package = %item.name, "Ignoring result for forgotten package");
            return;
        }
        self.session_completed += 1;

        match result {
            Ok(manifest) => {
                debug!(
                    package = %item.name,
                    version = %manifest.version,
                    depth = item.depth,
                    "Package resolved"
                );
                let node = GraphNode::resolved(
                    &item.name,
                    &item.spec,
                    manifest,
                    item.depth,
                    item.parent.clone(),
                    self.include_dev,
                );
                self.graph.upsert(node);

                match item.purpose {
                    WorkPurpose::Expand => self.materialize_stubs(&item.name),
                    WorkPurpose::Traverse if self.traverses_past(item.depth) => {
                        self.enqueue_children(&item.name)
                    }
                    WorkPurpose::Traverse => {}
                }
            }
            Err(failure) => {
                warn!(
                    package = %item.name,
                    spec = %item.spec,
                    error = %failure,
                    "Package failed to resolve"
                );
                self.graph.upsert(GraphNode::failed(
                    &item.name,
                    &item.spec,
                    &failure,
                    item.depth,
                    item.parent.clone(),
                ));
                self.errors.push(NodeError {
                    name: item.name.clone(),
                    failure,
                });
            }
        }

        self.publish_progress(None, 0);
    }

    fn finish_if_idle(&mut self) {
        if !self.tracker.is_idle() || self.session_completed == 0 {
            return;
        }

        let counts = self.graph.counts();
        info!(
            nodes = self.graph.len(),
            resolved = counts.resolved,
            failed = counts.failed,
            fetched = self.session_completed,
            peak_in_flight = self.pool.stats().peak_in_flight,
            "Dependency resolution complete"
        );
        self.session_completed = 0;
        self.progress_tx.send_replace(Progress::default());
    }

    // =========================================================================
    // Graph growth
    // =========================================================================

    fn max_depth(&self) -> usize {
        self.config.max_depth.max(1)
    }

    /// Whether a node resolved by traversal at `depth` queues its children.
    fn traverses_past(&self, depth: usize) -> bool {
        match self.config.mode {
            TraversalMode::Eager => depth < self.max_depth(),
            TraversalMode::Lazy => false,
        }
    }

    fn enqueue(&mut self, item: WorkItem) -> bool {
        let name = item.name.clone();
        let spec = item.spec.clone();
        let depth = item.depth;
        let parent = item.parent.clone();

        if !self.tracker.enqueue(item) {
            return false;
        }
        match self.graph.get_mut(&name) {
            Some(node) => node.status = NodeStatus::Queued,
            None => self
                .graph
                .upsert(GraphNode::stub(name, spec, depth, parent, NodeStatus::Queued)),
        }
        true
    }

    /// Queues every visible dependency of `name` that has not been seen.
    fn enqueue_children(&mut self, name: &str) {
        let Some(node) = self.graph.get_mut(name) else {
            return;
        };
        node.expanded = true;
        let depth = node.depth + 1;
        let children: Vec<(String, String)> = node
            .visible_dependencies(self.include_dev)
            .into_iter()
            .map(|(n, s)| (n.to_string(), s.to_string()))
            .collect();

        for (child, spec) in children {
            self.enqueue(WorkItem::traverse(child, spec, depth, Some(name.to_string())));
        }
    }

    /// Queues the dev-only dependencies of `name` that have not been seen.
    fn enqueue_dev_children(&mut self, name: &str) {
        let Some(node) = self.graph.get(name) else {
            return;
        };
        let depth = node.depth + 1;
        let children: Vec<(String, String)> = node
            .dev_only_dependencies()
            .into_iter()
            .map(|(n, s)| (n.to_string(), s.to_string()))
            .collect();

        for (child, spec) in children {
            self.enqueue(WorkItem::traverse(child, spec, depth, Some(name.to_string())));
        }
    }

    /// Creates unscheduled stubs for dependencies of `name` not yet in the graph.
    fn materialize_stubs(&mut self, name: &str) {
        let Some(node) = self.graph.get(name) else {
            return;
        };
        let depth = node.depth + 1;
        let children: Vec<(String, String)> = node
            .visible_dependencies(self.include_dev)
            .into_iter()
            .filter(|(n, _)| !self.graph.contains(n))
            .map(|(n, s)| (n.to_string(), s.to_string()))
            .collect();

        if let Some(node) = self.graph.get_mut(name) {
            node.expanded = true;
        }

        for (child, spec) in children {
            self.graph.upsert(GraphNode::stub(
                child,
                spec,
                depth,
                Some(name.to_string()),
                NodeStatus::Unseen,
            ));
        }
    }

    /// Opens one node on explicit request.
    ///
    /// Idempotent: loading, expanded and failed nodes are left alone.
    pub fn expand(&mut self, name: &str) -> ExpandOutcome {
        let Some(node) = self.graph.get(name) else {
            return ExpandOutcome::Unknown;
        };
        let status = node.status;
        let expanded = node.expanded;
        let item = WorkItem {
            name: node.name.clone(),
            spec: node.requested.clone(),
            depth: node.depth,
            parent: node.parent.clone(),
            purpose: WorkPurpose::Expand,
        };

        let outcome = match status {
            NodeStatus::Queued | NodeStatus::InFlight => ExpandOutcome::AlreadyLoading,
            NodeStatus::Failed => ExpandOutcome::NotExpandable,
            NodeStatus::Resolved if expanded => ExpandOutcome::AlreadyExpanded,
            NodeStatus::Resolved => {
                self.materialize_stubs(name);
                ExpandOutcome::Expanded
            }
            NodeStatus::Unseen => {
                if self.enqueue(item) {
                    self.publish_progress(None, 0);
                    ExpandOutcome::Scheduled
                } else {
                    ExpandOutcome::AlreadyLoading
                }
            }
        };

        debug!(package = name, outcome = ?outcome, "Expand requested");
        outcome
    }

    /// Shows or hides dev dependencies.
    ///
    /// Turning visibility on adds the dev-only names of every expanded node.
    /// The root and nodes that traversal would continue past queue them;
    /// nodes opened by [`expand`](Self::expand) get `Unseen` stubs instead.
    /// Turning it off removes nodes that are no longer reachable from the
    /// root; resolved regular nodes are never fetched again.
    pub fn set_include_dev(&mut self, include_dev: bool) {
        if include_dev == self.include_dev {
            return;
        }
        self.include_dev = include_dev;

        for node in self.graph.nodes_mut() {
            node.refresh_leaf_marker(include_dev);
        }

        if include_dev {
            let parents: Vec<(String, bool)> = self
                .graph
                .nodes()
                .filter(|n| n.status == NodeStatus::Resolved && n.expanded)
                .map(|n| (n.name.clone(), n.is_root() || self.traverses_past(n.depth)))
                .collect();
            for (parent, traverse) in &parents {
                if *traverse {
                    self.enqueue_dev_children(parent);
                } else {
                    self.materialize_stubs(parent);
                }
            }
            info!(
                queued = self.tracker.pending_len(),
                "Dev dependencies enabled"
            );
        } else {
            let removed = self.graph.prune_unreachable(false);
            for name in &removed {
                self.tracker.forget(name);
            }
            info!(pruned = removed.len(), "Dev dependencies disabled");
        }

        self.publish_progress(None, 0);
    }

    // =========================================================================
    // Observation
    // =========================================================================

    fn publish_progress(&mut self, package: Option<String>, level: usize) {
        let progress = if self.tracker.is_idle() && self.session_completed == 0 {
            Progress::default()
        } else {
            let previous = self.progress_tx.borrow().clone();
            Progress {
                current: self.session_completed,
                total: self.session_completed
                    + self.tracker.pending_len()
                    + self.tracker.in_flight_len(),
                level: if package.is_some() { level } else { previous.level },
                current_package: package.or(previous.current_package),
            }
        };
        self.progress_tx.send_replace(progress);
    }

    /// Immutable copy of the graph.
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        Arc::new(
            self.graph
                .snapshot(self.include_dev, self.generation, self.last_error()),
        )
    }

    /// Current progress.
    pub fn progress(&self) -> Progress {
        self.progress_tx.borrow().clone()
    }

    /// Receiver that observes every progress update.
    pub fn subscribe_progress(&self) -> watch::Receiver<Progress> {
        self.progress_tx.subscribe()
    }

    /// Most recent node failure of this session, formatted for display.
    pub fn last_error(&self) -> Option<String> {
        self.errors.last().map(ToString::to_string)
    }

    /// All node failures of this session, oldest first.
    pub fn errors(&self) -> &[NodeError] {
        &self.errors
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn include_dev(&self) -> bool {
        self.include_dev
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// True when nothing is queued or running.
    pub fn is_idle(&self) -> bool {
        self.tracker.is_idle()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Total fetches submitted to the pool over the orchestrator's lifetime.
    pub fn fetches_dispatched(&self) -> usize {
        self.fetches_dispatched
    }

    /// Work bookkeeping, for consistency checks.
    pub fn tracker(&self) -> &WorkTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// In-memory source: name → manifest, unknown names are NotFound.
    #[derive(Default)]
    struct MapSource {
        packages: HashMap<String, PackageManifest>,
        calls: Mutex<Vec<String>>,
    }

    impl MapSource {
        fn with(mut self, manifest: PackageManifest) -> Self {
            self.packages.insert(manifest.name.clone(), manifest);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl ManifestSource for MapSource {
        async fn resolve(&self, name: &str, _spec: &str) -> Result<PackageManifest, RegistryError> {
            self.calls.lock().push(name.to_string());
            tokio::task::yield_now().await;
            self.packages
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::NotFound {
                    name: name.to_string(),
                })
        }
    }

    fn chain_source() -> Arc<MapSource> {
        Arc::new(
            MapSource::default()
                .with(PackageManifest::new("a", "1.0.0").with_dependency("b", "^1"))
                .with(PackageManifest::new("b", "1.0.0").with_dependency("c", "^1"))
                .with(PackageManifest::new("c", "1.0.0")),
        )
    }

    fn root() -> PackageManifest {
        PackageManifest::new("app", "1.0.0").with_dependency("a", "^1")
    }

    #[tokio::test]
    async fn test_analyze_seeds_root() {
        let mut orchestrator = Orchestrator::new(chain_source(), ResolverConfig::default());
        orchestrator.analyze(root());

        let snapshot = orchestrator.snapshot();
        let app = snapshot.get("app").unwrap();
        assert_eq!(app.status, NodeStatus::Resolved);
        assert_eq!(app.depth, 0);
        assert_eq!(snapshot.get("a").unwrap().status, NodeStatus::Queued);
        assert_eq!(orchestrator.progress().total, 1);
    }

    #[tokio::test]
    async fn test_depth_bound() {
        let source = chain_source();
        let config = ResolverConfig::default().with_max_depth(2);
        let mut orchestrator = Orchestrator::new(Arc::clone(&source), config);
        orchestrator.analyze(root());

        let snapshot = orchestrator.run_until_idle().await;
        assert_eq!(source.calls(), vec!["a", "b"]);
        assert!(snapshot.get("c").is_none());
        assert_eq!(snapshot.get("b").unwrap().depth, 2);
        assert!(orchestrator.progress().is_idle());
    }

    #[tokio::test]
    async fn test_lazy_mode_defers_children() {
        let source = chain_source();
        let config = ResolverConfig::default().with_mode(TraversalMode::Lazy);
        let mut orchestrator = Orchestrator::new(Arc::clone(&source), config);
        orchestrator.analyze(root());
        orchestrator.run_until_idle().await;

        assert_eq!(source.calls(), vec!["a"]);
        assert_eq!(orchestrator.expand("a"), ExpandOutcome::Expanded);
        assert_eq!(orchestrator.expand("a"), ExpandOutcome::AlreadyExpanded);
        assert_eq!(
            orchestrator.snapshot().get("b").unwrap().status,
            NodeStatus::Unseen
        );

        assert_eq!(orchestrator.expand("b"), ExpandOutcome::Scheduled);
        assert_eq!(orchestrator.expand("b"), ExpandOutcome::AlreadyLoading);
        let snapshot = orchestrator.run_until_idle().await;

        let b = snapshot.get("b").unwrap();
        assert_eq!(b.status, NodeStatus::Resolved);
        assert!(b.expanded);
        assert_eq!(snapshot.get("c").unwrap().status, NodeStatus::Unseen);
        assert_eq!(source.calls(), vec!["a", "b"]);
    }

    fn dev_source() -> Arc<MapSource> {
        Arc::new(
            MapSource::default()
                .with(
                    PackageManifest::new("a", "1.0.0")
                        .with_dependency("b", "^1")
                        .with_dev_dependency("d", "^1"),
                )
                .with(PackageManifest::new("b", "1.0.0"))
                .with(PackageManifest::new("d", "1.0.0"))
                .with(PackageManifest::new("tool", "1.0.0")),
        )
    }

    fn dev_root() -> PackageManifest {
        root().with_dev_dependency("tool", "^1")
    }

    #[tokio::test]
    async fn test_dev_toggle_keeps_lazy_stubs_unfetched() {
        let source = dev_source();
        let config = ResolverConfig::default().with_mode(TraversalMode::Lazy);
        let mut orchestrator = Orchestrator::new(Arc::clone(&source), config);
        orchestrator.analyze(dev_root());
        orchestrator.run_until_idle().await;
        assert_eq!(orchestrator.expand("a"), ExpandOutcome::Expanded);

        orchestrator.set_include_dev(true);
        let snapshot = orchestrator.run_until_idle().await;

        // Root dev dependencies are fetched; everything under `a` stays a stub.
        assert_eq!(source.calls(), vec!["a", "tool"]);
        assert_eq!(snapshot.get("tool").unwrap().status, NodeStatus::Resolved);
        assert_eq!(snapshot.get("b").unwrap().status, NodeStatus::Unseen);
        let d = snapshot.get("d").unwrap();
        assert_eq!(d.status, NodeStatus::Unseen);
        assert_eq!(d.depth, 2);
        assert_eq!(d.parent.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_dev_toggle_respects_depth_bound_after_expand() {
        let source = dev_source();
        let config = ResolverConfig::default().with_max_depth(1);
        let mut orchestrator = Orchestrator::new(Arc::clone(&source), config);
        orchestrator.analyze(root());
        orchestrator.run_until_idle().await;
        assert_eq!(orchestrator.expand("a"), ExpandOutcome::Expanded);

        orchestrator.set_include_dev(true);
        let snapshot = orchestrator.run_until_idle().await;

        assert_eq!(source.calls(), vec!["a"]);
        assert_eq!(snapshot.get("b").unwrap().status, NodeStatus::Unseen);
        assert_eq!(snapshot.get("d").unwrap().status, NodeStatus::Unseen);
        assert!(snapshot
            .nodes
            .values()
            .all(|n| n.depth <= 1 || n.status == NodeStatus::Unseen));
    }

    #[tokio::test]
    async fn test_dev_toggle_queues_within_depth_bound() {
        let source = dev_source();
        let mut orchestrator = Orchestrator::new(Arc::clone(&source), ResolverConfig::default());
        orchestrator.analyze(root());
        orchestrator.run_until_idle().await;
        assert_eq!(source.calls(), vec!["a", "b"]);

        orchestrator.set_include_dev(true);
        let snapshot = orchestrator.run_until_idle().await;

        assert_eq!(source.calls(), vec!["a", "b", "d"]);
        assert_eq!(snapshot.get("d").unwrap().status, NodeStatus::Resolved);
        assert_eq!(snapshot.get("d").unwrap().depth, 2);
    }

    #[tokio::test]
    async fn test_progress_names_started_fetch() {
        let mut orchestrator = Orchestrator::new(chain_source(), ResolverConfig::default());
        orchestrator.analyze(root());
        assert_eq!(orchestrator.progress().current_package, None);

        assert!(orchestrator.step().await);
        // `a` finished and `b` was dispatched in the same step.
        let progress = orchestrator.progress();
        assert_eq!(progress.current, 1);
        assert_eq!(progress.current_package.as_deref(), Some("b"));
        assert_eq!(progress.level, 2);
    }

    #[tokio::test]
    async fn test_expand_unknown_and_failed() {
        let mut orchestrator = Orchestrator::new(
            Arc::new(MapSource::default()),
            ResolverConfig::default(),
        );
        orchestrator.analyze(PackageManifest::new("app", "1.0.0").with_dependency("ghost", "1"));
        orchestrator.run_until_idle().await;

        assert_eq!(orchestrator.expand("nope"), ExpandOutcome::Unknown);
        assert_eq!(orchestrator.expand("ghost"), ExpandOutcome::NotExpandable);
        assert_eq!(orchestrator.expand("app"), ExpandOutcome::AlreadyExpanded);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let mut orchestrator = Orchestrator::new(chain_source(), ResolverConfig::default());
        orchestrator.analyze(root());
        let generation = orchestrator.generation();

        orchestrator.reset();
        assert_eq!(orchestrator.generation(), generation + 1);
        assert!(orchestrator.snapshot().is_empty());
        assert!(orchestrator.is_idle());
        assert!(!orchestrator.step().await);
    }

    #[tokio::test]
    async fn test_schedule_requires_root_and_dedups() {
        let source = chain_source();
        let mut orchestrator = Orchestrator::new(Arc::clone(&source), ResolverConfig::default());
        assert!(!orchestrator.schedule("a", "^1"));

        orchestrator.analyze(root());
        orchestrator.run_until_idle().await;
        let before = orchestrator.snapshot();

        assert!(!orchestrator.schedule("a", "^1"));
        assert!(!orchestrator.schedule("app", "*"));
        assert_eq!(*orchestrator.snapshot(), *before);
        assert_eq!(source.calls().len(), 3);
    }
}
