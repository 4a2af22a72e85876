//! Work items and the frontier / in-flight / completed bookkeeping.

use std::collections::{HashSet, VecDeque};

/// Why an item was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkPurpose {
    /// Regular traversal; children follow the depth and mode rules.
    Traverse,
    /// Explicit `expand` of a stub; children become unscheduled stubs.
    Expand,
}

/// One `(name, specifier, depth)` unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub name: String,
    pub spec: String,
    pub depth: usize,
    pub parent: Option<String>,
    pub purpose: WorkPurpose,
}

impl WorkItem {
    pub fn traverse(
        name: impl Into<String>,
        spec: impl Into<String>,
        depth: usize,
        parent: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
            depth,
            parent,
            purpose: WorkPurpose::Traverse,
        }
    }

    /// Identity used for deduplication: the package name alone.
    pub fn key(&self) -> &str {
        &self.name
    }
}

/// Tracks every key of the session in exactly one of three sets.
#[derive(Debug, Default)]
pub struct WorkTracker {
    frontier: VecDeque<WorkItem>,
    pending: HashSet<String>,
    in_flight: HashSet<String>,
    completed: HashSet<String>,
}

impl WorkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key is pending, in flight or completed.
    pub fn is_seen(&self, key: &str) -> bool {
        self.pending.contains(key) || self.in_flight.contains(key) || self.completed.contains(key)
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }

    pub fn is_completed(&self, key: &str) -> bool {
        self.completed.contains(key)
    }

    /// Appends an item to the frontier unless its key was already seen.
    pub fn enqueue(&mut self, item: WorkItem) -> bool {
        if self.is_seen(item.key()) {
            return false;
        }
        self.pending.insert(item.key().to_string());
        self.frontier.push_back(item);
        true
    }

    /// Moves the oldest pending item to in-flight and returns it.
    pub fn next_pending(&mut self) -> Option<WorkItem> {
        let item = self.frontier.pop_front()?;
        self.pending.remove(item.key());
        self.in_flight.insert(item.key().to_string());
        Some(item)
    }

    /// Moves an in-flight key to completed. Returns false if it was not in flight.
    pub fn complete(&mut self, key: &str) -> bool {
        if !self.in_flight.remove(key) {
            return false;
        }
        self.completed.insert(key.to_string());
        true
    }

    /// Records a key as completed without it ever being fetched.
    pub fn mark_completed(&mut self, key: &str) {
        self.pending.remove(key);
        self.in_flight.remove(key);
        self.frontier.retain(|item| item.key() != key);
        self.completed.insert(key.to_string());
    }

    /// Drops every trace of a key so it can be scheduled again.
    pub fn forget(&mut self, key: &str) {
        self.pending.remove(key);
        self.in_flight.remove(key);
        self.completed.remove(key);
        self.frontier.retain(|item| item.key() != key);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    /// Nothing pending and nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_empty()
    }

    /// Checks that no key is in two sets at once.
    pub fn is_disjoint(&self) -> bool {
        self.pending.is_disjoint(&self.in_flight)
            && self.pending.is_disjoint(&self.completed)
            && self.in_flight.is_disjoint(&self.completed)
            && self.frontier.len() == self.pending.len()
    }

    pub fn clear(&mut self) {
        self.frontier.clear();
        self.pending.clear();
        self.in_flight.clear();
        self.completed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> WorkItem {
        WorkItem::traverse(name, "^1.0.0", 1, Some("root".to_string()))
    }

    #[test]
    fn test_enqueue_dedups_by_name() {
        let mut tracker = WorkTracker::new();
        assert!(tracker.enqueue(item("a")));
        assert!(!tracker.enqueue(WorkItem::traverse("a", "^2.0.0", 3, None)));
        assert_eq!(tracker.pending_len(), 1);
    }

    #[test]
    fn test_lifecycle_keeps_sets_disjoint() {
        let mut tracker = WorkTracker::new();
        tracker.enqueue(item("a"));
        tracker.enqueue(item("b"));
        assert!(tracker.is_disjoint());

        let next = tracker.next_pending().unwrap();
        assert_eq!(next.name, "a");
        assert!(tracker.is_in_flight("a"));
        assert!(tracker.is_disjoint());

        assert!(tracker.complete("a"));
        assert!(tracker.is_completed("a"));
        assert!(!tracker.complete("a"));
        assert!(tracker.is_disjoint());

        // Completed keys are never re-queued
        assert!(!tracker.enqueue(item("a")));
        assert!(!tracker.is_idle());
    }

    #[test]
    fn test_fifo_order() {
        let mut tracker = WorkTracker::new();
        for name in ["c", "a", "b"] {
            tracker.enqueue(item(name));
        }
        let order: Vec<String> = std::iter::from_fn(|| tracker.next_pending())
            .map(|i| i.name)
            .collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_mark_completed_and_forget() {
        let mut tracker = WorkTracker::new();
        tracker.mark_completed("root");
        assert!(!tracker.enqueue(item("root")));

        tracker.enqueue(item("x"));
        tracker.forget("x");
        assert!(!tracker.is_seen("x"));
        assert!(tracker.is_disjoint());
        assert!(tracker.enqueue(item("x")));
    }

    #[test]
    fn test_clear() {
        let mut tracker = WorkTracker::new();
        tracker.enqueue(item("a"));
        tracker.next_pending();
        tracker.enqueue(item("b"));
        tracker.clear();

        assert!(tracker.is_idle());
        assert_eq!(tracker.completed_len(), 0);
        assert!(tracker.next_pending().is_none());
    }
}
