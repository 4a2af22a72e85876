//! Incremental dependency resolution.
//!
//! The [`Orchestrator`] turns a root manifest into a dependency graph by
//! repeatedly dispatching [`WorkItem`]s to a worker pool and applying their
//! results. It is the single owner of all mutable traversal state: the
//! frontier, the in-flight and completed key sets and the graph itself.
//!
//! # Traversal rules
//!
//! - Work is deduplicated by package name. The first specifier seen for a
//!   name wins; later references are dropped.
//! - In [`TraversalMode::Eager`] children of a node at depth `d` are queued
//!   only while `d < max_depth`.
//! - In [`TraversalMode::Lazy`] only the root's direct dependencies are
//!   fetched; deeper levels are opened one node at a time with
//!   [`Orchestrator::expand`], which ignores `max_depth`.
//! - A failed fetch marks one node Failed and never aborts the traversal.

mod error;
mod orchestrator;
mod work;

pub use error::{FetchFailure, NodeError};
pub use orchestrator::{ExpandOutcome, Orchestrator};
pub use work::{WorkItem, WorkPurpose, WorkTracker};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::pool::{FetchPolicy, DEFAULT_WORKER_COUNT};

/// Default eager traversal depth.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// How far traversal proceeds without explicit user intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraversalMode {
    /// Preload everything up to `max_depth`.
    #[default]
    Eager,
    /// Fetch the first level only; the rest waits for `expand`.
    Lazy,
}

/// Error returned when parsing an unknown traversal mode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown traversal mode '{0}', expected 'eager' or 'lazy'")]
pub struct ParseModeError(pub String);

impl FromStr for TraversalMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(Self::Eager),
            "lazy" => Ok(Self::Lazy),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

impl fmt::Display for TraversalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager => f.write_str("eager"),
            Self::Lazy => f.write_str("lazy"),
        }
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Worker pool size.
    pub workers: usize,
    /// Eager depth bound. Values below 1 are treated as 1.
    pub max_depth: usize,
    /// Initial dev-dependency visibility.
    pub include_dev: bool,
    pub mode: TraversalMode,
    pub fetch: FetchPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            max_depth: DEFAULT_MAX_DEPTH,
            include_dev: false,
            mode: TraversalMode::Eager,
            fetch: FetchPolicy::default(),
        }
    }
}

impl ResolverConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn with_include_dev(mut self, include_dev: bool) -> Self {
        self.include_dev = include_dev;
        self
    }

    pub fn with_mode(mut self, mode: TraversalMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_fetch_policy(mut self, fetch: FetchPolicy) -> Self {
        self.fetch = fetch;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("eager".parse::<TraversalMode>(), Ok(TraversalMode::Eager));
        assert_eq!(" LAZY ".parse::<TraversalMode>(), Ok(TraversalMode::Lazy));
        assert!("sideways".parse::<TraversalMode>().is_err());
        assert_eq!(TraversalMode::Lazy.to_string(), "lazy");
    }

    #[test]
    fn test_config_defaults_and_floors() {
        let config = ResolverConfig::default();
        assert_eq!(config.workers, 10);
        assert_eq!(config.max_depth, 3);
        assert!(!config.include_dev);

        let config = ResolverConfig::default().with_workers(0).with_max_depth(0);
        assert_eq!(config.workers, 1);
        assert_eq!(config.max_depth, 1);
    }
}
