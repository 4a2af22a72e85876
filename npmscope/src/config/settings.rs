//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;
use std::time::Duration;

use crate::pool::FetchPolicy;
use crate::resolver::{ResolverConfig, TraversalMode};

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Registry endpoint settings
    pub registry: RegistrySettings,
    /// Traversal and worker pool settings
    pub resolver: ResolverSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Base URL of the npm registry
    pub url: String,
    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Number of concurrent fetch workers
    pub workers: usize,
    /// Depth bound for eager traversal
    pub max_depth: usize,
    /// Whether devDependencies are visible when a session starts
    pub include_dev: bool,
    /// Eager preload or lazy per-node expansion
    pub mode: TraversalMode,
    /// Retries for transient fetch failures
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries
    pub retry_base_delay_ms: u64,
    /// Per-fetch time budget in seconds; 0 disables it
    pub task_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl ResolverSettings {
    /// Fetch policy derived from the retry and timeout settings.
    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: (self.task_timeout_secs > 0)
                .then(|| Duration::from_secs(self.task_timeout_secs)),
            max_retries: self.max_retries,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}

impl ConfigFile {
    /// Builds the orchestrator configuration from these settings.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_workers(self.resolver.workers)
            .with_max_depth(self.resolver.max_depth)
            .with_include_dev(self.resolver.include_dev)
            .with_mode(self.resolver.mode)
            .with_fetch_policy(self.resolver.fetch_policy())
    }
}
