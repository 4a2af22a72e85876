//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants, the clamping helpers used by the
//! parser, and the `ConfigFile::default()` implementation.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::resolver::TraversalMode;

// =============================================================================
// Registry
// =============================================================================

/// Default registry base URL.
pub const DEFAULT_REGISTRY_URL: &str = crate::registry::DEFAULT_REGISTRY_URL;

/// Default HTTP client timeout in seconds.
pub const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = crate::registry::DEFAULT_HTTP_TIMEOUT_SECS;

// =============================================================================
// Resolver
// =============================================================================

/// Default worker pool size.
pub const DEFAULT_WORKERS: usize = crate::pool::DEFAULT_WORKER_COUNT;

/// Minimum worker pool size.
pub const MIN_WORKERS: usize = 1;

/// Maximum worker pool size. Registries throttle aggressive clients.
pub const MAX_WORKERS: usize = 64;

/// Default eager traversal depth.
pub const DEFAULT_MAX_DEPTH: usize = crate::resolver::DEFAULT_MAX_DEPTH;

/// Minimum traversal depth (direct dependencies only).
pub const MIN_MAX_DEPTH: usize = 1;

/// Maximum traversal depth.
pub const MAX_MAX_DEPTH: usize = 10;

/// Default retry count (fail fast).
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Default backoff base in milliseconds.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;

/// Default per-fetch timeout in seconds (disabled).
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 0;

// =============================================================================
// Logging
// =============================================================================

/// Log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "npmscope.log";

/// Default log file path (~/.npmscope/npmscope.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE_NAME)
}

// =============================================================================
// Clamping
// =============================================================================

/// Clamps the worker count to valid range and logs a warning if clamped.
pub(super) fn clamp_workers(value: usize) -> usize {
    clamp_logged("workers", value, MIN_WORKERS, MAX_WORKERS)
}

/// Clamps the traversal depth to valid range and logs a warning if clamped.
pub(super) fn clamp_max_depth(value: usize) -> usize {
    clamp_logged("max_depth", value, MIN_MAX_DEPTH, MAX_MAX_DEPTH)
}

fn clamp_logged(setting: &str, value: usize, min: usize, max: usize) -> usize {
    if value < min {
        tracing::warn!(
            requested = value,
            min = min,
            max = max,
            "{} below minimum, clamping to {}",
            setting,
            min
        );
        min
    } else if value > max {
        tracing::warn!(
            requested = value,
            min = min,
            max = max,
            "{} above maximum, clamping to {}",
            setting,
            max
        );
        max
    } else {
        value
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            registry: RegistrySettings {
                url: DEFAULT_REGISTRY_URL.to_string(),
                timeout_secs: DEFAULT_REGISTRY_TIMEOUT_SECS,
            },
            resolver: ResolverSettings {
                workers: DEFAULT_WORKERS,
                max_depth: DEFAULT_MAX_DEPTH,
                include_dev: false,
                mode: TraversalMode::Eager,
                max_retries: DEFAULT_MAX_RETRIES,
                retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
                task_timeout_secs: DEFAULT_TASK_TIMEOUT_SECS,
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
