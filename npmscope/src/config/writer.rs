//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::defaults::*;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let include_dev = if config.resolver.include_dev {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[registry]
; Base URL of the npm registry. Scoped names are requested as @scope%2fname.
; Can be overridden with NPMSCOPE_REGISTRY.
url = {}
; HTTP client timeout in seconds (default: {})
timeout_secs = {}

[resolver]
; Concurrent registry fetches (default: {}, range: {}-{})
; Can be overridden with NPMSCOPE_WORKERS.
workers = {}
; How many levels below the root eager traversal preloads (default: {}, range: {}-{})
; Can be overridden with NPMSCOPE_MAX_DEPTH.
max_depth = {}
; Follow devDependencies when a session starts (default: false)
include_dev = {}
; Traversal mode:
;   eager - preload every level up to max_depth
;   lazy  - load direct dependencies only, expand nodes on request
mode = {}
; Retries for network errors and timeouts; 0 fails fast (default: {})
max_retries = {}
; Base delay in milliseconds, doubled on each retry (default: {})
retry_base_delay_ms = {}
; Per-fetch time budget in seconds; 0 disables it (default: {})
task_timeout_secs = {}

[logging]
; Log file, truncated at the start of each run
file = {}
"#,
        config.registry.url,
        DEFAULT_REGISTRY_TIMEOUT_SECS,
        config.registry.timeout_secs,
        DEFAULT_WORKERS,
        MIN_WORKERS,
        MAX_WORKERS,
        config.resolver.workers,
        DEFAULT_MAX_DEPTH,
        MIN_MAX_DEPTH,
        MAX_MAX_DEPTH,
        config.resolver.max_depth,
        include_dev,
        config.resolver.mode,
        DEFAULT_MAX_RETRIES,
        config.resolver.max_retries,
        DEFAULT_RETRY_BASE_DELAY_MS,
        config.resolver.retry_base_delay_ms,
        DEFAULT_TASK_TIMEOUT_SECS,
        config.resolver.task_timeout_secs,
        path_to_string(&config.logging.file),
    )
}

pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
