//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::{clamp_max_depth, clamp_workers};
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Environment variable overriding `resolver.workers`.
pub const ENV_WORKERS: &str = "NPMSCOPE_WORKERS";

/// Environment variable overriding `registry.url`.
pub const ENV_REGISTRY: &str = "NPMSCOPE_REGISTRY";

/// Environment variable overriding `resolver.max_depth`.
pub const ENV_MAX_DEPTH: &str = "NPMSCOPE_MAX_DEPTH";

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [registry] section
    if let Some(section) = ini.section(Some("registry")) {
        if let Some(v) = section.get("url") {
            config.registry.url = parse_url("registry", "url", v)?;
        }
        if let Some(v) = section.get("timeout_secs") {
            config.registry.timeout_secs = parse_number("registry", "timeout_secs", v)?;
            if config.registry.timeout_secs == 0 {
                return Err(invalid("registry", "timeout_secs", v, "must be at least 1"));
            }
        }
    }

    // [resolver] section
    if let Some(section) = ini.section(Some("resolver")) {
        if let Some(v) = section.get("workers") {
            config.resolver.workers = clamp_workers(parse_number("resolver", "workers", v)?);
        }
        if let Some(v) = section.get("max_depth") {
            config.resolver.max_depth =
                clamp_max_depth(parse_number("resolver", "max_depth", v)?);
        }
        if let Some(v) = section.get("include_dev") {
            config.resolver.include_dev = parse_bool(v);
        }
        if let Some(v) = section.get("mode") {
            config.resolver.mode = v.parse().map_err(|_| {
                invalid("resolver", "mode", v, "must be one of: eager, lazy")
            })?;
        }
        if let Some(v) = section.get("max_retries") {
            config.resolver.max_retries = parse_number("resolver", "max_retries", v)?;
        }
        if let Some(v) = section.get("retry_base_delay_ms") {
            config.resolver.retry_base_delay_ms =
                parse_number("resolver", "retry_base_delay_ms", v)?;
        }
        if let Some(v) = section.get("task_timeout_secs") {
            config.resolver.task_timeout_secs =
                parse_number("resolver", "task_timeout_secs", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Applies `NPMSCOPE_*` overrides on top of a loaded configuration.
///
/// `lookup` returns the value of an environment variable, if set. Invalid
/// values are reported with section `env`.
pub(super) fn apply_env_overrides<F>(
    config: &mut ConfigFile,
    lookup: F,
) -> Result<(), ConfigFileError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(ENV_WORKERS) {
        config.resolver.workers = clamp_workers(parse_number("env", ENV_WORKERS, &v)?);
    }
    if let Some(v) = lookup(ENV_REGISTRY) {
        config.registry.url = parse_url("env", ENV_REGISTRY, &v)?;
    }
    if let Some(v) = lookup(ENV_MAX_DEPTH) {
        config.resolver.max_depth = clamp_max_depth(parse_number("env", ENV_MAX_DEPTH, &v)?);
    }
    Ok(())
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

fn parse_url(section: &str, key: &str, value: &str) -> Result<String, ConfigFileError> {
    let v = value.trim();
    if v.starts_with("http://") || v.starts_with("https://") {
        Ok(v.trim_end_matches('/').to_string())
    } else {
        Err(invalid(
            section,
            key,
            value,
            "must be a URL starting with 'http://' or 'https://'",
        ))
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
