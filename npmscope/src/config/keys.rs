//! Configuration key access and validation.
//!
//! This module provides a type-safe interface for getting and setting
//! configuration values by key name, with validation via the Specification Pattern.

use std::str::FromStr;
use thiserror::Error;

use super::defaults::{MAX_MAX_DEPTH, MAX_WORKERS, MIN_MAX_DEPTH, MIN_WORKERS};
use super::parser::{expand_tilde, parse_bool};
use super::settings::ConfigFile;
use super::writer::path_to_string;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`] and knows how to
/// get and set its value with proper validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Registry settings
    RegistryUrl,
    RegistryTimeoutSecs,

    // Resolver settings
    ResolverWorkers,
    ResolverMaxDepth,
    ResolverIncludeDev,
    ResolverMode,
    ResolverMaxRetries,
    ResolverRetryBaseDelayMs,
    ResolverTaskTimeoutSecs,

    // Logging settings
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "resolver.workers").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::RegistryUrl => "registry.url",
            ConfigKey::RegistryTimeoutSecs => "registry.timeout_secs",
            ConfigKey::ResolverWorkers => "resolver.workers",
            ConfigKey::ResolverMaxDepth => "resolver.max_depth",
            ConfigKey::ResolverIncludeDev => "resolver.include_dev",
            ConfigKey::ResolverMode => "resolver.mode",
            ConfigKey::ResolverMaxRetries => "resolver.max_retries",
            ConfigKey::ResolverRetryBaseDelayMs => "resolver.retry_base_delay_ms",
            ConfigKey::ResolverTaskTimeoutSecs => "resolver.task_timeout_secs",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "resolver").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "workers").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::RegistryUrl => config.registry.url.clone(),
            ConfigKey::RegistryTimeoutSecs => config.registry.timeout_secs.to_string(),
            ConfigKey::ResolverWorkers => config.resolver.workers.to_string(),
            ConfigKey::ResolverMaxDepth => config.resolver.max_depth.to_string(),
            ConfigKey::ResolverIncludeDev => config.resolver.include_dev.to_string(),
            ConfigKey::ResolverMode => config.resolver.mode.to_string(),
            ConfigKey::ResolverMaxRetries => config.resolver.max_retries.to_string(),
            ConfigKey::ResolverRetryBaseDelayMs => config.resolver.retry_base_delay_ms.to_string(),
            ConfigKey::ResolverTaskTimeoutSecs => config.resolver.task_timeout_secs.to_string(),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Set the value in a config file.
    ///
    /// Validates the value according to the key's specification before setting.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        self.validate(value)?;
        let value = value.trim();

        match self {
            ConfigKey::RegistryUrl => config.registry.url = value.trim_end_matches('/').to_string(),
            ConfigKey::RegistryTimeoutSecs => config.registry.timeout_secs = self.parse(value)?,
            ConfigKey::ResolverWorkers => config.resolver.workers = self.parse(value)?,
            ConfigKey::ResolverMaxDepth => config.resolver.max_depth = self.parse(value)?,
            ConfigKey::ResolverIncludeDev => config.resolver.include_dev = parse_bool(value),
            ConfigKey::ResolverMode => config.resolver.mode = self.parse(value)?,
            ConfigKey::ResolverMaxRetries => config.resolver.max_retries = self.parse(value)?,
            ConfigKey::ResolverRetryBaseDelayMs => {
                config.resolver.retry_base_delay_ms = self.parse(value)?
            }
            ConfigKey::ResolverTaskTimeoutSecs => {
                config.resolver.task_timeout_secs = self.parse(value)?
            }
            ConfigKey::LoggingFile => config.logging.file = expand_tilde(value),
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigKeyError> {
        value.parse().map_err(|_| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: format!("cannot parse '{}'", value),
        })
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value.trim())
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::RegistryUrl => Box::new(UrlSpec),
            ConfigKey::RegistryTimeoutSecs => Box::new(RangeSpec::new(1, u64::MAX)),
            ConfigKey::ResolverWorkers => {
                Box::new(RangeSpec::new(MIN_WORKERS as u64, MAX_WORKERS as u64))
            }
            ConfigKey::ResolverMaxDepth => {
                Box::new(RangeSpec::new(MIN_MAX_DEPTH as u64, MAX_MAX_DEPTH as u64))
            }
            ConfigKey::ResolverIncludeDev => Box::new(BooleanSpec),
            ConfigKey::ResolverMode => Box::new(OneOfSpec::new(&["eager", "lazy"])),
            ConfigKey::ResolverMaxRetries => Box::new(RangeSpec::new(0, u32::MAX as u64)),
            ConfigKey::ResolverRetryBaseDelayMs => Box::new(NonNegativeIntegerSpec),
            ConfigKey::ResolverTaskTimeoutSecs => Box::new(NonNegativeIntegerSpec),
            ConfigKey::LoggingFile => Box::new(PathSpec),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::RegistryUrl,
            ConfigKey::RegistryTimeoutSecs,
            ConfigKey::ResolverWorkers,
            ConfigKey::ResolverMaxDepth,
            ConfigKey::ResolverIncludeDev,
            ConfigKey::ResolverMode,
            ConfigKey::ResolverMaxRetries,
            ConfigKey::ResolverRetryBaseDelayMs,
            ConfigKey::ResolverTaskTimeoutSecs,
            ConfigKey::LoggingFile,
        ]
    }
}

// ============================================================================
// Value Specifications (Specification Pattern)
// ============================================================================

/// Trait for value validation specifications.
trait ValueSpecification {
    /// Check if the value satisfies this specification.
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

/// Specification that requires the value to be one of a set of options.
struct OneOfSpec {
    options: &'static [&'static str],
}

impl OneOfSpec {
    fn new(options: &'static [&'static str]) -> Self {
        Self { options }
    }
}

impl ValueSpecification for OneOfSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        if self.options.iter().any(|opt| *opt == lower) {
            Ok(())
        } else {
            Err(format!("must be one of: {}", self.options.join(", ")))
        }
    }
}

/// Specification for non-negative integer values.
struct NonNegativeIntegerSpec;

impl ValueSpecification for NonNegativeIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        value
            .parse::<u64>()
            .map(|_| ())
            .map_err(|_| "must be a non-negative integer".to_string())
    }
}

/// Specification for integers within an inclusive range.
struct RangeSpec {
    min: u64,
    max: u64,
}

impl RangeSpec {
    fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }
}

impl ValueSpecification for RangeSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let reason = || {
            if self.max == u64::MAX || self.max == u32::MAX as u64 {
                format!("must be an integer >= {}", self.min)
            } else {
                format!("must be an integer between {} and {}", self.min, self.max)
            }
        };
        match value.parse::<u64>() {
            Ok(n) if (self.min..=self.max).contains(&n) => Ok(()),
            _ => Err(reason()),
        }
    }
}

/// Specification for boolean values.
struct BooleanSpec;

impl ValueSpecification for BooleanSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        let valid = ["true", "false", "yes", "no", "1", "0", "on", "off"];
        if valid.contains(&lower.as_str()) {
            Ok(())
        } else {
            Err("must be true/false, yes/no, 1/0, or on/off".to_string())
        }
    }
}

/// Specification for path values (non-empty).
struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            Err("must be a valid path".to_string())
        } else {
            Ok(())
        }
    }
}

/// Specification for URL values.
struct UrlSpec;

impl ValueSpecification for UrlSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(())
        } else {
            Err("must be a URL starting with 'http://' or 'https://'".to_string())
        }
    }
}
