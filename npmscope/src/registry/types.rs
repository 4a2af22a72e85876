//! Registry types and errors.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

use crate::manifest::PackageManifest;

/// Errors that can occur while resolving a package against the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry answered 404 for the package name.
    #[error("package '{name}' not found in registry")]
    NotFound { name: String },

    /// The packument lists no published versions.
    #[error("package '{name}' has no published versions")]
    NoVersionsAvailable { name: String },

    /// Transport failure or a non-404 error status.
    #[error("network error: {message}")]
    Network {
        /// HTTP status when the server answered, `None` for transport failures.
        status: Option<u16>,
        message: String,
    },

    /// Best-match fallback chain exhausted without a usable version.
    #[error("no usable version of '{name}' for '{spec}'")]
    UnresolvableVersion { name: String, spec: String },

    /// The registry body is not a usable packument.
    #[error("invalid registry response for '{name}': {reason}")]
    InvalidResponse { name: String, reason: String },

    /// The fetch exceeded its per-task time budget.
    #[error("timed out after {elapsed_ms}ms resolving '{name}'")]
    TimedOut { name: String, elapsed_ms: u64 },
}

impl RegistryError {
    /// Returns true for failures that a retry could plausibly fix.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::TimedOut { .. })
    }

    /// Returns the HTTP status carried by a network error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            _ => None,
        }
    }
}

/// A capability that turns `(name, version specifier)` into a concrete manifest.
///
/// [`super::RegistryClient`] is the production implementation; the
/// orchestrator only depends on this trait.
pub trait ManifestSource: Send + Sync + 'static {
    /// Resolves a specifier for the named package to a concrete manifest.
    fn resolve(
        &self,
        name: &str,
        spec: &str,
    ) -> impl Future<Output = Result<PackageManifest, RegistryError>> + Send;
}

/// Full registry metadata document for one package name.
///
/// Only the parts the resolver needs are decoded eagerly; individual version
/// entries stay as raw JSON until one is selected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Packument {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "dist-tags")]
    pub dist_tags: BTreeMap<String, String>,

    #[serde(default)]
    pub versions: BTreeMap<String, Value>,
}

impl Packument {
    /// Returns the version named by a dist-tag, if that version is published.
    pub fn tagged_version(&self, tag: &str) -> Option<&str> {
        self.dist_tags
            .get(tag)
            .map(String::as_str)
            .filter(|v| self.versions.contains_key(*v))
    }

    /// Returns all published version strings.
    pub fn version_keys(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::NotFound {
            name: "nope".to_string(),
        };
        assert_eq!(err.to_string(), "package 'nope' not found in registry");

        let err = RegistryError::Network {
            status: Some(503),
            message: "HTTP 503 from https://registry.npmjs.org/x".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert_eq!(err.http_status(), Some(503));
    }

    #[test]
    fn test_is_transient() {
        assert!(RegistryError::Network {
            status: None,
            message: "reset".to_string()
        }
        .is_transient());
        assert!(RegistryError::TimedOut {
            name: "x".to_string(),
            elapsed_ms: 10
        }
        .is_transient());
        assert!(!RegistryError::NotFound {
            name: "x".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_packument_decode_and_tags() {
        let json = r#"{
            "name": "left-pad",
            "dist-tags": {"latest": "1.3.0", "next": "2.0.0"},
            "versions": {"1.0.0": {}, "1.3.0": {}}
        }"#;
        let doc: Packument = serde_json::from_str(json).unwrap();

        assert_eq!(doc.tagged_version("latest"), Some("1.3.0"));
        // Tag pointing at an unpublished version is ignored
        assert_eq!(doc.tagged_version("next"), None);
        assert_eq!(doc.version_keys().count(), 2);
    }

    #[test]
    fn test_packument_missing_sections() {
        let doc: Packument = serde_json::from_str("{}").unwrap();
        assert!(doc.versions.is_empty());
        assert!(doc.dist_tags.is_empty());
    }
}
