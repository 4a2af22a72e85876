//! Package manifest model.
//!
//! A [`PackageManifest`] is the point-in-time metadata for one concrete version
//! of a package: either a version entry from a registry packument or the
//! user-supplied root `package.json`. Both sources share the same loose JSON
//! shape, so they go through the same [`RawManifest`] decoder.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Dependency map: package name → raw version specifier.
pub type DependencyMap = BTreeMap<String, String>;

/// Version used for a root manifest that omits `version`.
pub const DEFAULT_ROOT_VERSION: &str = "0.0.0";

/// Errors raised while reading the user-supplied root manifest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// The input is not JSON, is not an object, or lacks a usable `name`.
    #[error("Malformed package.json: {0}")]
    MalformedInput(String),
}

/// Source repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository kind, usually `git`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Repository URL.
    pub url: String,
}

/// Resolved package metadata for a single version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub dependencies: DependencyMap,
    pub dev_dependencies: DependencyMap,
    pub homepage: Option<String>,
    pub repository: Option<Repository>,
    pub license: Option<String>,
}

impl PackageManifest {
    /// Creates a manifest with the given identity and no metadata.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            dependencies: DependencyMap::new(),
            dev_dependencies: DependencyMap::new(),
            homepage: None,
            repository: None,
            license: None,
        }
    }

    /// Adds a regular dependency.
    pub fn with_dependency(mut self, name: impl Into<String>, spec: impl Into<String>) -> Self {
        self.dependencies.insert(name.into(), spec.into());
        self
    }

    /// Adds a dev dependency.
    pub fn with_dev_dependency(
        mut self,
        name: impl Into<String>,
        spec: impl Into<String>,
    ) -> Self {
        self.dev_dependencies.insert(name.into(), spec.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the edges visible under the given dev-dependency visibility.
    pub fn visible_dependencies(&self, include_dev: bool) -> Vec<(&str, &str)> {
        visible_edges(&self.dependencies, &self.dev_dependencies, include_dev)
    }

    /// Returns true when the manifest declares no edges under the given visibility.
    pub fn has_no_dependencies(&self, include_dev: bool) -> bool {
        self.dependencies.is_empty() && (!include_dev || self.dev_dependencies.is_empty())
    }

    /// Decodes a manifest from a JSON value as found in a packument's `versions` map.
    ///
    /// `fallback_name` and `fallback_version` fill in fields the entry omits.
    pub(crate) fn from_registry_value(
        value: Value,
        fallback_name: &str,
        fallback_version: &str,
    ) -> Result<Self, serde_json::Error> {
        let raw: RawManifest = serde_json::from_value(value)?;
        Ok(raw.into_manifest(
            fallback_name.to_string(),
            fallback_version.to_string(),
        ))
    }
}

/// Edges of a dependency pair under the given dev-dependency visibility.
///
/// Regular dependencies come first, in map order, followed by dev-only
/// names. A name present in both maps is yielded once, with its regular
/// specifier.
pub fn visible_edges<'a>(
    dependencies: &'a DependencyMap,
    dev_dependencies: &'a DependencyMap,
    include_dev: bool,
) -> Vec<(&'a str, &'a str)> {
    let mut edges: Vec<(&str, &str)> = dependencies
        .iter()
        .map(|(name, spec)| (name.as_str(), spec.as_str()))
        .collect();

    if include_dev {
        edges.extend(dev_only_edges(dependencies, dev_dependencies));
    }

    edges
}

/// Dev dependencies whose names are not also regular dependencies.
pub fn dev_only_edges<'a>(
    dependencies: &'a DependencyMap,
    dev_dependencies: &'a DependencyMap,
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    dev_dependencies
        .iter()
        .filter(move |(name, _)| !dependencies.contains_key(*name))
        .map(|(name, spec)| (name.as_str(), spec.as_str()))
}

/// Parses the user-supplied root `package.json`.
///
/// The input must be a JSON object with a non-empty string `name`. Everything
/// else is optional; a missing `version` becomes [`DEFAULT_ROOT_VERSION`].
pub fn parse_root_manifest(text: &str) -> Result<PackageManifest, ManifestError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ManifestError::MalformedInput(format!("invalid JSON: {}", e)))?;

    let name = match value.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        Some(_) => {
            return Err(ManifestError::MalformedInput(
                "\"name\" must be a non-empty string".to_string(),
            ))
        }
        None if value.is_object() => {
            return Err(ManifestError::MalformedInput(
                "missing required field \"name\"".to_string(),
            ))
        }
        None => {
            return Err(ManifestError::MalformedInput(
                "expected a JSON object".to_string(),
            ))
        }
    };

    let raw: RawManifest = serde_json::from_value(value)
        .map_err(|e| ManifestError::MalformedInput(e.to_string()))?;

    let mut manifest = raw.into_manifest(name.clone(), DEFAULT_ROOT_VERSION.to_string());
    manifest.name = name;
    Ok(manifest)
}

// =============================================================================
// Loose JSON shape
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawManifest {
    name: Option<String>,
    version: Option<String>,
    description: Option<Value>,
    dependencies: Option<BTreeMap<String, Value>>,
    dev_dependencies: Option<BTreeMap<String, Value>>,
    homepage: Option<Value>,
    repository: Option<Value>,
    license: Option<Value>,
}

impl RawManifest {
    fn into_manifest(self, fallback_name: String, fallback_version: String) -> PackageManifest {
        PackageManifest {
            name: self.name.filter(|n| !n.is_empty()).unwrap_or(fallback_name),
            version: self
                .version
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback_version),
            description: self.description.and_then(string_value),
            dependencies: string_map(self.dependencies),
            dev_dependencies: string_map(self.dev_dependencies),
            homepage: self.homepage.and_then(string_value),
            repository: self.repository.and_then(repository_value),
            license: self.license.and_then(license_value),
        }
    }
}

fn string_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Keeps only entries whose specifier is a string; registries occasionally
/// publish garbage here and one bad entry must not sink the whole manifest.
fn string_map(map: Option<BTreeMap<String, Value>>) -> DependencyMap {
    map.unwrap_or_default()
        .into_iter()
        .filter_map(|(name, spec)| match spec {
            Value::String(spec) => Some((name, spec)),
            _ => None,
        })
        .collect()
}

fn repository_value(value: Value) -> Option<Repository> {
    match value {
        Value::String(url) if !url.is_empty() => Some(Repository {
            kind: "git".to_string(),
            url,
        }),
        Value::Object(mut obj) => {
            let url = obj.remove("url").and_then(string_value)?;
            let kind = obj
                .remove("type")
                .and_then(string_value)
                .unwrap_or_else(|| "git".to_string());
            Some(Repository { kind, url })
        }
        _ => None,
    }
}

fn license_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Object(mut obj) => obj.remove("type").and_then(string_value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_root_manifest_minimal() {
        let manifest = parse_root_manifest(r#"{"name":"app"}"#).unwrap();
        assert_eq!(manifest.name, "app");
        assert_eq!(manifest.version, DEFAULT_ROOT_VERSION);
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.dev_dependencies.is_empty());
    }

    #[test]
    fn test_parse_root_manifest_full() {
        let text = r#"{
            "name": "app",
            "version": "1.0.0",
            "description": "demo",
            "dependencies": {"left-pad": "^1.0.0"},
            "devDependencies": {"jest": "^29.0.0"},
            "repository": "https://github.com/acme/app",
            "license": "MIT"
        }"#;

        let manifest = parse_root_manifest(text).unwrap();
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.description.as_deref(), Some("demo"));
        assert_eq!(manifest.dependencies["left-pad"], "^1.0.0");
        assert_eq!(manifest.dev_dependencies["jest"], "^29.0.0");
        assert_eq!(
            manifest.repository,
            Some(Repository {
                kind: "git".to_string(),
                url: "https://github.com/acme/app".to_string(),
            })
        );
        assert_eq!(manifest.license.as_deref(), Some("MIT"));
    }

    #[test]
    fn test_parse_root_manifest_rejects_invalid_json() {
        let err = parse_root_manifest("{not json").unwrap_err();
        assert!(matches!(err, ManifestError::MalformedInput(_)));
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_parse_root_manifest_requires_name() {
        let err = parse_root_manifest(r#"{"version":"1.0.0"}"#).unwrap_err();
        assert!(err.to_string().contains("name"));

        let err = parse_root_manifest(r#"{"name": 42}"#).unwrap_err();
        assert!(err.to_string().contains("non-empty string"));

        let err = parse_root_manifest(r#"["app"]"#).unwrap_err();
        assert!(err.to_string().contains("object"));
    }

    #[test]
    fn test_registry_value_defaults_and_odd_shapes() {
        let value = json!({
            "dependencies": {"a": "^1.0.0", "b": {"bogus": true}},
            "repository": {"url": "git+https://example.com/x.git"},
            "license": {"type": "ISC"}
        });

        let manifest = PackageManifest::from_registry_value(value, "x", "2.0.0").unwrap();
        assert_eq!(manifest.name, "x");
        assert_eq!(manifest.version, "2.0.0");
        assert_eq!(manifest.dependencies.len(), 1);
        assert!(manifest.dev_dependencies.is_empty());
        assert_eq!(manifest.repository.unwrap().kind, "git");
        assert_eq!(manifest.license.as_deref(), Some("ISC"));
    }

    #[test]
    fn test_visible_dependencies_respects_dev_flag() {
        let manifest = PackageManifest::new("app", "1.0.0")
            .with_dependency("a", "^1")
            .with_dev_dependency("b", "^2")
            .with_dev_dependency("a", "^9");

        let regular = manifest.visible_dependencies(false);
        assert_eq!(regular, vec![("a", "^1")]);

        let all = manifest.visible_dependencies(true);
        assert_eq!(all, vec![("a", "^1"), ("b", "^2")]);
    }

    #[test]
    fn test_has_no_dependencies() {
        let manifest = PackageManifest::new("x", "1.0.0").with_dev_dependency("d", "*");
        assert!(manifest.has_no_dependencies(false));
        assert!(!manifest.has_no_dependencies(true));
    }

    #[test]
    fn test_serializes_camel_case() {
        let manifest = PackageManifest::new("x", "1.0.0").with_dev_dependency("d", "*");
        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json.get("devDependencies").is_some());
    }
}
