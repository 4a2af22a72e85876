//! Registry client: packument fetch and best-match version resolution.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, trace};

use super::http::{AsyncHttpClient, HttpError};
use super::specifier::SpecifierKind;
use super::types::{ManifestSource, Packument, RegistryError};
use super::version::{select_version, VersionTarget};
use crate::manifest::PackageManifest;

/// Public npm registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Upper bound on `npm:` alias chains before giving up.
const MAX_ALIAS_HOPS: usize = 8;

// Characters npm allows in package names stay literal; everything else,
// notably the `/` of scoped names, is escaped.
const NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'@')
    .remove(b'_')
    .remove(b'~');

/// Resolves `(name, specifier)` pairs against an npm-compatible registry.
#[derive(Clone)]
pub struct RegistryClient<C: AsyncHttpClient> {
    http: C,
    base_url: String,
}

impl<C: AsyncHttpClient> RegistryClient<C> {
    /// Creates a client for the given registry base URL.
    pub fn new(http: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Returns the registry base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the packument URL for a package name.
    ///
    /// `@scope/name` becomes `@scope%2fname`.
    pub fn package_url(&self, name: &str) -> String {
        let encoded = utf8_percent_encode(name, NAME_ENCODE_SET)
            .to_string()
            .replace("%2F", "%2f");
        format!("{}/{}", self.base_url, encoded)
    }

    /// Fetches and decodes the packument for a package name.
    pub async fn fetch_packument(&self, name: &str) -> Result<Packument, RegistryError> {
        let url = self.package_url(name);
        debug!(package = name, url = %url, "Fetching packument");

        let body = self.http.get(&url).await.map_err(|e| match e {
            HttpError::Status { status: 404, .. } => RegistryError::NotFound {
                name: name.to_string(),
            },
            other => RegistryError::Network {
                status: other.status(),
                message: other.to_string(),
            },
        })?;

        let packument: Packument =
            serde_json::from_slice(&body).map_err(|e| RegistryError::InvalidResponse {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        if packument.versions.is_empty() {
            return Err(RegistryError::NoVersionsAvailable {
                name: name.to_string(),
            });
        }

        trace!(
            package = name,
            versions = packument.versions.len(),
            "Packument decoded"
        );
        Ok(packument)
    }

    async fn resolve_target(
        &self,
        name: &str,
        spec: &str,
        target: VersionTarget,
    ) -> Result<PackageManifest, RegistryError> {
        let mut packument = self.fetch_packument(name).await?;

        let version = select_version(&packument, &target).ok_or_else(|| {
            RegistryError::UnresolvableVersion {
                name: name.to_string(),
                spec: spec.to_string(),
            }
        })?;

        debug!(package = name, spec = spec, version = %version, "Version selected");

        let entry = packument.versions.remove(&version).unwrap_or_default();
        PackageManifest::from_registry_value(entry, name, &version).map_err(|e| {
            RegistryError::InvalidResponse {
                name: name.to_string(),
                reason: format!("version {}: {}", version, e),
            }
        })
    }
}

impl<C: AsyncHttpClient> ManifestSource for RegistryClient<C> {
    async fn resolve(&self, name: &str, spec: &str) -> Result<PackageManifest, RegistryError> {
        let mut current_name = name.to_string();
        let mut current_spec = spec.to_string();

        for _ in 0..MAX_ALIAS_HOPS {
            match SpecifierKind::classify(&current_spec) {
                SpecifierKind::External(raw) => {
                    trace!(package = name, spec = %raw, "External specifier, no fetch");
                    return Ok(external_placeholder(name, &raw));
                }
                SpecifierKind::Alias { name: target, spec } => {
                    trace!(package = name, alias = %target, "Following npm alias");
                    current_name = target;
                    current_spec = spec;
                }
                SpecifierKind::Registry(target) => {
                    return self
                        .resolve_target(&current_name, &current_spec, target)
                        .await;
                }
            }
        }

        Err(RegistryError::UnresolvableVersion {
            name: name.to_string(),
            spec: spec.to_string(),
        })
    }
}

/// Synthetic manifest for a dependency that lives outside the registry.
pub fn external_placeholder(name: &str, spec: &str) -> PackageManifest {
    PackageManifest::new(name, spec)
        .with_description(format!("Local or external dependency ({})", spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::http::tests::MockAsyncHttpClient;
    use serde_json::json;

    const BASE: &str = "https://registry.test";

    fn client() -> (RegistryClient<MockAsyncHttpClient>, MockAsyncHttpClient) {
        let mock = MockAsyncHttpClient::new();
        (RegistryClient::new(mock.clone(), BASE), mock)
    }

    fn publish(mock: &MockAsyncHttpClient, name: &str, latest: &str, versions: &[&str]) {
        let mut entries = serde_json::Map::new();
        for v in versions {
            entries.insert(
                v.to_string(),
                json!({"name": name, "version": v, "dependencies": {"dep": "^1.0.0"}}),
            );
        }
        let doc = json!({
            "name": name,
            "dist-tags": {"latest": latest},
            "versions": entries,
        });
        mock.respond(&format!("{}/{}", BASE, name), doc.to_string());
    }

    #[test]
    fn test_package_url_encodes_scope() {
        let (client, _) = client();
        assert_eq!(
            client.package_url("@rollup/plugin-json"),
            "https://registry.test/@rollup%2fplugin-json"
        );
        assert_eq!(client.package_url("left-pad"), "https://registry.test/left-pad");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RegistryClient::new(MockAsyncHttpClient::new(), "http://r/");
        assert_eq!(client.base_url(), "http://r");
    }

    #[tokio::test]
    async fn test_resolve_caret_range() {
        let (client, mock) = client();
        publish(&mock, "left-pad", "1.3.0", &["1.0.0", "1.1.0", "1.3.0"]);

        let manifest = client.resolve("left-pad", "^1.0.0").await.unwrap();
        assert_eq!(manifest.name, "left-pad");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.dependencies["dep"], "^1.0.0");
    }

    #[tokio::test]
    async fn test_resolve_latest() {
        let (client, mock) = client();
        publish(&mock, "a", "2.0.0", &["1.0.0", "2.0.0", "3.0.0-beta.1"]);

        let manifest = client.resolve("a", "latest").await.unwrap();
        assert_eq!(manifest.version, "2.0.0");
    }

    #[tokio::test]
    async fn test_external_specifier_no_fetch() {
        let (client, mock) = client();

        let manifest = client.resolve("some-lib", "file:../local").await.unwrap();
        assert_eq!(manifest.version, "file:../local");
        assert!(manifest
            .description
            .unwrap()
            .contains("Local or external dependency"));
        assert!(manifest.dependencies.is_empty());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_alias_resolves_target_package() {
        let (client, mock) = client();
        publish(&mock, "string-width", "4.2.3", &["4.2.3"]);

        let manifest = client
            .resolve("string-width-cjs", "npm:string-width@^4.2.0")
            .await
            .unwrap();
        assert_eq!(manifest.name, "string-width");
        assert_eq!(manifest.version, "4.2.3");
        assert_eq!(mock.call_count("https://registry.test/string-width"), 1);
    }

    #[tokio::test]
    async fn test_not_found() {
        let (client, _) = client();

        let err = client.resolve("nope", "^1.0.0").await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::NotFound {
                name: "nope".to_string()
            }
        );
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_server_error_is_network() {
        let (client, mock) = client();
        mock.fail(
            "https://registry.test/flaky",
            HttpError::Status {
                status: 503,
                url: "https://registry.test/flaky".to_string(),
            },
        );

        let err = client.resolve("flaky", "1.0.0").await.unwrap_err();
        assert_eq!(err.http_status(), Some(503));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_empty_versions() {
        let (client, mock) = client();
        mock.respond(
            "https://registry.test/empty",
            r#"{"name":"empty","versions":{}}"#,
        );

        let err = client.resolve("empty", "1.0.0").await.unwrap_err();
        assert!(matches!(err, RegistryError::NoVersionsAvailable { .. }));
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let (client, mock) = client();
        mock.respond("https://registry.test/garbage", "<html>");

        let err = client.resolve("garbage", "1.0.0").await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_unresolvable() {
        let (client, mock) = client();
        mock.respond(
            "https://registry.test/odd",
            r#"{"versions":{"banana":{}}}"#,
        );

        let err = client.resolve("odd", "^1.0.0").await.unwrap_err();
        assert!(matches!(err, RegistryError::UnresolvableVersion { .. }));
    }
}
