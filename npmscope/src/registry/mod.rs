//! npm registry access.
//!
//! The registry layer answers one question: which concrete manifest does a
//! `(name, specifier)` pair refer to? [`RegistryClient`] answers it over HTTP
//! through the [`AsyncHttpClient`] abstraction so tests can substitute canned
//! responses.

mod client;
mod http;
mod specifier;
mod types;
mod version;

pub use client::{external_placeholder, RegistryClient, DEFAULT_REGISTRY_URL};
pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpError, DEFAULT_HTTP_TIMEOUT_SECS};
pub use specifier::{parse_target, SpecifierKind};
pub use types::{ManifestSource, Packument, RegistryError};
pub use version::{select_version, LooseVersion, VersionTarget};
