//! npmscope - Incremental npm dependency graph resolution
//!
//! This library discovers the transitive dependency graph of a `package.json`
//! by querying an npm registry, a bounded number of packages at a time, and
//! keeps a live graph that can be read at any point while resolution runs.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use npmscope::registry::{AsyncReqwestClient, RegistryClient, DEFAULT_REGISTRY_URL};
//! use npmscope::resolver::{Orchestrator, ResolverConfig};
//!
//! let http = AsyncReqwestClient::new()?;
//! let source = Arc::new(RegistryClient::new(http, DEFAULT_REGISTRY_URL));
//! let mut orchestrator = Orchestrator::new(source, ResolverConfig::default());
//!
//! orchestrator.analyze_json(r#"{"name":"app","dependencies":{"left-pad":"^1.0.0"}}"#)?;
//! let graph = orchestrator.run_until_idle().await;
//! ```

pub mod config;
pub mod graph;
pub mod logging;
pub mod manifest;
pub mod pool;
pub mod registry;
pub mod resolver;

/// Version of the npmscope library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
