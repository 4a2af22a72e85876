//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, show, path, list, get, set)
//! - [`resolve`] - Dependency graph resolution for a package.json

pub mod config;
pub mod resolve;
