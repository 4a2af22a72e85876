//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use npmscope::config::{ConfigFileError, ConfigKeyError};
use npmscope::manifest::ManifestError;
use npmscope::registry::HttpError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read the root manifest
    ManifestRead {
        path: String,
        error: std::io::Error,
    },
    /// Root manifest is not a usable package.json
    Manifest(ManifestError),
    /// Failed to create the HTTP client
    HttpClient(HttpError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to serialize output
    Output(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::ManifestRead { .. } => {
                eprintln!();
                eprintln!("Pass a path to package.json, a directory containing one,");
                eprintln!("or '-' to read the manifest from stdin.");
            }
            CliError::Manifest(_) => {
                eprintln!();
                eprintln!("The manifest must be a JSON object with a non-empty \"name\".");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Run 'npmscope config list' to see available settings,");
                eprintln!("or 'npmscope config path' to locate the configuration file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ManifestRead { path, error } => {
                write!(f, "Failed to read manifest '{}': {}", path, error)
            }
            CliError::Manifest(e) => write!(f, "Invalid manifest: {}", e),
            CliError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Output(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ManifestRead { error, .. } => Some(error),
            CliError::Manifest(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ConfigKeyError> for CliError {
    fn from(e: ConfigKeyError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ManifestError> for CliError {
    fn from(e: ManifestError) -> Self {
        CliError::Manifest(e)
    }
}

impl From<HttpError> for CliError {
    fn from(e: HttpError) -> Self {
        CliError::HttpClient(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}
