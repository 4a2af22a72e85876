//! CLI runner for common setup and operations.
//!
//! Encapsulates configuration loading and logging initialization so command
//! handlers start from a ready environment.

use crate::error::CliError;
use npmscope::config::ConfigFile;
use npmscope::logging::{init_logging, LogOptions, LoggingGuard};
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `verbose` - Mirror log events to stderr and default to debug level
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        let options = LogOptions {
            stderr: verbose,
            verbose,
        };
        let logging_guard = init_logging(&config.logging.file, options)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("npmscope v{}", npmscope::VERSION);
        info!(
            command = command,
            log_file = %self.logging_guard.path().display(),
            "npmscope CLI started"
        );
    }
}
