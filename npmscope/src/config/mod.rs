//! User configuration for npmscope.
//!
//! Settings are read from `~/.npmscope/config.ini` (see [`ConfigFile`]) and
//! can be overridden per process with `NPMSCOPE_*` environment variables.
//!
//! # Example
//!
//! ```ignore
//! use npmscope::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let resolver = config.resolver_config();
//! ```

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use parser::{ENV_MAX_DEPTH, ENV_REGISTRY, ENV_WORKERS};
pub use settings::{ConfigFile, LoggingSettings, RegistrySettings, ResolverSettings};
