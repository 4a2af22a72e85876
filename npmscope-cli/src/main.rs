//! npmscope CLI - Command-line interface
//!
//! This binary provides a command-line interface to the npmscope library.

mod commands;
mod error;
mod render;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::resolve::ResolveArgs;

#[derive(Parser)]
#[command(name = "npmscope")]
#[command(version = npmscope::VERSION)]
#[command(about = "Explore the dependency graph of a package.json", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the dependency graph of a package.json
    Resolve(ResolveArgs),

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve(args) => commands::resolve::run(args),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_config_set() {
        let cli = Cli::parse_from(["npmscope", "config", "set", "resolver.workers", "4"]);
        match cli.command {
            Commands::Config {
                command: ConfigCommands::Set { key, value },
            } => {
                assert_eq!(key, "resolver.workers");
                assert_eq!(value, "4");
            }
            _ => panic!("expected config set"),
        }
    }
}
