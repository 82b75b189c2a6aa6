//! CLI module for salon-server
//!
//! Provides command-line interface parsing and handling for the salon-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// salon-server - authentication backend for salon and spa management
#[derive(Parser, Debug)]
#[command(
    name = "salon-server",
    version,
    about = "salon-server - cookie-based JWT sessions for salon and spa management",
    long_about = "Authentication backend for a multi-tenant salon and spa product: registration,\n\
                  login, rotating refresh tokens and logout over HttpOnly cookies.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a config.",
    after_help = "EXAMPLES:\n    \
                  salon-server init               # Write salon.toml and .env.example\n    \
                  salon-server                    # Start the server (requires salon.toml)\n    \
                  salon-server config --validate  # Check config and signing secrets\n    \
                  salon-server --config my.toml   # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "salon.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (the default when no subcommand is given)
    Serve,

    /// Initialize a new project with configuration files
    ///
    /// Creates salon.toml, .env.example, .gitignore and the data/ directory.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Also resolve and check the signing secrets from the environment
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve_with_salon_toml() {
        let cli = Cli::try_parse_from(["salon-server"]).expect("parse");
        assert_eq!(cli.config, PathBuf::from("salon.toml"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_init_arguments() {
        let cli = Cli::try_parse_from(["salon-server", "init", "demo", "--force", "--port", "9000"])
            .expect("parse");

        match cli.command {
            Some(Commands::Init {
                path, force, port, ..
            }) => {
                assert_eq!(path, PathBuf::from("demo"));
                assert!(force);
                assert_eq!(port, 9000);
            }
            other => panic!("expected init, got {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["salon-server", "config", "--validate", "-c", "other.toml"])
            .expect("parse");

        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Some(Commands::Config { validate: true })));
    }
}
