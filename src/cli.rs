//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for geoprovider using clap's derive macros.

use clap::{Parser, Subcommand};

/// geoprovider - serve an external HTTP API as a searchable GeoJSON feature source
#[derive(Parser)]
#[command(name = "geoprovider")]
#[command(version)]
#[command(about = "Remote GeoJSON feature provider", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (default: ./config.toml if present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default when no command is given)
    Serve,

    /// Print the configured queryables as JSON
    Queryables,

    /// Send a search to a running provider and summarize the result
    Probe {
        /// Base URL of the running provider
        #[arg(long, default_value = "http://localhost:8000")]
        url: String,

        /// Bounding box as minx,miny,maxx,maxy
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        bbox: Option<Vec<f64>>,

        /// Time range as start/end (RFC3339)
        #[arg(long)]
        datetime: Option<String>,

        /// Maximum number of features
        #[arg(long)]
        limit: Option<u32>,

        /// CQL2-JSON filter
        #[arg(long)]
        filter: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
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
    fn test_no_command_means_serve() {
        let cli = Cli::try_parse_from(["geoprovider"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_probe_with_bbox() {
        let cli = Cli::try_parse_from([
            "geoprovider",
            "probe",
            "--bbox",
            "-10,-5.5,10,5.5",
            "--limit",
            "20",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Probe {
                url, bbox, limit, ..
            }) => {
                assert_eq!(url, "http://localhost:8000");
                assert_eq!(bbox, Some(vec![-10.0, -5.5, 10.0, 5.5]));
                assert_eq!(limit, Some(20));
            }
            _ => panic!("expected probe"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["geoprovider", "queryables", "-c", "alt.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("alt.toml"));
        assert!(matches!(cli.command, Some(Commands::Queryables)));
    }

    #[test]
    fn test_parse_config_generate() {
        let cli =
            Cli::try_parse_from(["geoprovider", "config", "generate", "out.toml", "--force"])
                .unwrap();
        match cli.command {
            Some(Commands::Config {
                action: ConfigCommands::Generate { output_path, force },
            }) => {
                assert_eq!(output_path.as_deref(), Some("out.toml"));
                assert!(force);
            }
            _ => panic!("expected config generate"),
        }
    }
}
