//! CLI interface module
//!
//! This module provides command-line interface functionality for geoprovider.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::config::init_config;
use crate::errors::ProviderError;
use commands::{ProbeArgs, config_generate, print_queryables, probe};

#[derive(Debug)]
pub enum CliError {
    ConfigError(String),
    ParseError(String),
    RequestError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::ConfigError(msg) => format!("Config error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::RequestError(msg) => format!("Request error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::ConfigError(msg) => {
                format!("{} {}", "Config error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::RequestError(msg) => {
                format!("{} {}", "Request error:".red().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<ProviderError> for CliError {
    fn from(err: ProviderError) -> Self {
        let msg = err.message().to_string();
        match err {
            ProviderError::Config(_) => CliError::ConfigError(msg),
            ProviderError::Validation(_)
            | ProviderError::UnsupportedFilter(_)
            | ProviderError::DateParse(_)
            | ProviderError::ResponseParse(_)
            | ProviderError::Serialization(_) => CliError::ParseError(msg),
            ProviderError::Upstream(_) => CliError::RequestError(msg),
            ProviderError::FileOperation(_)
            | ProviderError::OpenApi(_)
            | ProviderError::Internal(_) => CliError::CommandError(err.format_simple()),
        }
    }
}

/// Run a CLI command from clap-parsed input
///
/// Only `queryables` loads the configuration; `probe` talks to a running
/// server and `config generate` must work before any config exists.
pub async fn run_cli_command(cmd: Commands, config_path: Option<&str>) -> Result<(), CliError> {
    match cmd {
        Commands::Queryables => {
            let config = init_config(config_path)?;
            print_queryables(&config)
        }

        Commands::Probe {
            url,
            bbox,
            datetime,
            limit,
            filter,
        } => {
            probe(ProbeArgs {
                url,
                bbox,
                datetime,
                limit,
                filter,
            })
            .await
        }

        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_generate(output_path, force).await,

        Commands::Serve => Err(CliError::CommandError(
            "serve is handled by the server runtime".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_errors_keep_their_category() {
        assert!(matches!(
            CliError::from(ProviderError::config("missing api_url")),
            CliError::ConfigError(_)
        ));
        assert!(matches!(
            CliError::from(ProviderError::upstream("refused")),
            CliError::RequestError(_)
        ));
        assert!(matches!(
            CliError::from(ProviderError::validation("bad bbox")),
            CliError::ParseError(_)
        ));

        let err = CliError::from(ProviderError::openapi("openapi.json: no such file"));
        assert!(matches!(err, CliError::CommandError(_)));
        assert_eq!(
            err.to_string(),
            "Command error: OpenAPI Document Error: openapi.json: no such file"
        );
    }
}
