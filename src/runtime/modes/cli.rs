//! CLI mode
//!
//! This module contains the CLI mode startup logic.
//! It delegates to the actual CLI implementation.

use crate::cli::Commands;
use crate::interfaces::cli::CliError;

/// Run CLI mode
pub async fn run_cli(command: Commands, config_path: Option<&str>) -> Result<(), CliError> {
    crate::interfaces::cli::run_cli_command(command, config_path).await
}
