//! Queryables command

use crate::config::StaticConfig;
use crate::interfaces::cli::CliError;
use crate::provider::build_provider;

/// Print the queryables of the configured provider as pretty JSON
pub fn print_queryables(config: &StaticConfig) -> Result<(), CliError> {
    let provider = build_provider(config)?;
    let json = serde_json::to_string_pretty(provider.queryables())
        .map_err(|e| CliError::CommandError(format!("Failed to serialize queryables: {}", e)))?;
    println!("{}", json);
    Ok(())
}
