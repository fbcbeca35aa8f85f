use clap::Parser;

use geoprovider::cli::{Cli, Commands};
use geoprovider::config::init_config;
use geoprovider::runtime::modes;
use geoprovider::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Serve) => {
            let config = match init_config(cli.config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("{}", e.format_colored());
                    std::process::exit(1);
                }
            };
            let _guard = match init_logging(&config.logging) {
                Ok(guard) => guard,
                Err(e) => {
                    eprintln!("{}", e.format_colored());
                    std::process::exit(1);
                }
            };
            modes::run_server(&config).await?;
        }
        Some(command) => {
            if let Err(e) = modes::run_cli(command, cli.config.as_deref()).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
