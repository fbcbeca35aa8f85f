//! Server mode
//!
//! This module contains the HTTP server startup logic.

use actix_web::{
    App, HttpServer,
    middleware::Compress,
};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::api::configure;
use crate::api::middleware::{RequestIdMiddleware, TimingMiddleware};
use crate::api::services::AppStartTime;
use crate::config::StaticConfig;
use crate::runtime::lifetime;

/// Seconds in-flight requests get after SIGINT/SIGTERM
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Run the HTTP server
///
/// 1. Resolves the port and builds the feature provider
/// 2. Configures and starts the HTTP server
/// 3. Returns once actix has shut down (it handles SIGINT/SIGTERM itself)
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let app_start_time = AppStartTime::now();

    let startup = lifetime::startup::prepare_server_startup(config).map_err(|e| {
        tracing::error!("Server startup failed: {:#}", e);
        e
    })?;

    let routes = configure(startup.provider.clone(), app_start_time);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TimingMiddleware) // 在 request span 内记录延迟
            .wrap(RequestIdMiddleware)
            .wrap(Compress::default())
            .configure(routes.clone())
    })
    .keep_alive(Duration::from_secs(30))
    .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
    .workers(startup.workers)
    .bind(&startup.bind_address)
    .with_context(|| format!("Failed to bind {}", startup.bind_address))?;

    info!(
        "Serving {} provider at http://{} ({} workers)",
        startup.provider.name(),
        startup.bind_address,
        startup.workers
    );

    server.run().await?;
    warn!("Server stopped");
    Ok(())
}
