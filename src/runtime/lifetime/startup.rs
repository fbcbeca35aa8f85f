use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{PORT_ENV, StaticConfig};
use crate::provider::{FeatureProvider, build_provider};

pub struct StartupContext {
    pub provider: Arc<dyn FeatureProvider>,
    pub bind_address: String,
    pub workers: usize,
}

/// 准备服务器启动的上下文
/// 包括数据源和监听地址
pub fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let port_env = std::env::var(PORT_ENV).ok();
    let port = config
        .server
        .effective_port(port_env.as_deref())
        .context("Failed to resolve listening port")?;
    if port != config.server.port {
        warn!(
            "{} environment variable overrides configured port {} -> {}",
            PORT_ENV, config.server.port, port
        );
    }

    let provider = build_provider(config).context("Failed to create feature provider")?;

    let workers = config.server.workers.clamp(1, 32);
    let bind_address = format!("{}:{}", config.server.host, port);

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        provider,
        bind_address,
        workers,
    })
}
