//! Feature providers
//!
//! A provider answers the two requests the host platform makes: a feature
//! search and a description of its queryable parameters.
//!
//! - `api_wrapper`: translate the search into an upstream API call and the
//!   response back into GeoJSON
//! - `simulated`: synthetic Poisson point process, no upstream needed

pub mod api_wrapper;
pub mod client;
pub mod cql;
pub mod features;
pub mod geometry;
pub mod pagination;
pub mod params;
pub mod queryables;
pub mod search;
pub mod simulated;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{ProviderKind, StaticConfig};
use crate::errors::Result;

pub use api_wrapper::ApiWrapperProvider;
pub use client::{CachedUpstream, UpstreamApi, UpstreamResponse, UreqUpstream};
pub use features::{Feature, FeatureCollection};
pub use geometry::Geometry;
pub use queryables::{Property, Queryables};
pub use search::{SearchRequest, SearchResponse};
pub use simulated::SimulatedProvider;

/// 数据源 trait
#[async_trait]
pub trait FeatureProvider: Send + Sync {
    /// Answer a search with one page of features
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse>;

    fn queryables(&self) -> &Queryables;

    /// 获取 provider 名称（用于日志和健康检查）
    fn name(&self) -> &'static str;
}

/// Build the provider selected by `provider.kind`
pub fn build_provider(config: &StaticConfig) -> Result<Arc<dyn FeatureProvider>> {
    let provider: Arc<dyn FeatureProvider> = match config.provider.kind {
        ProviderKind::Api => {
            crate::config::validators::validate_api_url(&config.upstream.api_url)?;
            let queryables = Queryables::load(&config.queryables)?;
            let upstream =
                CachedUpstream::wrap(Arc::new(UreqUpstream::new(&config.upstream)), &config.upstream);
            Arc::new(ApiWrapperProvider::new(
                config.upstream.clone(),
                queryables,
                upstream,
            ))
        }
        ProviderKind::Simulated => Arc::new(SimulatedProvider::new(
            config.simulation.clone(),
            config.upstream.max_page_size,
        )),
    };

    info!("Feature provider initialized: {}", provider.name());
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_simulated() {
        let mut config = StaticConfig::default();
        config.provider.kind = ProviderKind::Simulated;
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "simulated");
        assert!(provider.queryables().contains("intensity"));
    }

    #[test]
    fn test_build_api_requires_url() {
        assert!(build_provider(&StaticConfig::default()).is_err());

        let mut config = StaticConfig::default();
        config.upstream.api_url = "https://api.example.org/records".to_string();
        assert_eq!(build_provider(&config).unwrap().name(), "api");
    }
}
