//! Remote provider backed by an external HTTP API

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use super::client::UpstreamApi;
use super::features::{Feature, convert_results, is_empty_response};
use super::pagination::{self, PageRequest};
use super::params::translate;
use super::queryables::Queryables;
use super::search::{SearchRequest, SearchResponse};
use super::FeatureProvider;
use crate::config::UpstreamConfig;
use crate::errors::Result;

pub struct ApiWrapperProvider {
    config: UpstreamConfig,
    queryables: Queryables,
    upstream: Arc<dyn UpstreamApi>,
}

impl ApiWrapperProvider {
    pub fn new(config: UpstreamConfig, queryables: Queryables, upstream: Arc<dyn UpstreamApi>) -> Self {
        info!(
            "API provider targeting {} via {} ({} queryables, max page size {})",
            config.api_url,
            upstream.name(),
            queryables.len(),
            config.max_page_size
        );
        Self {
            config,
            queryables,
            upstream,
        }
    }

    /// Fetch one page from the upstream API and convert it
    ///
    /// A non-200 answer is logged and yields no features. Polygonal
    /// `intersects` geometries are applied to the converted points, since
    /// only their bounding box reached the upstream.
    pub async fn request_features(&self, request: &SearchRequest, page: &PageRequest) -> Result<Vec<Feature>> {
        let params = translate(request, page, &self.config, &self.queryables)?;
        let query = params.to_query_pairs();
        info!("Making request with {} parameter(s)", query.len());

        let response = self.upstream.fetch(&self.config.api_url, &query).await?;
        if !response.is_success() {
            error!("Upstream returned status {}: {}", response.status, response.body);
            return Ok(Vec::new());
        }

        if is_empty_response(&response.body) {
            info!("No results returned from API");
            return Ok(Vec::new());
        }

        let mut features = convert_results(&response.body, &self.config.response)?;

        if let Some(geometry) = request.intersects.as_ref().filter(|g| g.is_polygonal()) {
            let before = features.len();
            features.retain(|f| {
                f.geometry
                    .as_point()
                    .is_some_and(|(x, y)| geometry.contains_point(x, y))
            });
            info!(
                "intersects filter kept {} of {} features",
                features.len(),
                before
            );
        }

        info!("Received {} features", features.len());
        Ok(features)
    }
}

#[async_trait]
impl FeatureProvider for ApiWrapperProvider {
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        request.validate()?;

        let page = pagination::resolve(
            request.limit,
            request.pagination.as_ref(),
            self.config.max_page_size,
        );
        if let Some(p) = &request.pagination {
            info!("Received pagination: {:?}", p);
        }
        if !request.provider_properties.is_empty() {
            info!(
                "Received provider_properties: {:?}",
                request.provider_properties.keys().collect::<Vec<_>>()
            );
        }

        let features = self.request_features(&request, &page).await?;
        Ok(SearchResponse::new(features, page.next()))
    }

    fn queryables(&self) -> &Queryables {
        &self.queryables
    }

    fn name(&self) -> &'static str {
        "api"
    }
}
