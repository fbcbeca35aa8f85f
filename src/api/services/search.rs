use std::sync::Arc;

use actix_web::{HttpResponse, web};
use tracing::{debug, error};

use crate::errors::{ProviderError, Result};
use crate::provider::{FeatureProvider, SearchRequest};

/// Largest accepted search body
const MAX_SEARCH_BODY_BYTES: usize = 1024 * 1024;

pub struct SearchService;

impl SearchService {
    /// `POST /search`
    pub async fn search(
        provider: web::Data<Arc<dyn FeatureProvider>>,
        body: web::Json<SearchRequest>,
    ) -> Result<HttpResponse> {
        let request = body.into_inner();
        debug!("Search request: {:?}", request);

        let response = provider.search(request).await.inspect_err(|e| {
            error!("Search failed on {} provider: {}", provider.name(), e);
        })?;

        Ok(HttpResponse::Ok()
            .content_type("application/geo+json")
            .json(response))
    }

    /// `GET /queryables`
    pub async fn queryables(provider: web::Data<Arc<dyn FeatureProvider>>) -> HttpResponse {
        HttpResponse::Ok().json(provider.queryables())
    }
}

/// Malformed JSON bodies get the same envelope as every other error
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_SEARCH_BODY_BYTES)
        .error_handler(|err, _req| ProviderError::validation(err.to_string()).into())
}

/// Search 路由配置
pub fn search_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/search", web::post().to(SearchService::search))
        .route("/queryables", web::get().to(SearchService::queryables));
}
