//! HTTP surface consumed by the host platform

pub mod middleware;
pub mod services;
pub mod types;

use std::sync::Arc;

use actix_web::web;

use crate::provider::FeatureProvider;
use services::{AppStartTime, health_routes, search_routes};

/// Register shared state and every route on an actix `App`
///
/// Used by the server and by the HTTP tests so both see the same wiring.
pub fn configure(
    provider: Arc<dyn FeatureProvider>,
    start_time: AppStartTime,
) -> impl Fn(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(provider.clone()))
            .app_data(web::Data::new(start_time.clone()))
            .configure(search_routes)
            .service(health_routes());
    }
}
