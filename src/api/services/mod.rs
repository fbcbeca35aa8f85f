pub mod health;
pub mod search;

pub use health::{AppStartTime, HealthService, health_routes};
pub use search::{SearchService, search_routes};
