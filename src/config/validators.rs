//! 配置值验证模块
//!
//! 启动时检查静态配置，尽早暴露部署错误。

use super::{ProviderKind, StaticConfig};
use crate::errors::{ProviderError, Result};

/// Upper bound for `simulation.default_days` (100 years)
pub const MAX_DEFAULT_DAYS: u32 = 36_500;

/// Validate the loaded configuration before the server starts
pub fn validate_static_config(config: &StaticConfig) -> Result<()> {
    if config.upstream.max_page_size == 0 {
        return Err(ProviderError::config("upstream.max_page_size must be > 0"));
    }

    if config.provider.kind == ProviderKind::Api {
        validate_api_url(&config.upstream.api_url)?;
    }

    let sim = &config.simulation;
    if !sim.intensity.is_finite() || sim.intensity < 0.0 {
        return Err(ProviderError::config(format!(
            "simulation.intensity must be a non-negative number, got {}",
            sim.intensity
        )));
    }
    if sim.default_days > MAX_DEFAULT_DAYS {
        return Err(ProviderError::config(format!(
            "simulation.default_days must be <= {}, got {}",
            MAX_DEFAULT_DAYS, sim.default_days
        )));
    }
    let [minx, miny, maxx, maxy] = sim.default_bbox;
    if minx > maxx || miny > maxy {
        return Err(ProviderError::config(format!(
            "simulation.default_bbox is inverted: {:?}",
            sim.default_bbox
        )));
    }

    match config.logging.format.as_str() {
        "text" | "json" => Ok(()),
        other => Err(ProviderError::config(format!(
            "Invalid logging.format: '{}'. Valid: text, json",
            other
        ))),
    }
}

/// The upstream URL must be an absolute http(s) URL
pub fn validate_api_url(api_url: &str) -> Result<()> {
    if api_url.trim().is_empty() {
        return Err(ProviderError::config(
            "upstream.api_url is required when provider.kind = \"api\"",
        ));
    }
    let parsed = url::Url::parse(api_url)
        .map_err(|e| ProviderError::config(format!("Invalid upstream.api_url '{}': {}", api_url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ProviderError::config(format!(
            "Unsupported upstream.api_url scheme: {}",
            scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_config(url: &str) -> StaticConfig {
        let mut config = StaticConfig::default();
        config.upstream.api_url = url.to_string();
        config
    }

    #[test]
    fn test_api_kind_requires_url() {
        let err = validate_static_config(&StaticConfig::default()).unwrap_err();
        assert!(err.message().contains("api_url"));
    }

    #[test]
    fn test_valid_api_config() {
        assert!(validate_static_config(&api_config("https://example.com/v1/obs")).is_ok());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(validate_api_url("ftp://example.com/data").is_err());
        assert!(validate_api_url("not a url").is_err());
    }

    #[test]
    fn test_simulated_kind_needs_no_url() {
        let mut config = StaticConfig::default();
        config.provider.kind = ProviderKind::Simulated;
        assert!(validate_static_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let mut config = api_config("http://localhost:9000/api");
        config.upstream.max_page_size = 0;
        assert!(validate_static_config(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_simulation_settings() {
        let mut config = StaticConfig::default();
        config.provider.kind = ProviderKind::Simulated;
        config.simulation.intensity = -1.0;
        assert!(validate_static_config(&config).is_err());

        config.simulation.intensity = 1.0;
        config.simulation.default_bbox = [10.0, 0.0, -10.0, 5.0];
        assert!(validate_static_config(&config).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_default_days() {
        let mut config = StaticConfig::default();
        config.provider.kind = ProviderKind::Simulated;
        config.simulation.default_days = MAX_DEFAULT_DAYS;
        assert!(validate_static_config(&config).is_ok());

        config.simulation.default_days = u32::MAX;
        let err = validate_static_config(&config).unwrap_err();
        assert!(err.message().contains("default_days"));
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let mut config = api_config("http://localhost:9000/api");
        config.logging.format = "xml".to_string();
        assert!(validate_static_config(&config).is_err());
    }
}
