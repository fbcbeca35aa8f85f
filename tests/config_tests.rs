//! Configuration loading tests
//!
//! Exercise TOML loading, defaults and validation against real files.

use std::fs;

use geoprovider::config::validators::validate_static_config;
use geoprovider::config::{HttpMethod, ProviderKind, StaticConfig};
use geoprovider::errors::ProviderError;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_load_full_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[server]
host = "127.0.0.1"
port = 9100
workers = 2

[provider]
kind = "api"

[upstream]
api_url = "https://api.example.org/occurrence/search"
max_page_size = 500
date_format = "%d/%m/%Y"

[upstream.default_params]
format = "json"
api_key = "abc"

[upstream.params]
bbox = "extent"
start_date = "from"
end_date = "to"

[upstream.response]
results_key = "data"
latitude_key = "lat"
longitude_key = "lon"

[queryables.properties.species]
title = "Species"
type = "string"

[logging]
level = "debug"
format = "json"
"#,
    );

    let config = StaticConfig::load(Some(&path)).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.workers, 2);
    assert_eq!(config.provider.kind, ProviderKind::Api);
    assert_eq!(config.upstream.max_page_size, 500);
    assert_eq!(config.upstream.default_params["api_key"], "abc");
    assert_eq!(config.upstream.params.bbox, "extent");
    assert_eq!(config.upstream.params.start_date, "from");
    // untouched names keep their defaults
    assert_eq!(config.upstream.params.ids, "ids");
    assert_eq!(config.upstream.response.results_key, "data");
    assert_eq!(config.upstream.response.datetime_key, "UTC");
    assert!(config.queryables.properties.contains_key("species"));
    assert_eq!(config.logging.format, "json");

    validate_static_config(&config).unwrap();
}

#[test]
fn test_load_simulated_minimal() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[provider]
kind = "simulated"

[simulation]
intensity = 0.25
default_bbox = [0.0, 40.0, 10.0, 50.0]
"#,
    );

    let config = StaticConfig::load(Some(&path)).unwrap();
    assert_eq!(config.provider.kind, ProviderKind::Simulated);
    assert_eq!(config.simulation.intensity, 0.25);
    assert_eq!(config.simulation.default_bbox, [0.0, 40.0, 10.0, 50.0]);
    assert_eq!(config.server.port, 8000);
    validate_static_config(&config).unwrap();
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = StaticConfig::load(Some(missing.to_str().unwrap())).unwrap_err();
    assert!(matches!(err, ProviderError::Config(_)));
}

#[test]
fn test_unknown_provider_kind_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[provider]\nkind = \"database\"\n");
    assert!(StaticConfig::load(Some(&path)).is_err());
}

#[test]
fn test_default_api_config_fails_validation() {
    let err = validate_static_config(&StaticConfig::default()).unwrap_err();
    assert_eq!(err.code(), "E001");
    assert!(err.message().contains("api_url"));
}

#[test]
fn test_saved_sample_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.toml");

    let mut config = StaticConfig::default();
    config.upstream.api_url = "http://localhost:9000/records".to_string();
    config.save_to_file(&path).unwrap();

    let loaded = StaticConfig::load(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(loaded.upstream.api_url, "http://localhost:9000/records");
    assert_eq!(HttpMethod::default(), HttpMethod::Post);
    validate_static_config(&loaded).unwrap();
}
