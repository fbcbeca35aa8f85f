use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to defaults when `init_config`
/// was never called (tests, library use).
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .load_full()
}

/// Initialize the global configuration
///
/// Loads `path` (or `config.toml` in the current directory when `None`)
/// and validates it. The first successful call wins.
pub fn init_config(path: Option<&str>) -> Result<Arc<StaticConfig>> {
    let config = StaticConfig::load(path)?;
    super::validators::validate_static_config(&config)?;
    Ok(CONFIG
        .get_or_init(|| ArcSwap::from_pointee(config))
        .load_full())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_falls_back_to_defaults() {
        let config = get_config();
        assert!(config.upstream.max_page_size > 0);
        assert!(Arc::ptr_eq(&config, &get_config()));
    }
}
