//! Upstream HTTP transport
//!
//! 使用 ureq（同步）在 spawn_blocking 中发起请求；`CachedUpstream` 提供可选的 Moka 缓存。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;
use tracing::{debug, trace, warn};
use ureq::Agent;

use crate::config::UpstreamConfig;
use crate::errors::{ProviderError, Result};

/// Longest non-JSON error body kept for logging
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Raw upstream answer; non-2xx statuses are data, not errors
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Upstream API 抽象，便于测试替换
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// GET `url` with the given query pairs
    async fn fetch(&self, url: &str, query: &[(String, String)]) -> Result<UpstreamResponse>;

    /// 获取实现名称（用于日志）
    fn name(&self) -> &'static str;
}

/// Build the full request URL with encoded query parameters
pub fn build_url(base: &str, query: &[(String, String)]) -> Result<String> {
    let url = url::Url::parse_with_params(base, query)
        .map_err(|e| ProviderError::config(format!("Invalid upstream URL '{}': {}", base, e)))?;
    Ok(url.into())
}

/// ureq-backed upstream client
pub struct UreqUpstream {
    agent: Agent,
}

impl UreqUpstream {
    pub fn new(config: &UpstreamConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }

    /// 同步请求（在 spawn_blocking 中调用）
    fn fetch_sync(agent: Agent, url: String) -> Result<UpstreamResponse> {
        let resp = agent.get(&url).call().map_err(|e| {
            warn!("Upstream request failed: {}", e);
            ProviderError::upstream(format!("request failed: {}", e))
        })?;

        let status = resp.status().as_u16();
        let text = resp
            .into_body()
            .read_to_string()
            .map_err(|e| ProviderError::upstream(format!("failed to read response body: {}", e)))?;

        if status != 200 {
            let snippet: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Ok(UpstreamResponse {
                status,
                body: serde_json::from_str(&text).unwrap_or(Value::String(snippet)),
            });
        }

        if text.trim().is_empty() {
            return Ok(UpstreamResponse::ok(Value::Null));
        }

        let body = serde_json::from_str(&text)
            .map_err(|e| ProviderError::response_parse(format!("upstream body is not JSON: {}", e)))?;
        Ok(UpstreamResponse::ok(body))
    }
}

#[async_trait]
impl UpstreamApi for UreqUpstream {
    async fn fetch(&self, url: &str, query: &[(String, String)]) -> Result<UpstreamResponse> {
        let full_url = build_url(url, query)?;

        debug!("Making upstream request with {} parameter(s)", query.len());
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || Self::fetch_sync(agent, full_url))
            .await
            .map_err(|e| ProviderError::internal(format!("upstream task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "ureq"
    }
}

/// Moka TTL cache in front of any upstream
///
/// Keyed by the full request URL. Only 200 responses are stored.
pub struct CachedUpstream {
    inner: Arc<dyn UpstreamApi>,
    cache: Cache<String, UpstreamResponse>,
}

impl CachedUpstream {
    pub fn new(inner: Arc<dyn UpstreamApi>, ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();
        Self { inner, cache }
    }

    /// Wrap `inner` when `cache_ttl_secs > 0`, otherwise hand it back unchanged
    pub fn wrap(inner: Arc<dyn UpstreamApi>, config: &UpstreamConfig) -> Arc<dyn UpstreamApi> {
        if config.cache_ttl_secs == 0 {
            return inner;
        }
        debug!(
            "Upstream cache enabled: ttl {}s, capacity {}",
            config.cache_ttl_secs, config.cache_max_capacity
        );
        Arc::new(Self::new(
            inner,
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_max_capacity,
        ))
    }
}

#[async_trait]
impl UpstreamApi for CachedUpstream {
    async fn fetch(&self, url: &str, query: &[(String, String)]) -> Result<UpstreamResponse> {
        let key = build_url(url, query)?;

        if let Some(hit) = self.cache.get(&key).await {
            trace!("Upstream cache hit");
            return Ok(hit);
        }

        let response = self.inner.fetch(url, query).await?;
        if response.is_success() {
            self.cache.insert(key, response.clone()).await;
        }
        Ok(response)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_build_url_encodes_and_repeats() {
        let url = build_url(
            "https://api.example.com/v2/obs?token=abc",
            &[
                ("ids".to_string(), "a b".to_string()),
                ("ids".to_string(), "c&d".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(url, "https://api.example.com/v2/obs?token=abc&ids=a+b&ids=c%26d");
    }

    #[test]
    fn test_build_url_rejects_relative() {
        assert!(build_url("/relative/path", &[]).is_err());
    }

    /// Counts calls and answers with a fixed status
    struct CountingUpstream {
        status: u16,
        calls: AtomicUsize,
    }

    impl CountingUpstream {
        fn new(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UpstreamApi for CountingUpstream {
        async fn fetch(&self, _url: &str, _query: &[(String, String)]) -> Result<UpstreamResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(UpstreamResponse {
                status: self.status,
                body: json!({ "call": n }),
            })
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    const URL: &str = "https://api.example.com/obs";

    fn query(page: &str) -> Vec<(String, String)> {
        vec![("page".to_string(), page.to_string())]
    }

    fn cached(inner: Arc<CountingUpstream>) -> CachedUpstream {
        CachedUpstream::new(inner, Duration::from_secs(60), 100)
    }

    #[tokio::test]
    async fn test_cache_hit_skips_upstream() {
        let inner = CountingUpstream::new(200);
        let client = cached(inner.clone());

        let first = client.fetch(URL, &query("1")).await.unwrap();
        let second = client.fetch(URL, &query("1")).await.unwrap();

        assert_eq!(inner.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(client.name(), "counting");
    }

    #[tokio::test]
    async fn test_cache_miss_on_different_query() {
        let inner = CountingUpstream::new(200);
        let client = cached(inner.clone());

        let first = client.fetch(URL, &query("1")).await.unwrap();
        let second = client.fetch(URL, &query("2")).await.unwrap();

        assert_eq!(inner.calls(), 2);
        assert_ne!(first.body, second.body);
    }

    #[tokio::test]
    async fn test_non_200_is_not_cached() {
        let inner = CountingUpstream::new(503);
        let client = cached(inner.clone());

        let first = client.fetch(URL, &query("1")).await.unwrap();
        client.fetch(URL, &query("1")).await.unwrap();

        assert_eq!(first.status, 503);
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn test_wrap_without_ttl_is_passthrough() {
        let inner = CountingUpstream::new(200);
        let client = CachedUpstream::wrap(inner.clone(), &UpstreamConfig::default());

        client.fetch(URL, &query("1")).await.unwrap();
        client.fetch(URL, &query("1")).await.unwrap();
        assert_eq!(inner.calls(), 2);

        let config = UpstreamConfig {
            cache_ttl_secs: 30,
            ..UpstreamConfig::default()
        };
        let inner = CountingUpstream::new(200);
        let client = CachedUpstream::wrap(inner.clone(), &config);
        client.fetch(URL, &query("1")).await.unwrap();
        client.fetch(URL, &query("1")).await.unwrap();
        assert_eq!(inner.calls(), 1);
    }

    /// 依赖外部网络服务，CI 环境可能失败
    #[tokio::test]
    #[ignore]
    async fn test_fetch_real_endpoint() {
        let client = UreqUpstream::new(&UpstreamConfig::default());
        let resp = client.fetch("https://httpbin.org/json", &[]).await.unwrap();
        assert!(resp.is_success());
        assert!(resp.body.is_object());
    }
}
