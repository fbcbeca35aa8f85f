use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::errors::{ProviderError, Result};
use crate::provider::queryables::Property;

/// 配置文件默认路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀（GP__SERVER__PORT=9000）
pub const ENV_PREFIX: &str = "GP";

/// 云平台注入的端口环境变量
pub const PORT_ENV: &str = "PORT";

/// Feature source served by the HTTP layer
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    /// Wraps the configured upstream HTTP API
    #[default]
    Api,
    /// Generates a spatio-temporal Poisson point process
    Simulated,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "simulated" => Ok(Self::Simulated),
            _ => {
                let valid: Vec<&'static str> = Self::iter().map(<&'static str>::from).collect();
                Err(format!(
                    "Invalid provider kind: '{}'. Valid: {}",
                    s,
                    valid.join(", ")
                ))
            }
        }
    }
}

/// HTTP 方法枚举
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            _ => Err(format!("Invalid HTTP method: '{}'. Valid: GET, POST", s)),
        }
    }
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 监听地址、端口、worker 数量
/// - provider: 数据源类型
/// - upstream: 外部 API 地址、默认参数、参数名与响应字段映射
/// - queryables: 可查询参数（OpenAPI 文件或手工配置）
/// - simulation: 模拟点过程参数
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub queryables: QueryablesConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：GP，分隔符：__
    /// 示例：GP__SERVER__PORT=9999
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let (path, required) = match path {
            Some(p) => (p, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };

        let settings = Config::builder()
            // 1. 从 TOML 文件加载（显式指定时必须存在）
            .add_source(File::with_name(path).required(required))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }
        Ok(config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Let a platform-injected `PORT` variable win over `port`
    #[serde(default = "default_true")]
    pub honor_port_env: bool,
}

impl ServerConfig {
    /// Resolve the port the server should bind to
    ///
    /// Container platforms commonly inject `PORT` and ignore whatever the
    /// image was built with. An unparsable value is a hard error so a bad
    /// deployment fails at startup instead of binding somewhere unexpected.
    pub fn effective_port(&self, port_env: Option<&str>) -> Result<u16> {
        if !self.honor_port_env {
            return Ok(self.port);
        }
        match port_env.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                ProviderError::config(format!(
                    "{} environment variable is not a valid port: '{}'",
                    PORT_ENV, raw
                ))
            }),
            None => Ok(self.port),
        }
    }
}

/// 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
}

/// 外部 API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub api_url: String,
    /// Parameters sent with every request (api keys, output format, ...)
    #[serde(default = "default_params")]
    pub default_params: BTreeMap<String, String>,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 0 disables the response cache
    #[serde(default)]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_max_capacity")]
    pub cache_max_capacity: u64,
    /// strftime format for the start/end date parameters
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub params: ParamNames,
    #[serde(default)]
    pub response: ResponseMapping,
}

/// Upstream query parameter names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamNames {
    pub bbox: String,
    pub start_date: String,
    pub end_date: String,
    pub ids: String,
    pub exclude_fields: String,
    pub sort: String,
    pub method: String,
    pub page: String,
    pub page_size: String,
}

/// 上游响应字段映射
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseMapping {
    /// Key holding the record list when the body is an object
    pub results_key: String,
    pub id_key: String,
    pub latitude_key: String,
    pub longitude_key: String,
    pub datetime_key: String,
    pub datetime_format: String,
}

/// 可查询参数配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryablesConfig {
    /// OpenAPI JSON document describing the upstream API
    #[serde(default)]
    pub openapi_path: Option<String>,
    /// Path inside the OpenAPI document whose GET parameters become queryables
    #[serde(default = "default_openapi_endpoint")]
    pub openapi_endpoint: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Property>,
}

/// 模拟点过程配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Expected number of points per square degree per day
    #[serde(default = "default_intensity")]
    pub intensity: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    #[serde(default = "default_bbox")]
    pub default_bbox: [f64; 4],
    #[serde(default = "default_days")]
    pub default_days: u32,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_true")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_true() -> bool {
    true
}

fn default_params() -> BTreeMap<String, String> {
    BTreeMap::from([("format".to_string(), "json".to_string())])
}

fn default_max_page_size() -> u32 {
    200
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_max_capacity() -> u64 {
    1000
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_openapi_endpoint() -> String {
    "/occurrence/search".to_string()
}

fn default_intensity() -> f64 {
    1.0
}

fn default_seed() -> u64 {
    42
}

fn default_max_points() -> usize {
    10_000
}

fn default_bbox() -> [f64; 4] {
    [-180.0, -90.0, 180.0, 90.0]
}

fn default_days() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            workers: default_workers(),
            honor_port_env: true,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            default_params: default_params(),
            max_page_size: default_max_page_size(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: 0,
            cache_max_capacity: default_cache_max_capacity(),
            date_format: default_date_format(),
            params: ParamNames::default(),
            response: ResponseMapping::default(),
        }
    }
}

impl Default for ParamNames {
    fn default() -> Self {
        Self {
            bbox: "bbox".to_string(),
            start_date: "startdate".to_string(),
            end_date: "enddate".to_string(),
            ids: "ids".to_string(),
            exclude_fields: "exclude_columns".to_string(),
            sort: "sort".to_string(),
            method: "method".to_string(),
            page: "page".to_string(),
            page_size: "page_size".to_string(),
        }
    }
}

impl Default for ResponseMapping {
    fn default() -> Self {
        Self {
            results_key: "results".to_string(),
            id_key: "id".to_string(),
            latitude_key: "Latitude".to_string(),
            longitude_key: "Longitude".to_string(),
            datetime_key: "UTC".to_string(),
            datetime_format: "%Y-%m-%dT%H:%M".to_string(),
        }
    }
}

impl Default for QueryablesConfig {
    fn default() -> Self {
        Self {
            openapi_path: None,
            openapi_endpoint: default_openapi_endpoint(),
            properties: BTreeMap::new(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            intensity: default_intensity(),
            seed: default_seed(),
            max_points: default_max_points(),
            default_bbox: default_bbox(),
            default_days: default_days(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: true,
        }
    }
}
