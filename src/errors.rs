use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::api::types::{ApiResponse, ErrorCode};

#[derive(Debug, Clone)]
pub enum ProviderError {
    Config(String),
    Validation(String),
    UnsupportedFilter(String),
    Upstream(String),
    ResponseParse(String),
    Serialization(String),
    FileOperation(String),
    OpenApi(String),
    DateParse(String),
    Internal(String),
}

impl ProviderError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ProviderError::Config(_) => "E001",
            ProviderError::Validation(_) => "E002",
            ProviderError::UnsupportedFilter(_) => "E003",
            ProviderError::Upstream(_) => "E004",
            ProviderError::ResponseParse(_) => "E005",
            ProviderError::Serialization(_) => "E006",
            ProviderError::FileOperation(_) => "E007",
            ProviderError::OpenApi(_) => "E008",
            ProviderError::DateParse(_) => "E009",
            ProviderError::Internal(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ProviderError::Config(_) => "Configuration Error",
            ProviderError::Validation(_) => "Validation Error",
            ProviderError::UnsupportedFilter(_) => "Unsupported Filter",
            ProviderError::Upstream(_) => "Upstream API Error",
            ProviderError::ResponseParse(_) => "Response Parse Error",
            ProviderError::Serialization(_) => "Serialization Error",
            ProviderError::FileOperation(_) => "File Operation Error",
            ProviderError::OpenApi(_) => "OpenAPI Document Error",
            ProviderError::DateParse(_) => "Date Parse Error",
            ProviderError::Internal(_) => "Internal Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ProviderError::Config(msg)
            | ProviderError::Validation(msg)
            | ProviderError::UnsupportedFilter(msg)
            | ProviderError::Upstream(msg)
            | ProviderError::ResponseParse(msg)
            | ProviderError::Serialization(msg)
            | ProviderError::FileOperation(msg)
            | ProviderError::OpenApi(msg)
            | ProviderError::DateParse(msg)
            | ProviderError::Internal(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// Error code used in the JSON envelope returned to HTTP clients
    pub fn api_code(&self) -> ErrorCode {
        match self {
            ProviderError::Validation(_) | ProviderError::DateParse(_) => ErrorCode::BadRequest,
            ProviderError::UnsupportedFilter(_) => ErrorCode::UnsupportedFilter,
            ProviderError::Upstream(_) => ErrorCode::UpstreamUnavailable,
            ProviderError::ResponseParse(_) => ErrorCode::UpstreamInvalidResponse,
            _ => ErrorCode::InternalServerError,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 默认使用简洁格式
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ProviderError {}

impl ResponseError for ProviderError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProviderError::Validation(_)
            | ProviderError::UnsupportedFilter(_)
            | ProviderError::DateParse(_) => StatusCode::BAD_REQUEST,
            ProviderError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::<()> {
            code: self.api_code() as i32,
            message: self.format_simple(),
            data: None,
        })
    }
}

// 便捷的构造函数
impl ProviderError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        ProviderError::Config(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ProviderError::Validation(msg.into())
    }

    pub fn unsupported_filter<T: Into<String>>(msg: T) -> Self {
        ProviderError::UnsupportedFilter(msg.into())
    }

    pub fn upstream<T: Into<String>>(msg: T) -> Self {
        ProviderError::Upstream(msg.into())
    }

    pub fn response_parse<T: Into<String>>(msg: T) -> Self {
        ProviderError::ResponseParse(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ProviderError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ProviderError::FileOperation(msg.into())
    }

    pub fn openapi<T: Into<String>>(msg: T) -> Self {
        ProviderError::OpenApi(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        ProviderError::DateParse(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        ProviderError::Internal(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for ProviderError {
    fn from(err: chrono::ParseError) -> Self {
        ProviderError::DateParse(err.to_string())
    }
}

impl From<config::ConfigError> for ProviderError {
    fn from(err: config::ConfigError) -> Self {
        ProviderError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ProviderError {
    fn from(err: toml::ser::Error) -> Self {
        ProviderError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
