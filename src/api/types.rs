//! HTTP 响应类型与统一错误码

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// 统一响应包装
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 查询转换错误
/// - 3000-3099: 上游 API 错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    InternalServerError = 1005,

    // 查询转换错误 2000-2099
    UnsupportedFilter = 2000,

    // 上游错误 3000-3099
    UpstreamUnavailable = 3000,
    UpstreamInvalidResponse = 3001,
}

/// Health endpoint payload
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub timestamp: String,
    pub uptime: u64,
    pub response_time_ms: u32,
}
