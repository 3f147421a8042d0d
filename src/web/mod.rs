//! Web界面和API模块
//!
//! 提供端点注册、状态查询的HTTP API和Web监控界面

use crate::config::WebConfig;
use crate::status::{EndpointRegistry, StatusStore};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub mod handlers;
pub mod server;

pub use server::{build_router, WebServer};

/// Web应用状态
#[derive(Debug, Clone)]
pub struct WebAppState {
    /// 端点注册表
    pub registry: EndpointRegistry,
    /// Web配置
    pub config: WebConfig,
    /// 启动时间
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl WebAppState {
    /// 创建新的Web应用状态
    pub fn new(registry: EndpointRegistry, config: WebConfig) -> Self {
        Self {
            registry,
            config,
            start_time: chrono::Utc::now(),
        }
    }

    /// 共享状态存储
    pub fn store(&self) -> &StatusStore {
        self.registry.store()
    }
}

/// API错误响应体
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// 始终为 false
    pub success: bool,
    /// 错误信息
    pub error: String,
    /// HTTP状态码，不参与序列化
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    /// 创建新的API错误
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            status,
        }
    }

    /// 请求格式错误
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 版本信息
    pub version: String,
    /// 运行时间
    pub uptime_seconds: u64,
    /// 已注册端点数量
    pub endpoints: usize,
}
