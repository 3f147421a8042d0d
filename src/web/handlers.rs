//! Web 路由处理函数
//!
//! 实现 Web 服务器的路由处理逻辑

use super::{ApiError, HealthResponse, WebAppState};
use crate::status::Endpoint;
use askama::Template;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
};
use tracing::{debug, error};

/// 仪表板模板
#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    refresh_interval: u32,
    version: &'static str,
}

/// 仪表板页面处理函数
///
/// 页面本身是静态的，状态由浏览器轮询 `/api/status` 获取。
pub async fn dashboard(State(app_state): State<WebAppState>) -> impl IntoResponse {
    let template = DashboardTemplate {
        refresh_interval: app_state.config.refresh_interval_seconds,
        version: crate::VERSION,
    };

    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("模板渲染失败: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "模板渲染失败").into_response()
        }
    }
}

/// 端点注册处理函数
///
/// 注册后立即排队一次检测，不等待检测完成。
pub async fn register_endpoint(
    State(app_state): State<WebAppState>,
    payload: Result<Json<Endpoint>, JsonRejection>,
) -> Result<(StatusCode, Json<Endpoint>), ApiError> {
    let Json(endpoint) = payload.map_err(|rejection| {
        debug!("注册请求格式错误: {}", rejection.body_text());
        ApiError::bad_request(rejection.body_text())
    })?;

    let stored = app_state.registry.register(endpoint).await;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// API 状态端点处理函数
pub async fn api_status(State(app_state): State<WebAppState>) -> impl IntoResponse {
    Json(app_state.store().snapshot_all().await)
}

/// 存活检查处理函数
pub async fn health(State(app_state): State<WebAppState>) -> Json<HealthResponse> {
    let uptime = chrono::Utc::now() - app_state.start_time;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        endpoints: app_state.store().len().await,
    })
}
