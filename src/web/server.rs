//! Web服务器实现
//!
//! 提供HTTP服务器和路由管理

use super::{handlers, WebAppState};
use crate::config::WebConfig;
use crate::error::{Result, UptimeVitalsError};
use crate::status::EndpointRegistry;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// 构建应用路由
///
/// API路由允许任意来源跨域访问，预检请求由 CORS 层直接应答。
pub fn build_router(state: WebAppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/health", get(handlers::health))
        .route("/api/endpoint", post(handlers::register_endpoint))
        .route("/api/status", get(handlers::api_status))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Web服务器
pub struct WebServer {
    /// 配置
    config: WebConfig,
    /// 应用状态
    state: WebAppState,
}

impl WebServer {
    /// 创建新的Web服务器
    pub fn new(config: WebConfig, registry: EndpointRegistry) -> Self {
        let state = WebAppState::new(registry, config.clone());
        Self { config, state }
    }

    /// 绑定监听地址
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self
            .config
            .socket_addr()
            .map_err(UptimeVitalsError::InvalidInput)?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            UptimeVitalsError::Other(anyhow::anyhow!("绑定监听地址 {} 失败: {}", addr, e))
        })?;
        Ok(listener)
    }

    /// 在给定监听器上运行，直到收到关闭信号
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let addr = listener.local_addr()?;
        let router = build_router(self.state);

        info!("Web服务器已启动: http://{}", addr);
        info!("仪表板地址: http://{}/", addr);
        info!("状态API: http://{}/api/status", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("接收到关闭信号，正在关闭Web服务器...");
            })
            .await?;

        info!("Web服务器已关闭");
        Ok(())
    }

    /// 绑定并运行
    pub async fn start(self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        if !self.config.enabled {
            info!("Web服务器已禁用");
            return Ok(());
        }

        let listener = self.bind().await?;
        self.serve(listener, shutdown_rx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::prober::testing::StaticProber;
    use crate::health::{CheckCoordinator, CheckQueue, EndpointState};
    use crate::status::{EndpointStatus, StatusStore};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> (WebAppState, StatusStore) {
        let store = StatusStore::default();
        let prober = Arc::new(StaticProber::with("http://svc.local", 200));
        let coordinator = Arc::new(CheckCoordinator::new(store.clone(), prober));
        let (queue, _handle) = CheckQueue::start(coordinator, 8, 2);
        let registry = EndpointRegistry::new(store.clone(), queue);
        (WebAppState::new(registry, WebConfig::default()), store)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn register_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/endpoint")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_endpoint_returns_created() {
        let (state, store) = test_state();
        let router = build_router(state);

        let response = router
            .oneshot(register_request(r#"{"name":"svc","url":"http://svc.local"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["name"], "svc");
        assert_eq!(body["url"], "http://svc.local");
        assert!(store.status("svc").await.is_some());
    }

    #[tokio::test]
    async fn test_register_malformed_json_is_bad_request() {
        let (state, store) = test_state();
        let router = build_router(state);

        let response = router
            .oneshot(register_request(r#"{"name":"svc""#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_missing_field_is_bad_request() {
        let (state, _) = test_state();
        let response = build_router(state)
            .oneshot(register_request(r#"{"name":"svc"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_status_returns_snapshot() {
        let (state, store) = test_state();
        state
            .registry
            .register(crate::status::Endpoint::new("svc", "http://svc.local"))
            .await;

        // 等待即时检测完成
        for _ in 0..100 {
            let status = store.status("svc").await.unwrap();
            if status.current_status != EndpointState::Pending {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["svc"]["currentStatus"], "UP");
        assert_eq!(body["svc"]["history"][0]["statusCode"], 200);

        let parsed: BTreeMap<String, EndpointStatus> = serde_json::from_value(body).unwrap();
        assert_eq!(parsed["svc"].history.len(), 1);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (state, _) = test_state();
        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/status")
                    .header(header::ORIGIN, "http://dashboard.local")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_dashboard_renders() {
        let (state, _) = test_state();
        let response = build_router(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("/api/status"));
        assert!(html.contains(crate::VERSION));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (state, _) = test_state();
        let response = build_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["endpoints"], 0);
    }

    #[tokio::test]
    async fn test_disabled_server_returns_immediately() {
        let (state, _) = test_state();
        let config = WebConfig {
            enabled: false,
            ..Default::default()
        };
        let server = WebServer::new(config, state.registry);
        let (_tx, rx) = broadcast::channel(1);

        assert!(server.start(rx).await.is_ok());
    }
}
