//! HTTP探测器实现
//!
//! 对端点发起一次GET请求并将结果分类为 `StatusRecord`。
//! 探测从不向调用方返回错误，所有失败都记录在结果中。

use crate::error::{HealthCheckError, Result};
use crate::health::result::StatusRecord;
use crate::status::Endpoint;
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as _;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// 默认探测超时
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// 探测器trait，定义单次探测接口
#[async_trait]
pub trait Prober: Send + Sync {
    /// 探测端点
    ///
    /// # 参数
    /// * `endpoint` - 被探测的端点
    ///
    /// # 返回
    /// * `StatusRecord` - 探测结果，失败信息包含在记录中
    async fn probe(&self, endpoint: &Endpoint) -> StatusRecord;
}

/// 基于reqwest的HTTP探测器
#[derive(Debug, Clone)]
pub struct HttpProber {
    /// HTTP客户端，连接池在探测之间复用
    client: Client,
    /// 单次探测超时
    timeout: Duration,
}

impl HttpProber {
    /// 创建新的HTTP探测器
    ///
    /// # 参数
    /// * `timeout` - 单次探测超时时间
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(HealthCheckError::ClientBuild)?;

        Ok(Self { client, timeout })
    }

    /// 发送请求并读取完整响应体
    async fn fetch(&self, url: &str) -> std::result::Result<u16, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status_code = response.status().as_u16();

        // 只读取并丢弃响应体，状态码已经决定了分类
        if let Err(e) = response.bytes().await {
            debug!("读取响应体失败 {}: {}", url, e);
        }

        Ok(status_code)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &Endpoint) -> StatusRecord {
        let start_time = Instant::now();
        let outcome = timeout(self.timeout, self.fetch(&endpoint.url)).await;
        let response_time = start_time.elapsed();

        match outcome {
            Ok(Ok(status_code)) => StatusRecord::from_response(status_code, response_time),
            Ok(Err(e)) => StatusRecord::from_error(format_request_error(&e), response_time),
            Err(_) => StatusRecord::from_error("Request timeout", response_time),
        }
    }
}

/// 把错误链拼接成小写文本，便于识别底层原因
fn error_chain_text(error: &reqwest::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text.to_lowercase()
}

/// 最底层的错误原因
fn root_cause(error: &reqwest::Error) -> String {
    let mut current: &dyn std::error::Error = error;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

/// 格式化请求错误信息，使其更加清晰易读
pub fn format_request_error(error: &reqwest::Error) -> String {
    let chain = error_chain_text(error);

    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_builder() {
        format!("Invalid URL: {}", root_cause(error))
    } else if chain.contains("dns") || chain.contains("failed to lookup") {
        "DNS resolution failed".to_string()
    } else if chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl") {
        "SSL/TLS certificate error".to_string()
    } else if error.is_connect() {
        if chain.contains("refused") {
            "Connection refused".to_string()
        } else {
            format!("Connection failed: {}", root_cause(error))
        }
    } else if error.is_decode() || error.is_body() {
        "Response decode error".to_string()
    } else {
        format!("Request failed: {}", root_cause(error))
    }
}
