//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::status::Endpoint;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

/// 主配置结构，包含全局配置和初始端点列表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// 启动时注册的端点
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 检测间隔（秒）
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// 检测历史保留时长（小时）
    #[serde(default = "default_history_window")]
    pub history_window_hours: u64,
    /// 最近停机记录保留条数
    #[serde(default = "default_max_recent_downtime")]
    pub max_recent_downtime: usize,
    /// 最大并发检测数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_checks: usize,
    /// 注册后立即检测的队列容量
    #[serde(default = "default_check_queue_capacity")]
    pub check_queue_capacity: usize,
    /// 检测恢复正常时是否立即结束进行中的停机记录
    #[serde(default)]
    pub close_downtime_on_recovery: bool,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Web 服务器配置
    #[serde(default)]
    pub web: WebConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: default_check_interval(),
            request_timeout_seconds: default_timeout(),
            history_window_hours: default_history_window(),
            max_recent_downtime: default_max_recent_downtime(),
            max_concurrent_checks: default_max_concurrent(),
            check_queue_capacity: default_check_queue_capacity(),
            close_downtime_on_recovery: false,
            log_level: default_log_level(),
            web: WebConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// 检测间隔
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    /// 单次探测超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// 历史保留窗口
    ///
    /// 超出 chrono 可表示范围时取最大值。
    pub fn history_window(&self) -> chrono::Duration {
        i64::try_from(self.history_window_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }
}

/// Web 服务器配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebConfig {
    /// 是否启用 Web 功能
    #[serde(default = "default_web_enabled")]
    pub enabled: bool,
    /// 监听端口
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 绑定地址
    #[serde(default = "default_web_bind_address")]
    pub bind_address: String,
    /// 仪表板自动刷新间隔（秒）
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u32,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: default_web_enabled(),
            port: default_web_port(),
            bind_address: default_web_bind_address(),
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}

impl WebConfig {
    /// 解析监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| format!("无效的监听地址 {}:{}: {}", self.bind_address, self.port, e))
    }
}

/// 历史保留时长上限（一百年）
pub const MAX_HISTORY_WINDOW_HOURS: u64 = 24 * 365 * 100;

// 默认值函数
fn default_check_interval() -> u64 {
    30
}
fn default_timeout() -> u64 {
    10
}
fn default_history_window() -> u64 {
    10
}
fn default_max_recent_downtime() -> usize {
    5
}
fn default_max_concurrent() -> usize {
    16
}
fn default_check_queue_capacity() -> usize {
    64
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_web_enabled() -> bool {
    true
}
fn default_web_port() -> u16 {
    8080
}
fn default_web_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_refresh_interval() -> u32 {
    5
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    let global = &config.global;

    if global.check_interval_seconds == 0 {
        return Err("检测间隔不能为0".to_string());
    }

    if global.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if global.history_window_hours == 0 {
        return Err("历史保留时长不能为0".to_string());
    }

    if global.history_window_hours > MAX_HISTORY_WINDOW_HOURS {
        return Err(format!(
            "历史保留时长不能超过{}小时",
            MAX_HISTORY_WINDOW_HOURS
        ));
    }

    if global.max_recent_downtime == 0 {
        return Err("停机记录保留条数不能为0".to_string());
    }

    if global.max_concurrent_checks == 0 {
        return Err("最大并发检测数不能为0".to_string());
    }

    if global.check_queue_capacity == 0 {
        return Err("检测队列容量不能为0".to_string());
    }

    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            global.log_level, valid_log_levels
        ));
    }

    let web = &global.web;
    if web.enabled {
        if web.port == 0 {
            return Err(format!("无效的Web服务器端口: {}，端口不能为0", web.port));
        }

        if web.bind_address.is_empty() {
            return Err("Web服务器绑定地址不能为空".to_string());
        }

        if web.refresh_interval_seconds == 0 {
            return Err("Web界面刷新间隔不能为0秒".to_string());
        }

        if web.refresh_interval_seconds > 300 {
            return Err("Web界面刷新间隔不能超过300秒".to_string());
        }
    }

    // 配置文件中的端点名称必须唯一，运行时注册则允许覆盖
    let mut seen = HashSet::new();
    for endpoint in &config.endpoints {
        if endpoint.name.trim().is_empty() {
            return Err("端点名称不能为空".to_string());
        }
        if !seen.insert(endpoint.name.as_str()) {
            return Err(format!("端点名称重复: {}", endpoint.name));
        }
    }

    Ok(())
}
