//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Uptime Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum UptimeVitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 健康检测相关错误
    #[error("健康检测错误: {0}")]
    HealthCheck(#[from] HealthCheckError),

    /// 客户端输入错误（例如格式错误的注册请求）
    #[error("无效的输入: {0}")]
    InvalidInput(String),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 健康检测错误类型
///
/// 单次探测的失败不会变成错误，而是记录在 `StatusRecord` 中；
/// 这里只包含探测器自身无法构建等启动期错误。
#[derive(Error, Debug)]
pub enum HealthCheckError {
    /// HTTP客户端构建失败
    #[error("HTTP客户端创建失败: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, UptimeVitalsError>;
