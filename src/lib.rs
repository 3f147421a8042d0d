//! Uptime Vitals - HTTP端点可用性监控工具
//!
//! 这是一个用Rust编写的端点可用性监控工具，支持：
//! - 定时HTTP探测与状态跟踪
//! - 有界的检测历史（按时间窗口裁剪）
//! - 停机事件记录
//! - HTTP API与Web仪表板
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod health;
pub mod logging;
pub mod status;
pub mod web;

// 重新导出主要类型
pub use config::{Config, GlobalConfig, WebConfig};
pub use error::UptimeVitalsError;
pub use health::{CheckCoordinator, CheckQueue, HttpProber, Prober, Scheduler};
pub use status::{Endpoint, EndpointRegistry, EndpointStatus, StatusStore};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
