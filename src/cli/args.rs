//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Uptime Vitals - HTTP端点可用性监控工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "uptime-vitals",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "UPTIME_VITALS_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别，未指定时使用配置文件中的级别
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "UPTIME_VITALS_LOG_LEVEL"
    )]
    pub log_level: Option<LogLevel>,

    /// 以JSON格式输出日志
    #[arg(long, help = "以JSON格式输出日志")]
    pub json_logs: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 启动监控服务（调度器、即时检测队列和Web服务器），Ctrl+C 停止
    Start {
        /// 检测间隔（秒）
        #[arg(
            short,
            long,
            value_name = "SECONDS",
            help = "检测间隔（秒）",
            env = "UPTIME_VITALS_INTERVAL"
        )]
        interval: Option<u64>,

        /// Web服务器绑定地址
        #[arg(long, value_name = "ADDR", help = "Web服务器绑定地址")]
        bind: Option<String>,

        /// Web服务器端口
        #[arg(short, long, value_name = "PORT", help = "Web服务器端口")]
        port: Option<u16>,
    },

    /// 对单个URL执行一次探测，端点可用时退出码为0，否则为1
    Check {
        /// 被探测的URL
        #[arg(value_name = "URL", help = "被探测的URL")]
        url: String,

        /// 端点名称
        #[arg(short, long, default_value = "adhoc", help = "端点名称")]
        name: String,

        /// 超时时间（秒）
        #[arg(
            short,
            long,
            value_name = "SECONDS",
            default_value = "10",
            help = "超时时间（秒）"
        )]
        timeout: u64,
    },

    /// 验证配置文件
    Validate {
        /// 配置文件路径
        #[arg(value_name = "FILE", help = "配置文件路径")]
        config_path: Option<PathBuf>,
    },
}
