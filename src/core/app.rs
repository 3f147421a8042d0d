//! 应用程序核心逻辑
//!
//! 包含主函数、命令执行和应用程序生命周期管理

use crate::cli::args::{Args, Commands};
use crate::cli::commands::{CheckCommand, Command, ValidateCommand};
use crate::core::foreground_service::ForegroundService;
use crate::core::service::ServiceLauncher;
use crate::logging::{self, LogConfig, LoggingSystem};
use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use tracing::info;

/// 应用程序主函数
///
/// # 返回
/// * `Result<bool>` - 命令是否成功
pub async fn main() -> Result<bool> {
    let args = Args::parse();
    execute_command(&args).await
}

/// 初始化日志系统
///
/// 命令行级别优先，其次是配置文件中的级别。
fn init_logging(args: &Args, config_level: Option<&str>) -> Result<()> {
    let level = args
        .log_level
        .map(LevelFilter::from)
        .or_else(|| config_level.and_then(logging::parse_level))
        .unwrap_or(LevelFilter::Info);

    LoggingSystem::setup_logging(LogConfig::new(level, args.json_logs))
        .context("初始化日志系统失败")
}

/// 执行CLI命令
pub async fn execute_command(args: &Args) -> Result<bool> {
    match &args.command {
        Commands::Start { .. } => {
            let config = ServiceLauncher::load_and_validate_config(args).await?;
            init_logging(args, Some(&config.global.log_level))?;

            info!("{} v{} 启动", crate::APP_NAME, crate::VERSION);
            ForegroundService::new().start(config).await?;
            Ok(true)
        }
        Commands::Check { .. } => {
            init_logging(args, Some("warn"))?;
            CheckCommand.execute(args).await.map_err(anyhow::Error::from)
        }
        Commands::Validate { .. } => {
            init_logging(args, Some("warn"))?;
            ValidateCommand
                .execute(args)
                .await
                .map_err(anyhow::Error::from)
        }
    }
}
