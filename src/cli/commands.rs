//! 命令处理逻辑
//!
//! 实现一次性探测和配置验证命令

use crate::cli::args::{Args, Commands};
use crate::config::{self, ConfigLoader, TomlConfigLoader};
use crate::error::Result;
use crate::health::{EndpointState, HttpProber, Prober, StatusRecord};
use crate::status::Endpoint;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    ///
    /// # 返回
    /// * `Result<bool>` - 命令是否成功，决定进程退出码
    async fn execute(&self, args: &Args) -> Result<bool>;
}

/// 一次性探测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<bool> {
        if let Commands::Check { url, name, timeout } = &args.command {
            let endpoint = Endpoint::new(name.clone(), url.clone());
            let record = self.probe(&endpoint, Duration::from_secs(*timeout)).await?;
            let is_up = record.is_up;

            let output = serde_json::json!({
                "name": endpoint.name,
                "url": endpoint.url,
                "status": EndpointState::from_is_up(is_up),
                "record": record,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);

            Ok(is_up)
        } else {
            Ok(true)
        }
    }
}

impl CheckCommand {
    /// 对端点执行一次探测
    pub async fn probe(&self, endpoint: &Endpoint, timeout: Duration) -> Result<StatusRecord> {
        let prober = HttpProber::new(timeout)?;
        Ok(prober.probe(endpoint).await)
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<bool> {
        if let Commands::Validate { config_path } = &args.command {
            let config_file = config_path
                .clone()
                .or_else(|| args.config.clone())
                .unwrap_or_else(config::get_default_config_path);

            let config = self.validate_config_file(&config_file).await?;
            println!("✓ 配置文件验证通过: {}", config_file.display());
            println!("  检测间隔: {}秒", config.global.check_interval_seconds);
            println!("  请求超时: {}秒", config.global.request_timeout_seconds);
            println!("  历史窗口: {}小时", config.global.history_window_hours);
            println!("✓ 找到 {} 个端点配置", config.endpoints.len());
            for (i, endpoint) in config.endpoints.iter().enumerate() {
                println!("  {}. {} ({})", i + 1, endpoint.name, endpoint.url);
            }
        }
        Ok(true)
    }
}

impl ValidateCommand {
    /// 加载并验证配置文件
    pub async fn validate_config_file(&self, config_path: &Path) -> Result<config::Config> {
        TomlConfigLoader::new(true).load_from_file(config_path).await
    }
}
