//! 前台服务模块
//!
//! 处理前台模式的启动和信号处理

use crate::config::Config;
use crate::core::service::ServiceLauncher;
use anyhow::Result;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

/// 前台服务
pub struct ForegroundService;

impl ForegroundService {
    /// 创建新的前台服务
    pub fn new() -> Self {
        Self
    }

    /// 启动前台模式，Ctrl+C 时停止
    pub async fn start(&self, config: Config) -> Result<()> {
        info!("以前台模式启动服务...");

        let (shutdown_tx, shutdown_rx) = broadcast::channel(4);

        let shutdown_tx_clone = shutdown_tx.clone();
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("收到中断信号，正在停止服务...");
                    let _ = shutdown_tx_clone.send(());
                }
                Err(err) => {
                    error!("监听中断信号失败: {}", err);
                }
            }
        });

        ServiceLauncher::run(config, shutdown_tx, shutdown_rx).await
    }
}

impl Default for ForegroundService {
    fn default() -> Self {
        Self::new()
    }
}
