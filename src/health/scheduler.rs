//! 定时检测调度器
//!
//! 按固定间隔对注册表快照中的全部端点执行检测。
//! 每一轮的端点集合在开始时确定，本轮期间新注册的端点由即时检测队列负责。

use crate::health::CheckCoordinator;
use crate::status::StatusStore;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Semaphore};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 默认检测间隔
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// 定时检测调度器
pub struct Scheduler {
    /// 共享状态存储
    store: StatusStore,
    /// 检测协调器
    coordinator: Arc<CheckCoordinator>,
    /// 检测间隔
    interval: Duration,
    /// 并发控制信号量
    semaphore: Arc<Semaphore>,
}

impl Scheduler {
    /// 创建新的调度器
    ///
    /// # 参数
    /// * `coordinator` - 检测协调器
    /// * `interval` - 检测间隔
    /// * `max_concurrent` - 单轮最大并发检测数
    pub fn new(coordinator: Arc<CheckCoordinator>, interval: Duration, max_concurrent: usize) -> Self {
        Self {
            store: coordinator.store().clone(),
            coordinator,
            interval,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// 检测间隔
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 运行调度循环直到收到关闭信号
    ///
    /// 第一轮在启动时立即执行。某一轮超时，后续的节拍顺延而不是补跑。
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("调度器已启动，检测间隔: {:?}", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_pass().await;
                }
                _ = shutdown.recv() => {
                    info!("调度器收到关闭信号");
                    break;
                }
            }
        }

        info!("调度器已停止");
    }

    /// 执行一轮检测，等待本轮全部检测完成
    ///
    /// # 返回
    /// * `usize` - 本轮检测的端点数量
    pub async fn run_pass(&self) -> usize {
        let endpoints = self.store.endpoints().await;
        if endpoints.is_empty() {
            debug!("没有已注册的端点，跳过本轮检测");
            return 0;
        }

        debug!("开始本轮检测，端点数量: {}", endpoints.len());

        let checks = endpoints.iter().map(|endpoint| {
            let semaphore = Arc::clone(&self.semaphore);
            let coordinator = Arc::clone(&self.coordinator);
            async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!("获取并发许可失败，跳过本次检测: {}", endpoint.name);
                        return;
                    }
                };
                coordinator.check(endpoint).await;
            }
        });
        join_all(checks).await;

        debug!("本轮检测完成");
        endpoints.len()
    }
}
