//! 检测协调器
//!
//! 执行一次探测并把结果应用到状态存储，是状态变更的事务单元。
//! 探测期间不持有锁，只有应用结果时才获取写锁。

use crate::health::prober::Prober;
use crate::health::result::{DowntimeRecord, StatusRecord};
use crate::status::{Endpoint, StatusStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// 检测协调器
#[derive(Clone)]
pub struct CheckCoordinator {
    /// 共享状态存储
    store: StatusStore,
    /// 探测器
    prober: Arc<dyn Prober>,
}

impl CheckCoordinator {
    /// 创建新的检测协调器
    pub fn new(store: StatusStore, prober: Arc<dyn Prober>) -> Self {
        Self { store, prober }
    }

    /// 共享状态存储
    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// 对端点执行一次检测并应用结果
    ///
    /// # 返回
    /// * `bool` - 结果是否被应用（端点已不在注册表中或已换了URL时为 `false`）
    pub async fn check(&self, endpoint: &Endpoint) -> bool {
        debug!("开始检测端点: {}", endpoint.name);

        let record = self.prober.probe(endpoint).await;
        self.log_result(endpoint, &record);

        let downtime = DowntimeRecord::from_failure(&record);
        self.store
            .apply_endpoint_result(endpoint, record, downtime)
            .await
    }

    fn log_result(&self, endpoint: &Endpoint, record: &StatusRecord) {
        if record.is_up {
            debug!(
                "端点检测正常: {} ({:.3}s)",
                endpoint.name,
                record.response_time_seconds()
            );
        } else {
            warn!(
                "端点检测失败: {},{}",
                endpoint.name,
                record
                    .failure_reason()
                    .unwrap_or_else(|| "N/A".to_string())
            );
        }
    }
}
