//! 端点注册表
//!
//! 外部调用方注册端点的入口：写入状态存储后立即排队一次检测，不阻塞调用方。

use crate::health::CheckQueue;
use crate::status::{Endpoint, StatusStore};

/// 端点注册表
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    /// 共享状态存储
    store: StatusStore,
    /// 注册后立即检测的队列
    queue: CheckQueue,
}

impl EndpointRegistry {
    /// 创建新的端点注册表
    pub fn new(store: StatusStore, queue: CheckQueue) -> Self {
        Self { store, queue }
    }

    /// 注册或覆盖端点
    ///
    /// 不校验URL，无效地址会在探测时记录为失败。
    ///
    /// # 返回
    /// * `Endpoint` - 已存储的端点
    pub async fn register(&self, endpoint: Endpoint) -> Endpoint {
        self.store.register(endpoint.clone()).await;
        self.queue.enqueue(endpoint.clone());
        endpoint
    }

    /// 注册表的时间点快照，按名称排序
    pub async fn snapshot(&self) -> Vec<Endpoint> {
        self.store.endpoints().await
    }

    /// 底层状态存储
    pub fn store(&self) -> &StatusStore {
        &self.store
    }
}
