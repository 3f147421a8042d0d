//! 即时检测队列
//!
//! 新注册的端点需要立即检测一次。请求放入有界队列，由单个分发任务取出执行，
//! 同时在途的探测数量受信号量限制，快速重复注册不会无限制地创建任务。

use crate::health::CheckCoordinator;
use crate::status::Endpoint;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 即时检测队列句柄
#[derive(Debug, Clone)]
pub struct CheckQueue {
    sender: mpsc::Sender<Endpoint>,
}

impl CheckQueue {
    /// 启动分发任务
    ///
    /// 所有句柄被丢弃后分发任务退出。
    ///
    /// # 参数
    /// * `coordinator` - 检测协调器
    /// * `capacity` - 队列容量
    /// * `max_in_flight` - 最大同时在途探测数
    pub fn start(
        coordinator: Arc<CheckCoordinator>,
        capacity: usize,
        max_in_flight: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));

        let handle = tokio::spawn(dispatch_loop(receiver, coordinator, semaphore));
        (Self { sender }, handle)
    }

    /// 排队一次即时检测，不等待
    ///
    /// # 返回
    /// * `bool` - 是否成功入队；队列已满时丢弃，由下一次定时检测覆盖
    pub fn enqueue(&self, endpoint: Endpoint) -> bool {
        match self.sender.try_send(endpoint) {
            Ok(()) => true,
            Err(TrySendError::Full(endpoint)) => {
                warn!("即时检测队列已满，跳过端点: {}", endpoint.name);
                false
            }
            Err(TrySendError::Closed(endpoint)) => {
                warn!("即时检测队列已关闭，跳过端点: {}", endpoint.name);
                false
            }
        }
    }
}

async fn dispatch_loop(
    mut receiver: mpsc::Receiver<Endpoint>,
    coordinator: Arc<CheckCoordinator>,
    semaphore: Arc<Semaphore>,
) {
    info!("即时检测分发任务已启动");

    while let Some(endpoint) = receiver.recv().await {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        debug!("执行即时检测: {}", endpoint.name);
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            coordinator.check(&endpoint).await;
            drop(permit);
        });
    }

    info!("即时检测分发任务已停止");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::prober::testing::StaticProber;
    use crate::health::result::EndpointState;
    use crate::status::{EndpointRegistry, StatusStore};
    use std::time::Duration;

    async fn wait_for_state(store: &StatusStore, name: &str, state: EndpointState) -> bool {
        for _ in 0..100 {
            if let Some(status) = store.status(name).await {
                if status.current_status == state {
                    return true;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_registration_triggers_immediate_check() {
        let store = StatusStore::default();
        let prober = Arc::new(StaticProber::with("http://svc.local", 200));
        let coordinator = Arc::new(CheckCoordinator::new(store.clone(), prober.clone()));
        let (queue, _handle) = CheckQueue::start(coordinator, 8, 2);
        let registry = EndpointRegistry::new(store.clone(), queue);

        let stored = registry
            .register(Endpoint::new("svc", "http://svc.local"))
            .await;
        assert_eq!(stored.name, "svc");

        assert!(wait_for_state(&store, "svc", EndpointState::Up).await);
        assert_eq!(prober.calls(), 1);
        assert_eq!(registry.snapshot().await, vec![stored]);
    }

    #[tokio::test]
    async fn test_dispatcher_stops_when_handles_dropped() {
        let store = StatusStore::default();
        let coordinator = Arc::new(CheckCoordinator::new(
            store,
            Arc::new(StaticProber::default()),
        ));
        let (queue, handle) = CheckQueue::start(coordinator, 1, 1);

        drop(queue);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("分发任务未退出")
            .unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_on_closed_queue_is_rejected() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let queue = CheckQueue { sender };

        assert!(!queue.enqueue(Endpoint::new("svc", "http://svc.local")));
    }
}
