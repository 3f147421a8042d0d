//! 端点状态存储
//!
//! 端点注册表与状态表共用一把读写锁：注册同时写入两张表，
//! 检测结果通过 [`StatusStore::apply_check_result`] 唯一入口修改状态，
//! 外部读取只拿到深拷贝快照。

use crate::config::GlobalConfig;
use crate::health::result::{DowntimeRecord, EndpointState, StatusRecord};
use crate::status::Endpoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 历史与停机记录的保留策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    /// 检测历史保留窗口
    pub history_window: chrono::Duration,
    /// 最近停机记录最大条数
    pub max_recent_downtime: usize,
    /// 检测恢复时是否结束进行中的停机记录
    pub close_downtime_on_recovery: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            history_window: chrono::Duration::hours(10),
            max_recent_downtime: 5,
            close_downtime_on_recovery: false,
        }
    }
}

impl From<&GlobalConfig> for RetentionPolicy {
    fn from(config: &GlobalConfig) -> Self {
        Self {
            history_window: config.history_window(),
            max_recent_downtime: config.max_recent_downtime,
            close_downtime_on_recovery: config.close_downtime_on_recovery,
        }
    }
}

/// 单个端点的聚合状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatus {
    /// 端点名称
    pub name: String,
    /// 端点URL
    pub url: String,
    /// 当前状态
    pub current_status: EndpointState,
    /// 最后检测时间（未检测时为注册时间）
    pub last_checked: DateTime<Utc>,
    /// 检测历史，最新的在末尾
    pub history: Vec<StatusRecord>,
    /// 最近的停机记录，最新的在末尾
    pub recent_downtime: Vec<DowntimeRecord>,
}

impl EndpointStatus {
    /// 注册时的初始状态
    pub fn pending(endpoint: &Endpoint, now: DateTime<Utc>) -> Self {
        Self {
            name: endpoint.name.clone(),
            url: endpoint.url.clone(),
            current_status: EndpointState::Pending,
            last_checked: now,
            history: Vec::new(),
            recent_downtime: Vec::new(),
        }
    }

    /// 应用一次检测结果
    ///
    /// 依次更新当前状态、追加历史、处理停机记录、按时间窗口裁剪历史。
    /// 新的停机事件追加前会先结束上一条进行中的事件，
    /// 因此进行中的事件至多一条且总在末尾。
    pub fn apply(
        &mut self,
        record: StatusRecord,
        downtime: Option<DowntimeRecord>,
        policy: &RetentionPolicy,
        now: DateTime<Utc>,
    ) {
        self.last_checked = record.timestamp;
        self.current_status = EndpointState::from_is_up(record.is_up);
        let is_up = record.is_up;
        self.history.push(record);

        match downtime {
            Some(incident) => {
                if let Some(previous) = self.recent_downtime.last_mut() {
                    previous.close(now);
                }
                self.recent_downtime.push(incident);

                let len = self.recent_downtime.len();
                if len > policy.max_recent_downtime {
                    self.recent_downtime
                        .drain(..len - policy.max_recent_downtime);
                }
            }
            None if is_up && policy.close_downtime_on_recovery => {
                if let Some(previous) = self.recent_downtime.last_mut() {
                    previous.close(now);
                }
            }
            None => {}
        }

        // 窗口超出可表示的时间范围时保留全部历史
        if let Some(cutoff) = now.checked_sub_signed(policy.history_window) {
            self.history.retain(|entry| entry.timestamp >= cutoff);
        }
    }

    /// 当前进行中的停机记录
    pub fn ongoing_downtime(&self) -> Option<&DowntimeRecord> {
        self.recent_downtime.last().filter(|record| record.is_ongoing())
    }
}

/// 锁内数据：注册表与状态表
#[derive(Debug, Default)]
struct MonitorState {
    endpoints: HashMap<String, Endpoint>,
    statuses: HashMap<String, EndpointStatus>,
}

/// 端点注册表与状态表的共享存储
///
/// 克隆成本很低，所有克隆共享同一份数据。
#[derive(Debug, Clone)]
pub struct StatusStore {
    state: Arc<RwLock<MonitorState>>,
    policy: RetentionPolicy,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new(RetentionPolicy::default())
    }
}

impl StatusStore {
    /// 创建新的状态存储
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            state: Arc::new(RwLock::new(MonitorState::default())),
            policy,
        }
    }

    /// 注册或覆盖端点，并将其状态重置为 Pending
    pub async fn register(&self, endpoint: Endpoint) {
        let mut state = self.state.write().await;
        let replaced = state.endpoints.contains_key(&endpoint.name);

        state.statuses.insert(
            endpoint.name.clone(),
            EndpointStatus::pending(&endpoint, Utc::now()),
        );
        state.endpoints.insert(endpoint.name.clone(), endpoint.clone());
        drop(state);

        if replaced {
            info!("覆盖已注册端点: {} -> {}", endpoint.name, endpoint.url);
        } else {
            info!("注册新端点: {} -> {}", endpoint.name, endpoint.url);
        }
    }

    /// 注册表快照，按名称排序
    pub async fn endpoints(&self) -> Vec<Endpoint> {
        let state = self.state.read().await;
        let mut endpoints: Vec<Endpoint> = state.endpoints.values().cloned().collect();
        drop(state);

        endpoints.sort_by(|a, b| a.name.cmp(&b.name));
        endpoints
    }

    /// 全部端点状态的深拷贝快照
    pub async fn snapshot_all(&self) -> BTreeMap<String, EndpointStatus> {
        let state = self.state.read().await;
        state
            .statuses
            .iter()
            .map(|(name, status)| (name.clone(), status.clone()))
            .collect()
    }

    /// 单个端点状态的深拷贝
    pub async fn status(&self, name: &str) -> Option<EndpointStatus> {
        self.state.read().await.statuses.get(name).cloned()
    }

    /// 已注册端点数量
    pub async fn len(&self) -> usize {
        self.state.read().await.endpoints.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 应用检测结果，这是状态的唯一修改入口
    ///
    /// 端点不存在时静默丢弃（检测可能与注册并发进行）。
    ///
    /// # 返回
    /// * `bool` - 结果是否被应用
    pub async fn apply_check_result(
        &self,
        name: &str,
        record: StatusRecord,
        downtime: Option<DowntimeRecord>,
    ) -> bool {
        self.apply_matching(name, None, record, downtime).await
    }

    /// 应用某个端点的探测结果
    ///
    /// 探测期间端点被以新URL重新注册时，旧URL的结果被丢弃。
    pub async fn apply_endpoint_result(
        &self,
        endpoint: &Endpoint,
        record: StatusRecord,
        downtime: Option<DowntimeRecord>,
    ) -> bool {
        self.apply_matching(&endpoint.name, Some(&endpoint.url), record, downtime)
            .await
    }

    async fn apply_matching(
        &self,
        name: &str,
        url: Option<&str>,
        record: StatusRecord,
        downtime: Option<DowntimeRecord>,
    ) -> bool {
        let mut state = self.state.write().await;
        match state.statuses.get_mut(name) {
            Some(status) if url.is_some_and(|url| url != status.url) => {
                debug!("端点 {} 已重新注册为 {}，丢弃旧地址的检测结果", name, status.url);
                false
            }
            Some(status) => {
                status.apply(record, downtime, &self.policy, Utc::now());
                true
            }
            None => {
                debug!("端点 {} 未注册，丢弃检测结果", name);
                false
            }
        }
    }
}
