//! 检测结果数据结构
//!
//! 定义单次探测记录、停机记录以及端点状态枚举

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 进行中的停机记录在JSON中的持续时间取值
pub const ONGOING: &str = "ongoing";

/// 端点当前状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointState {
    /// 服务正常
    #[serde(rename = "UP")]
    Up,
    /// 服务异常
    #[serde(rename = "DOWN")]
    Down,
    /// 已注册但尚未完成首次检测
    Pending,
}

impl std::fmt::Display for EndpointState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointState::Up => write!(f, "UP"),
            EndpointState::Down => write!(f, "DOWN"),
            EndpointState::Pending => write!(f, "Pending"),
        }
    }
}

impl EndpointState {
    /// 由探测结果推导状态
    pub fn from_is_up(is_up: bool) -> Self {
        if is_up {
            EndpointState::Up
        } else {
            EndpointState::Down
        }
    }
}

/// 单次探测记录，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    /// 检测完成时间
    pub timestamp: DateTime<Utc>,
    /// 是否可用
    pub is_up: bool,
    /// 响应时间
    #[serde(rename = "responseTime", with = "seconds_serde")]
    pub response_time: Duration,
    /// HTTP状态码（收到响应时设置）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// 传输层错误描述
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusRecord {
    /// 收到HTTP响应时的记录，状态码 >= 400 视为不可用
    pub fn from_response(status_code: u16, response_time: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            is_up: status_code < 400,
            response_time,
            status_code: Some(status_code),
            error: None,
        }
    }

    /// 传输失败（连接、DNS、超时等）时的记录
    pub fn from_error(error: impl Into<String>, response_time: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            is_up: false,
            response_time,
            status_code: None,
            error: Some(error.into()),
        }
    }

    /// 指定时间戳
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 响应时间（秒）
    pub fn response_time_seconds(&self) -> f64 {
        self.response_time.as_secs_f64()
    }

    /// 停机原因：传输错误优先，否则为HTTP状态码
    pub fn failure_reason(&self) -> Option<String> {
        if self.is_up {
            return None;
        }
        match (&self.error, self.status_code) {
            (Some(error), _) => Some(error.clone()),
            (None, Some(code)) => Some(format!("HTTP Status {}", code)),
            (None, None) => Some("unknown failure".to_string()),
        }
    }
}

/// 停机持续时间
///
/// 在JSON中表示为 `"ongoing"` 或已结束事件的时长字符串（如 `"1m30s"`）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DowntimeDuration {
    /// 事件仍在进行中
    Ongoing,
    /// 事件已结束，保存格式化后的时长
    Closed(String),
}

impl DowntimeDuration {
    pub fn is_ongoing(&self) -> bool {
        matches!(self, DowntimeDuration::Ongoing)
    }
}

impl From<String> for DowntimeDuration {
    fn from(value: String) -> Self {
        if value == ONGOING {
            DowntimeDuration::Ongoing
        } else {
            DowntimeDuration::Closed(value)
        }
    }
}

impl From<DowntimeDuration> for String {
    fn from(value: DowntimeDuration) -> Self {
        match value {
            DowntimeDuration::Ongoing => ONGOING.to_string(),
            DowntimeDuration::Closed(text) => text,
        }
    }
}

/// 停机事件记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DowntimeRecord {
    /// 事件开始时间
    #[serde(rename = "timestamp")]
    pub started_at: DateTime<Utc>,
    /// 持续时间，仅在事件结束时修改一次
    pub duration: DowntimeDuration,
    /// 停机原因
    pub reason: String,
}

impl DowntimeRecord {
    /// 创建进行中的停机记录
    pub fn ongoing(started_at: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            started_at,
            duration: DowntimeDuration::Ongoing,
            reason: reason.into(),
        }
    }

    /// 根据失败的探测记录创建停机记录，成功的记录返回 `None`
    pub fn from_failure(record: &StatusRecord) -> Option<Self> {
        record
            .failure_reason()
            .map(|reason| Self::ongoing(record.timestamp, reason))
    }

    pub fn is_ongoing(&self) -> bool {
        self.duration.is_ongoing()
    }

    /// 结束进行中的事件，已结束的记录保持不变
    ///
    /// # 返回
    /// * `bool` - 本次调用是否结束了事件
    pub fn close(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_ongoing() {
            return false;
        }
        self.duration = DowntimeDuration::Closed(format_elapsed(now - self.started_at));
        true
    }
}

/// 将时长四舍五入到秒并格式化为 `1h2m3s` 形式
///
/// 省略前导的零单位：`0s`、`45s`、`2m5s`、`1h0m12s`。负值按0处理。
pub fn format_elapsed(elapsed: chrono::Duration) -> String {
    let millis = elapsed.num_milliseconds().max(0);
    let total_secs = (millis + 500) / 1000;

    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// 以秒（浮点数）序列化Duration
mod seconds_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
