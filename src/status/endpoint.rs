//! 被监控端点定义

use serde::{Deserialize, Serialize};

/// 被监控的端点，以名称为唯一键
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// 端点名称
    pub name: String,
    /// 探测URL（注册时不校验可达性）
    pub url: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}
