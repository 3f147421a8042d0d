//! 端点状态管理模块
//!
//! 提供端点注册表、状态存储以及对外的只读快照

pub mod endpoint;
pub mod registry;
pub mod store;

// 重新导出主要类型
pub use endpoint::Endpoint;
pub use registry::EndpointRegistry;
pub use store::{EndpointStatus, RetentionPolicy, StatusStore};
