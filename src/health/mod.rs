//! 健康检测模块
//!
//! 提供HTTP探测、检测结果应用、即时检测队列和定时调度功能

pub mod coordinator;
pub mod prober;
pub mod queue;
pub mod result;
pub mod scheduler;

// 重新导出主要类型
pub use coordinator::CheckCoordinator;
pub use prober::{HttpProber, Prober};
pub use queue::CheckQueue;
pub use result::{DowntimeRecord, EndpointState, StatusRecord};
pub use scheduler::Scheduler;
