//! 服务模块
//!
//! - [`notification`] - 状态变更通知 (fire-and-forget)

pub mod notification;

pub use notification::{NotificationService, NotificationWorker, StatusNotification};
