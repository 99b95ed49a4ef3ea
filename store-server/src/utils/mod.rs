//! 工具模块
//!
//! - [`error`] - 统一错误类型和 API 响应
//! - [`logger`] - tracing 日志初始化
//! - [`time`] - 业务时区日期换算

pub mod error;
pub mod logger;
pub mod time;

pub use error::{AppError, AppResponse, ok};

/// Result type for API handlers
pub type AppResult<T> = Result<T, AppError>;
