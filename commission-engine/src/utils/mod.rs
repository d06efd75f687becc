//! 工具模块 - 通用工具函数
//!
//! # 内容
//!
//! - [`logger`] - tracing 日志初始化
//! - [`time`] - 业务时区转换
//! - [`money`] - 金额舍入

pub mod logger;
pub mod money;
pub mod time;

// Re-export unified error types from shared
pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};
