//! 核心模块 - 引擎配置和错误定义
//!
//! # 模块结构
//!
//! - [`Config`] - 启动配置 (环境变量)
//! - [`EngineSettings`] - 计算器使用的配置子集
//! - [`EngineError`] - 引擎错误

pub mod config;
pub mod error;

pub use config::{Config, EngineSettings};
pub use error::{EngineError, EngineResult};
