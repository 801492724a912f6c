//! 状态管理模块
//!
//! 提供应用程序共享配置
//!
//! # 模块结构
//!
//! - `config` - 配置定义与无锁全局配置

pub mod config;

pub use config::{AppConfig, GlobalConfig, PlaybackConfig};
