//! 热键模块
//!
//! 跟踪按键状态，在按下沿匹配热键组合，并把匹配到的音效交给播放会话
//!
//! # 模块结构
//!
//! - `keys` - 按键码与按键状态跟踪
//! - `combination` - 热键组合
//! - `matcher` - 边沿触发的组合匹配
//! - `dispatcher` - 音效库与触发分发
//! - `config` - 热键配置
//! - `error` - 热键错误类型

mod combination;
mod config;
mod dispatcher;
mod error;
mod keys;
mod matcher;

pub use combination::HotkeyCombination;
pub use config::HotkeyConfig;
pub use dispatcher::{Binding, TriggerDispatcher};
pub use error::{HotkeyError, HotkeyResult};
pub use keys::{KeyCode, KeyStateTracker};
pub use matcher::HotkeyMatcher;
