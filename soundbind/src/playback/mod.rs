//! 播放模块
//!
//! 提供音效播放实例的状态机、会话管理和音频后端抽象
//!
//! # 模块结构
//!
//! - `backend` - 音频后端能力接口
//! - `device` - 输出设备枚举
//! - `error` - 播放错误类型
//! - `manager` - 播放会话管理器
//! - `playing` - 播放实例与状态机

mod backend;
pub mod device;
mod error;
mod manager;
mod playing;

pub use backend::{AudioBackend, BackendHandle, BackendNotifier, StartedPlayback};
pub use device::PlaybackDevice;
pub use error::{BackendOperation, PlaybackError, PlaybackResult};
pub use manager::PlaybackSessionManager;
pub use playing::{InstanceId, PlaybackState, PlayingSound};
