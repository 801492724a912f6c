use std::fmt;

use thiserror::Error;

use super::playing::{InstanceId, PlaybackState};

/// 音频后端操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendOperation {
    /// 开始播放
    Start,
    /// 暂停
    Pause,
    /// 恢复
    Resume,
    /// 跳转
    Seek,
    /// 停止并释放设备
    Stop,
}

impl fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Seek => "seek",
            Self::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// 播放相关错误
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// 播放实例不存在（已结束或从未创建）
    #[error("Playing sound {0} is not live")]
    UnknownInstance(InstanceId),

    /// 当前状态不允许该操作
    #[error("Cannot {operation} playing sound {id} while {state}")]
    InvalidTransition {
        id: InstanceId,
        operation: &'static str,
        state: PlaybackState,
    },

    /// 音频后端失败
    #[error("Audio backend failed to {operation}: {reason}")]
    BackendFailure {
        operation: BackendOperation,
        reason: String,
    },

    /// 找不到输出设备
    #[error("No audio output device found")]
    DeviceNotFound,

    /// 设备名称无效
    #[error("Device name is invalid UTF-8")]
    InvalidDeviceName,

    /// cpal 设备枚举错误
    #[error("cpal error: {0}")]
    CpalError(#[from] cpal::DevicesError),

    /// 播放实例 ID 已分配完
    #[error("Playing sound ids are exhausted")]
    InstanceIdsExhausted,

    /// 播放会话管理器不可用
    #[error("Playback session manager is unavailable: {0}")]
    ManagerUnavailable(String),
}

impl PlaybackError {
    /// 创建后端失败错误
    pub fn backend(operation: BackendOperation, reason: impl ToString) -> Self {
        Self::BackendFailure {
            operation,
            reason: reason.to_string(),
        }
    }

    /// 是否为状态机守卫拒绝（调用方应视为无操作）
    pub fn is_guard_violation(&self) -> bool {
        matches!(
            self,
            Self::UnknownInstance(_) | Self::InvalidTransition { .. }
        )
    }
}

/// 播放模块的结果类型
pub type PlaybackResult<T> = Result<T, PlaybackError>;
