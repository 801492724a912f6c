//! 全局错误处理模块
//!
//! 提供统一的应用错误类型和用户友好的错误消息
//!
//! # 功能
//!
//! - 统一的 `AppError` 类型，聚合所有模块错误
//! - 用户友好的错误消息
//! - 错误代码用于前端处理（随 `Notification::Error` 发出）
//! - 错误恢复建议

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hotkey::HotkeyError;
use crate::playback::{BackendOperation, PlaybackError};

/// 应用错误类型
///
/// 聚合所有模块的错误类型，提供统一的错误处理接口
#[derive(Error, Debug)]
pub enum AppError {
    /// 热键错误
    #[error("Hotkey error: {0}")]
    Hotkey(#[from] HotkeyError),

    /// 播放错误
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 错误代码
///
/// 用于前端识别和处理特定错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 播放错误
    /// 无法开始播放
    FailedToPlay,
    /// 无法暂停
    FailedToPause,
    /// 无法恢复播放
    FailedToResume,
    /// 无法跳转
    FailedToSeek,
    /// 无法循环播放
    FailedToRepeat,
    /// 无法停止播放
    FailedToStop,
    /// 找不到输出设备
    DeviceNotFound,

    // 音效库错误
    /// 音效不存在
    SoundNotFound,
    /// 标签页不存在
    TabDoesNotExist,
    /// 标签页或音效重复
    DuplicateEntry,
    /// 热键设置失败
    FailedToSetHotkey,

    // 通用错误
    /// 内部错误
    InternalError,
    /// 未知错误
    Unknown,
}

impl From<BackendOperation> for ErrorCode {
    fn from(operation: BackendOperation) -> Self {
        match operation {
            BackendOperation::Start => ErrorCode::FailedToPlay,
            BackendOperation::Pause => ErrorCode::FailedToPause,
            BackendOperation::Resume => ErrorCode::FailedToResume,
            BackendOperation::Seek => ErrorCode::FailedToSeek,
            BackendOperation::Stop => ErrorCode::FailedToStop,
        }
    }
}

/// 错误上下文信息
///
/// 提供用户友好的错误信息和恢复建议
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// 错误代码
    pub code: ErrorCode,
    /// 用户友好的错误消息
    pub message: String,
    /// 详细错误信息（用于日志）
    pub detail: Option<String>,
    /// 恢复建议
    pub recovery_hint: Option<String>,
    /// 是否可恢复
    pub recoverable: bool,
}

impl ErrorContext {
    /// 创建新的错误上下文
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            recovery_hint: None,
            recoverable: true,
        }
    }

    /// 设置详细信息
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 设置恢复建议
    pub fn with_recovery_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = Some(hint.into());
        self
    }

    /// 标记为不可恢复
    pub fn not_recoverable(mut self) -> Self {
        self.recoverable = false;
        self
    }
}

impl AppError {
    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            // 热键错误
            AppError::Hotkey(HotkeyError::MalformedCombination) => ErrorCode::FailedToSetHotkey,
            AppError::Hotkey(HotkeyError::UnknownSound(_)) => ErrorCode::SoundNotFound,
            AppError::Hotkey(HotkeyError::UnknownTab(_)) => ErrorCode::TabDoesNotExist,
            AppError::Hotkey(HotkeyError::DuplicateTab(_) | HotkeyError::DuplicateSound(_)) => {
                ErrorCode::DuplicateEntry
            }

            // 播放错误
            AppError::Playback(PlaybackError::BackendFailure { operation, .. }) => {
                ErrorCode::from(*operation)
            }
            AppError::Playback(
                PlaybackError::DeviceNotFound
                | PlaybackError::InvalidDeviceName
                | PlaybackError::CpalError(_),
            ) => ErrorCode::DeviceNotFound,
            AppError::Playback(
                PlaybackError::ManagerUnavailable(_) | PlaybackError::InstanceIdsExhausted,
            ) => ErrorCode::InternalError,
            AppError::Playback(_) => ErrorCode::Unknown,

            // 通用错误
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// 获取用户友好的错误消息
    ///
    /// 返回适合直接显示给用户的错误消息
    pub fn user_message(&self) -> String {
        match self {
            AppError::Hotkey(HotkeyError::MalformedCombination) => {
                "热键至少需要包含一个按键".to_string()
            }
            AppError::Hotkey(HotkeyError::UnknownSound(_)) => "找不到该音效".to_string(),
            AppError::Hotkey(HotkeyError::UnknownTab(_)) => "标签页不存在".to_string(),
            AppError::Hotkey(_) => "音效库中已存在相同的条目".to_string(),

            AppError::Playback(PlaybackError::BackendFailure { operation, .. }) => {
                match operation {
                    BackendOperation::Start => "无法播放音效，请检查音频文件".to_string(),
                    BackendOperation::Pause => "无法暂停播放".to_string(),
                    BackendOperation::Resume => "无法恢复播放".to_string(),
                    BackendOperation::Seek => "无法跳转到指定位置".to_string(),
                    BackendOperation::Stop => "无法停止播放".to_string(),
                }
            }
            AppError::Playback(
                PlaybackError::DeviceNotFound
                | PlaybackError::InvalidDeviceName
                | PlaybackError::CpalError(_),
            ) => "找不到音频输出设备，请检查音频设置".to_string(),
            AppError::Playback(_) => "播放错误，请重试".to_string(),

            AppError::Internal(msg) => {
                format!("内部错误: {}", msg)
            }
        }
    }

    /// 获取完整的错误上下文
    pub fn context(&self) -> ErrorContext {
        let mut ctx = ErrorContext::new(self.code(), self.user_message())
            .with_detail(self.to_string());

        ctx.recovery_hint = self.recovery_hint();

        if !self.is_recoverable() {
            ctx = ctx.not_recoverable();
        }

        ctx
    }

    /// 获取恢复建议
    pub fn recovery_hint(&self) -> Option<String> {
        match self {
            AppError::Playback(PlaybackError::DeviceNotFound) => {
                Some("请确保输出设备已连接，并在设置中重新选择输出设备".to_string())
            }
            AppError::Playback(PlaybackError::BackendFailure {
                operation: BackendOperation::Start,
                ..
            }) => Some("请确认音频文件存在且格式受支持".to_string()),
            AppError::Hotkey(HotkeyError::MalformedCombination) => {
                Some("请重新录制热键".to_string())
            }
            _ => None,
        }
    }

    /// 检查错误是否可恢复
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AppError::Internal(_)
            | AppError::Playback(
                PlaybackError::ManagerUnavailable(_) | PlaybackError::InstanceIdsExhausted,
            )
        )
    }
}

/// 应用结果类型
pub type AppResult<T> = Result<T, AppError>;

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
