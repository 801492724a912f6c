//! 热键相关错误类型

use thiserror::Error;

use crate::library::{SoundId, TabId};

/// 热键相关错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HotkeyError {
    /// 热键组合不包含任何按键
    #[error("Hotkey combination must contain at least one key")]
    MalformedCombination,

    /// 标签页 ID 重复
    #[error("Tab {0} is already registered")]
    DuplicateTab(TabId),

    /// 音效 ID 重复
    #[error("Sound {0} is already registered")]
    DuplicateSound(SoundId),

    /// 标签页不存在
    #[error("Tab {0} is not registered")]
    UnknownTab(TabId),

    /// 音效不存在
    #[error("Sound {0} is not registered")]
    UnknownSound(SoundId),
}

/// 热键模块的结果类型
pub type HotkeyResult<T> = Result<T, HotkeyError>;
