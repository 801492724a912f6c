use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hotkey::HotkeyCombination;

/// 音效 ID
///
/// 在当前运行实例内唯一，由创建者分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundId(pub u32);

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 音源引用
///
/// 对核心逻辑不透明，由音频后端负责解析（通常是文件路径）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundSource(String);

impl SoundSource {
    /// 创建音源引用
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// 获取原始引用字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 音效定义
///
/// 每个音效属于且仅属于一个标签页，可选绑定一个热键组合
///
/// # Examples
///
/// ```
/// use soundbind_lib::hotkey::{HotkeyCombination, KeyCode};
/// use soundbind_lib::library::{Sound, SoundId};
///
/// let hotkey = HotkeyCombination::new([KeyCode(17), KeyCode(65)]).unwrap();
/// let sound = Sound::new(SoundId(1), "airhorn", "sounds/airhorn.mp3")
///     .with_hotkey(hotkey)
///     .with_repeat(true);
///
/// assert!(sound.hotkey.is_some());
/// assert!(sound.repeat);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    /// 音效 ID
    pub id: SoundId,
    /// 显示名称
    pub name: String,
    /// 音源引用
    pub source: SoundSource,
    /// 绑定的热键组合（可选）
    #[serde(default)]
    pub hotkey: Option<HotkeyCombination>,
    /// 是否循环播放（用户上一次的选择）
    #[serde(default)]
    pub repeat: bool,
}

impl Sound {
    /// 创建未绑定热键的音效
    pub fn new(id: SoundId, name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            source: SoundSource::new(source),
            hotkey: None,
            repeat: false,
        }
    }

    /// 绑定热键组合
    pub fn with_hotkey(mut self, hotkey: HotkeyCombination) -> Self {
        self.hotkey = Some(hotkey);
        self
    }

    /// 设置循环播放
    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }
}
