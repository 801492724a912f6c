use std::fmt;

use serde::{Deserialize, Serialize};

use super::sound::{Sound, SoundId};

/// 标签页 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_hotkeys_enabled() -> bool {
    true
}

/// 标签页
///
/// 有序的音效集合，热键匹配时按此顺序决定优先级
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    /// 标签页 ID
    pub id: TabId,
    /// 显示名称
    pub name: String,
    /// 音效列表（顺序即注册顺序）
    #[serde(default)]
    pub sounds: Vec<Sound>,
    /// 是否启用本标签页的热键
    ///
    /// 关闭时本页的热键组合在任何模式下都不参与匹配
    #[serde(default = "default_hotkeys_enabled")]
    pub hotkeys_enabled: bool,
}

impl Tab {
    /// 创建空标签页
    pub fn new(id: TabId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sounds: Vec::new(),
            hotkeys_enabled: true,
        }
    }

    /// 追加音效
    pub fn with_sound(mut self, sound: Sound) -> Self {
        self.sounds.push(sound);
        self
    }

    /// 设置热键开关
    pub fn with_hotkeys_enabled(mut self, enabled: bool) -> Self {
        self.hotkeys_enabled = enabled;
        self
    }

    /// 按 ID 查找音效
    pub fn sound(&self, id: SoundId) -> Option<&Sound> {
        self.sounds.iter().find(|s| s.id == id)
    }

    /// 按 ID 查找可变音效
    pub fn sound_mut(&mut self, id: SoundId) -> Option<&mut Sound> {
        self.sounds.iter_mut().find(|s| s.id == id)
    }
}
