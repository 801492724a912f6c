//! 热键配置模块
//!
//! 定义热键匹配策略相关的配置

use serde::{Deserialize, Serialize};

/// 热键配置
///
/// # Examples
///
/// ```
/// use soundbind_lib::hotkey::HotkeyConfig;
///
/// let config = HotkeyConfig::default();
/// assert!(!config.tab_hotkeys_only);
///
/// let config = HotkeyConfig::default().with_tab_hotkeys_only(true);
/// assert!(config.tab_hotkeys_only);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// 仅匹配当前激活标签页的热键
    ///
    /// 关闭时所有标签页的热键按标签页顺序、页内顺序合并匹配
    pub tab_hotkeys_only: bool,
}

impl HotkeyConfig {
    /// 设置是否仅匹配当前标签页的热键
    pub fn with_tab_hotkeys_only(mut self, enabled: bool) -> Self {
        self.tab_hotkeys_only = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = HotkeyConfig::default().with_tab_hotkeys_only(true);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: HotkeyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_config_partial_json() {
        let config: HotkeyConfig = serde_json::from_str("{}").unwrap();
        assert!(!config.tab_hotkeys_only);
    }
}
