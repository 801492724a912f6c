//! 应用配置模块
//!
//! 提供热键策略、播放路由等运行时配置。
//! 配置的持久化由外部负责，这里只维护当前生效的配置。

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::hotkey::HotkeyConfig;
use crate::library::TabId;

/// 应用配置
///
/// 包含所有核心设置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 热键配置
    pub hotkeys: HotkeyConfig,
    /// 播放配置
    pub playback: PlaybackConfig,
    /// 当前激活的标签页
    pub active_tab: Option<TabId>,
}

/// 播放配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// 输出设备 ID（None 表示默认设备）
    pub output_device: Option<String>,
    /// 输出到非默认设备时，同时在默认设备上播放
    pub duplicate_to_default: bool,
    /// 播放期间静音默认设备（优先于 `duplicate_to_default`）
    pub mute_during_playback: bool,
}

impl PlaybackConfig {
    /// 输出到非默认设备时是否需要复制一份到默认设备
    pub fn duplicates_to_default(&self) -> bool {
        self.duplicate_to_default && !self.mute_during_playback
    }
}

/// 全局配置状态
///
/// 使用 ArcSwap 实现无锁读取，输入线程可以在每次按键时读取
pub struct GlobalConfig {
    config: ArcSwap<AppConfig>,
}

impl GlobalConfig {
    /// 创建新的全局配置
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: ArcSwap::new(Arc::new(config)),
        }
    }

    /// 获取当前配置
    pub fn get(&self) -> Arc<AppConfig> {
        self.config.load_full()
    }

    /// 更新配置
    pub fn update(&self, config: AppConfig) {
        tracing::debug!(?config, "Config updated");
        self.config.store(Arc::new(config));
    }

    /// 设置当前激活的标签页
    pub fn set_active_tab(&self, tab: Option<TabId>) {
        self.modify(|config| config.active_tab = tab);
    }

    /// 获取当前激活的标签页
    pub fn active_tab(&self) -> Option<TabId> {
        self.config.load().active_tab
    }

    /// 设置是否仅匹配当前标签页的热键
    pub fn set_tab_hotkeys_only(&self, enabled: bool) {
        self.modify(|config| config.hotkeys.tab_hotkeys_only = enabled);
    }

    /// 设置输出设备
    pub fn set_output_device(&self, device_id: Option<String>) {
        self.modify(move |config| config.playback.output_device = device_id.clone());
    }

    fn modify(&self, f: impl Fn(&mut AppConfig)) {
        self.config.rcu(|current| {
            let mut next = AppConfig::clone(current);
            f(&mut next);
            next
        });
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
