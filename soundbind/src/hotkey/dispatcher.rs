//! 热键分发器
//!
//! 持有音效库（标签页列表），把原始按键事件交给匹配器，
//! 匹配成功后把对应音效交给播放会话管理器。
//!
//! 按键事件路径只做无锁读取：标签页列表放在 `ArcSwap` 中，
//! 修改时复制整个列表再替换。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::combination::HotkeyCombination;
use super::error::{HotkeyError, HotkeyResult};
use super::keys::{KeyCode, KeyStateTracker};
use super::matcher::HotkeyMatcher;
use crate::events::{Notification, NotificationHub};
use crate::library::{Sound, SoundId, Tab, TabId};
use crate::playback::PlaybackSessionManager;
use crate::state::{AppConfig, GlobalConfig};

/// 参与匹配的一条热键绑定
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    /// 所属标签页
    pub tab: TabId,
    /// 绑定的音效
    pub sound: &'a Sound,
    /// 热键组合
    pub combination: &'a HotkeyCombination,
}

impl AsRef<HotkeyCombination> for Binding<'_> {
    fn as_ref(&self) -> &HotkeyCombination {
        self.combination
    }
}

/// 热键分发器
pub struct TriggerDispatcher {
    tabs: ArcSwap<Vec<Tab>>,
    /// 串行化对标签页列表的修改
    write_lock: Mutex<()>,
    matcher: HotkeyMatcher,
    config: Arc<GlobalConfig>,
    playback: Arc<PlaybackSessionManager>,
    notifications: NotificationHub,
    /// 热键录制模式
    capturing: AtomicBool,
}

impl TriggerDispatcher {
    /// 创建分发器
    pub fn new(
        config: Arc<GlobalConfig>,
        playback: Arc<PlaybackSessionManager>,
        notifications: NotificationHub,
    ) -> Self {
        Self {
            tabs: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
            matcher: HotkeyMatcher::new(Arc::new(KeyStateTracker::new())),
            config,
            playback,
            notifications,
            capturing: AtomicBool::new(false),
        }
    }

    /// 按键状态跟踪器
    pub fn tracker(&self) -> &Arc<KeyStateTracker> {
        self.matcher.tracker()
    }

    /// 注册标签页
    ///
    /// 标签页 ID 和音效 ID 在整个音效库中必须唯一。
    /// 如果当前没有激活的标签页，新标签页成为激活标签页。
    pub fn register_tab(&self, tab: Tab) -> HotkeyResult<()> {
        let id = tab.id;
        let sound_count = tab.sounds.len();

        self.modify_tabs(|tabs| {
            if tabs.iter().any(|existing| existing.id == tab.id) {
                return Err(HotkeyError::DuplicateTab(tab.id));
            }

            for (index, sound) in tab.sounds.iter().enumerate() {
                let registered = tabs.iter().any(|existing| existing.sound(sound.id).is_some());
                let repeated = tab.sounds[..index].iter().any(|s| s.id == sound.id);
                if registered || repeated {
                    return Err(HotkeyError::DuplicateSound(sound.id));
                }
            }

            tabs.push(tab);
            Ok(())
        })?;

        if self.config.active_tab().is_none() {
            self.config.set_active_tab(Some(id));
        }

        tracing::info!(tab_id = %id, sounds = sound_count, "Tab registered");
        Ok(())
    }

    /// 移除标签页
    ///
    /// 移除的是激活标签页时，剩余的第一个标签页成为激活标签页
    pub fn remove_tab(&self, id: TabId) -> HotkeyResult<Tab> {
        let mut next_active = None;

        let removed = self.modify_tabs(|tabs| {
            let index = tabs
                .iter()
                .position(|tab| tab.id == id)
                .ok_or(HotkeyError::UnknownTab(id))?;
            let removed = tabs.remove(index);
            next_active = tabs.first().map(|tab| tab.id);
            Ok(removed)
        })?;

        if self.config.active_tab() == Some(id) {
            self.config.set_active_tab(next_active);
        }

        tracing::info!(tab_id = %id, "Tab removed");
        Ok(removed)
    }

    /// 切换激活标签页
    pub fn set_active_tab(&self, id: TabId) -> HotkeyResult<()> {
        if !self.tabs.load().iter().any(|tab| tab.id == id) {
            return Err(HotkeyError::UnknownTab(id));
        }

        self.config.set_active_tab(Some(id));
        tracing::debug!(tab_id = %id, "Active tab changed");
        Ok(())
    }

    /// 设置或清除音效的热键
    pub fn set_hotkey(
        &self,
        sound_id: SoundId,
        hotkey: Option<HotkeyCombination>,
    ) -> HotkeyResult<()> {
        tracing::debug!(sound_id = %sound_id, ?hotkey, "Setting hotkey");
        self.modify_sound(sound_id, move |sound| sound.hotkey = hotkey)
    }

    /// 设置音效的默认循环标志（只影响之后创建的播放实例）
    pub fn set_sound_repeat(&self, sound_id: SoundId, repeat: bool) -> HotkeyResult<()> {
        self.modify_sound(sound_id, move |sound| sound.repeat = repeat)
    }

    /// 当前音效库快照
    pub fn tabs(&self) -> Arc<Vec<Tab>> {
        self.tabs.load_full()
    }

    /// 按 ID 查找音效
    pub fn sound(&self, id: SoundId) -> Option<Sound> {
        self.tabs.load().iter().find_map(|tab| tab.sound(id).cloned())
    }

    /// 开启或关闭热键录制模式
    ///
    /// 录制模式下按键只被记录，不触发任何音效
    pub fn request_hotkey(&self, enabled: bool) {
        self.capturing.store(enabled, Ordering::Release);
        tracing::info!(enabled, "Hotkey capture mode changed");
    }

    /// 是否处于热键录制模式
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Acquire)
    }

    /// 处理原始按键事件
    ///
    /// 返回本次事件触发的音效。只把音效交给播放会话管理器，不等待播放开始。
    pub fn on_key_event(&self, key: KeyCode, down: bool) -> Option<SoundId> {
        if self.is_capturing() {
            if self.matcher.observe(key, down) && down {
                let keys = self.matcher.tracker().held_keys();
                self.notifications
                    .emit(Notification::HotkeyReceived { keys });
            }
            return None;
        }

        let tabs = self.tabs.load();
        let config = self.config.get();
        let candidates = bindings(&tabs, &config);

        let binding = self.matcher.evaluate(key, down, &candidates)?;
        tracing::info!(
            key = %key,
            tab_id = %binding.tab,
            sound_id = %binding.sound.id,
            "Hotkey triggered sound"
        );

        self.playback.trigger(binding.sound.clone());
        Some(binding.sound.id)
    }

    fn modify_tabs<T>(&self, f: impl FnOnce(&mut Vec<Tab>) -> HotkeyResult<T>) -> HotkeyResult<T> {
        let _guard = self.write_lock.lock();

        let mut tabs = Vec::clone(&self.tabs.load());
        let result = f(&mut tabs)?;
        self.tabs.store(Arc::new(tabs));

        Ok(result)
    }

    fn modify_sound(&self, id: SoundId, f: impl FnOnce(&mut Sound)) -> HotkeyResult<()> {
        self.modify_tabs(|tabs| {
            let sound = tabs
                .iter_mut()
                .find_map(|tab| tab.sound_mut(id))
                .ok_or(HotkeyError::UnknownSound(id))?;
            f(sound);
            Ok(())
        })
    }
}

/// 按当前策略收集参与匹配的绑定
///
/// 顺序为标签页顺序再按页内顺序；"仅当前标签页"模式下只取激活标签页
fn bindings<'a>(tabs: &'a [Tab], config: &AppConfig) -> Vec<Binding<'a>> {
    tabs.iter()
        .filter(|tab| tab.hotkeys_enabled)
        .filter(|tab| !config.hotkeys.tab_hotkeys_only || config.active_tab == Some(tab.id))
        .flat_map(|tab| {
            tab.sounds.iter().filter_map(move |sound| {
                sound.hotkey.as_ref().map(|combination| Binding {
                    tab: tab.id,
                    sound,
                    combination,
                })
            })
        })
        .collect()
}
