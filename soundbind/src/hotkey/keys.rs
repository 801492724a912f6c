//! 按键状态跟踪
//!
//! 记录当前按住的按键，供热键匹配器查询

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::combination::HotkeyCombination;

/// 物理按键码
///
/// 由输入采集方提供的不透明整数，只比较相等性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct KeyState {
    /// 按住的按键及其按下序号，不在表中即视为未按住
    held: HashMap<KeyCode, u64>,
    next_seq: u64,
}

/// 按键状态跟踪器
///
/// 可以在接收原始输入事件的线程上调用，与播放线程无关
#[derive(Debug, Default)]
pub struct KeyStateTracker {
    state: Mutex<KeyState>,
}

impl KeyStateTracker {
    /// 创建空的跟踪器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录按键事件
    pub fn on_key_event(&self, key: KeyCode, down: bool) {
        self.record(key, down);
    }

    /// 记录按键事件，返回按键状态是否真的发生了变化
    ///
    /// 重复的按下/松开事件不会改变状态，返回 `false`
    pub(crate) fn record(&self, key: KeyCode, down: bool) -> bool {
        let mut state = self.state.lock();
        if down {
            if state.held.contains_key(&key) {
                return false;
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.held.insert(key, seq);
            true
        } else {
            state.held.remove(&key).is_some()
        }
    }

    /// 检查按键是否按住，未见过的按键返回 `false`
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.state.lock().held.contains_key(&key)
    }

    /// 检查组合中的按键是否全部按住
    pub fn all_held(&self, combination: &HotkeyCombination) -> bool {
        let state = self.state.lock();
        combination.keys().all(|key| state.held.contains_key(&key))
    }

    /// 检查组合中是否仍有按键按住
    pub fn any_held(&self, combination: &HotkeyCombination) -> bool {
        let state = self.state.lock();
        combination.keys().any(|key| state.held.contains_key(&key))
    }

    /// 按按下顺序返回当前按住的按键
    pub fn held_keys(&self) -> Vec<KeyCode> {
        let state = self.state.lock();
        let mut held: Vec<(KeyCode, u64)> = state.held.iter().map(|(k, s)| (*k, *s)).collect();
        held.sort_unstable_by_key(|(_, seq)| *seq);
        held.into_iter().map(|(key, _)| key).collect()
    }

    /// 清除所有按键状态
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.held.clear();
        state.next_seq = 0;
    }
}
