//! 热键匹配器
//!
//! 在每个按键按下沿判断是否有热键组合刚刚被完整按下。
//!
//! # 匹配规则
//!
//! - 只有按下沿可以触发，松开事件永远不会触发
//! - 重复的按下事件（按键已处于按住状态）被忽略
//! - 只有包含本次按键的组合才可能"刚刚"被满足
//! - 按注册顺序取第一个满足的组合，找到后不再继续检查
//! - 组合触发后被锁定，直到其所有按键都松开才能再次触发；
//!   锁定期间它仍然占据优先位置，排在后面的组合不会顶替它

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::combination::HotkeyCombination;
use super::keys::{KeyCode, KeyStateTracker};

/// 热键匹配器
pub struct HotkeyMatcher {
    tracker: Arc<KeyStateTracker>,
    /// 已触发且尚未完全松开的组合
    latched: Mutex<HashSet<HotkeyCombination>>,
}

impl HotkeyMatcher {
    /// 创建绑定到指定按键跟踪器的匹配器
    pub fn new(tracker: Arc<KeyStateTracker>) -> Self {
        Self {
            tracker,
            latched: Mutex::new(HashSet::new()),
        }
    }

    /// 获取按键跟踪器
    pub fn tracker(&self) -> &Arc<KeyStateTracker> {
        &self.tracker
    }

    /// 只记录按键事件，不做匹配
    ///
    /// 返回按键状态是否真的发生了变化
    pub fn observe(&self, key: KeyCode, down: bool) -> bool {
        let mut latched = self.latched.lock();
        self.observe_locked(&mut latched, key, down)
    }

    /// 记录按键事件并返回本次按下沿触发的组合
    ///
    /// `candidates` 的顺序即优先级顺序。
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use soundbind_lib::hotkey::{HotkeyCombination, HotkeyMatcher, KeyCode, KeyStateTracker};
    ///
    /// let matcher = HotkeyMatcher::new(Arc::new(KeyStateTracker::new()));
    /// let combos = vec![HotkeyCombination::new([KeyCode(1), KeyCode(2)]).unwrap()];
    ///
    /// assert!(matcher.evaluate(KeyCode(1), true, &combos).is_none());
    /// assert_eq!(matcher.evaluate(KeyCode(2), true, &combos), Some(&combos[0]));
    /// assert!(matcher.evaluate(KeyCode(2), false, &combos).is_none());
    /// ```
    pub fn evaluate<'a, T>(&self, key: KeyCode, down: bool, candidates: &'a [T]) -> Option<&'a T>
    where
        T: AsRef<HotkeyCombination>,
    {
        let mut latched = self.latched.lock();

        if !self.observe_locked(&mut latched, key, down) {
            tracing::trace!(key = %key, down, "Duplicate key event ignored");
            return None;
        }

        if !down {
            return None;
        }

        let matched = candidates.iter().find(|candidate| {
            let combination = candidate.as_ref();
            !combination.is_empty()
                && combination.contains(key)
                && self.tracker.all_held(combination)
        })?;

        // 优先的组合仍处于锁定状态时，本次按下沿不触发任何组合
        let combination = matched.as_ref();
        if latched.contains(combination) {
            tracing::trace!(key = %key, combination = %combination, "Latched combination still held");
            return None;
        }

        tracing::debug!(key = %key, combination = %combination, "Hotkey combination matched");
        latched.insert(combination.clone());

        Some(matched)
    }

    /// 清除按键状态和锁定
    pub fn reset(&self) {
        let mut latched = self.latched.lock();
        latched.clear();
        self.tracker.reset();
    }

    fn observe_locked(
        &self,
        latched: &mut HashSet<HotkeyCombination>,
        key: KeyCode,
        down: bool,
    ) -> bool {
        let changed = self.tracker.record(key, down);

        if changed && !down {
            latched.retain(|combination| self.tracker.any_held(combination));
        }

        changed
    }
}
