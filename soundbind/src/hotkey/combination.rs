use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{HotkeyError, HotkeyResult};
use super::keys::KeyCode;

/// 热键组合
///
/// 必须同时按住的一组按键。顺序无关，重复按键会合并。
/// 空组合无法构造，因此永远不会被当作"总是触发"。
///
/// # Examples
///
/// ```
/// use soundbind_lib::hotkey::{HotkeyCombination, KeyCode};
///
/// let combo = HotkeyCombination::new([KeyCode(2), KeyCode(1), KeyCode(2)]).unwrap();
/// assert_eq!(combo.len(), 2);
/// assert!(combo.contains(KeyCode(1)));
///
/// assert!(HotkeyCombination::new([]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<KeyCode>", into = "Vec<KeyCode>")]
pub struct HotkeyCombination {
    keys: BTreeSet<KeyCode>,
}

impl HotkeyCombination {
    /// 创建热键组合
    ///
    /// # Errors
    ///
    /// 如果没有任何按键，返回 [`HotkeyError::MalformedCombination`]
    pub fn new(keys: impl IntoIterator<Item = KeyCode>) -> HotkeyResult<Self> {
        let keys: BTreeSet<KeyCode> = keys.into_iter().collect();
        if keys.is_empty() {
            return Err(HotkeyError::MalformedCombination);
        }
        Ok(Self { keys })
    }

    /// 组合中的按键（按键码升序）
    pub fn keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys.iter().copied()
    }

    /// 检查组合是否包含某个按键
    pub fn contains(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// 按键数量
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// 始终为 `false`，保留以配合 `len`
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl AsRef<HotkeyCombination> for HotkeyCombination {
    fn as_ref(&self) -> &HotkeyCombination {
        self
    }
}

impl TryFrom<Vec<KeyCode>> for HotkeyCombination {
    type Error = HotkeyError;

    fn try_from(keys: Vec<KeyCode>) -> HotkeyResult<Self> {
        Self::new(keys)
    }
}

impl From<HotkeyCombination> for Vec<KeyCode> {
    fn from(combination: HotkeyCombination) -> Self {
        combination.keys.into_iter().collect()
    }
}

impl fmt::Display for HotkeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for key in &self.keys {
            if !first {
                f.write_str(" + ")?;
            }
            write!(f, "{}", key)?;
            first = false;
        }
        Ok(())
    }
}
