//! 对外通知模块
//!
//! 播放会话和热键分发器通过 [`NotificationHub`] 向界面层发送通知。
//! 发送永不阻塞，同一发送方的通知保持发送顺序。

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::hotkey::KeyCode;
use crate::playback::PlayingSound;
use crate::utils::ErrorCode;

/// 默认通知队列容量
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

/// 发给界面层的通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// 音效开始播放
    SoundPlayed { sound: PlayingSound },

    /// 播放进度更新（包括循环播放回到开头）
    SoundProgressed { sound: PlayingSound },

    /// 音效自然播放结束
    SoundFinished { sound: PlayingSound },

    /// 所有音效都已结束或被停止
    AllSoundsFinished,

    /// 热键录制模式下收到的按键序列（按按下顺序）
    HotkeyReceived { keys: Vec<KeyCode> },

    /// 需要展示给用户的错误
    Error { code: ErrorCode },
}

impl Notification {
    /// 获取通知名称（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            Self::SoundPlayed { .. } => "sound_played",
            Self::SoundProgressed { .. } => "sound_progressed",
            Self::SoundFinished { .. } => "sound_finished",
            Self::AllSoundsFinished => "all_sounds_finished",
            Self::HotkeyReceived { .. } => "hotkey_received",
            Self::Error { .. } => "error",
        }
    }

    /// 序列化为 JSON，供界面桥接层使用
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// 通知中心
///
/// 可克隆，所有克隆共享同一个广播通道
#[derive(Debug, Clone)]
pub struct NotificationHub {
    tx: broadcast::Sender<Notification>,
}

impl NotificationHub {
    /// 创建指定容量的通知中心
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 订阅通知
    ///
    /// 只会收到订阅之后发出的通知
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// 发出通知
    ///
    /// 没有订阅者时通知被丢弃
    pub fn emit(&self, notification: Notification) {
        let name = notification.name();
        match self.tx.send(notification) {
            Ok(receivers) => tracing::trace!(notification = name, receivers, "Notification emitted"),
            Err(_) => tracing::trace!(notification = name, "Notification dropped, no subscribers"),
        }
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}
