//! 应用上下文
//!
//! 创建并持有配置、通知中心、播放会话管理器和热键分发器，
//! 它们的生命周期与上下文绑定。

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::events::{Notification, NotificationHub};
use crate::hotkey::{KeyCode, TriggerDispatcher};
use crate::library::SoundId;
use crate::playback::{AudioBackend, PlaybackSessionManager};
use crate::state::{AppConfig, GlobalConfig};
use crate::utils::AppResult;

/// 应用上下文
pub struct AppContext {
    config: Arc<GlobalConfig>,
    notifications: NotificationHub,
    playback: Arc<PlaybackSessionManager>,
    dispatcher: TriggerDispatcher,
}

impl AppContext {
    /// 使用指定的音频后端和初始配置创建上下文
    pub fn new(backend: Arc<dyn AudioBackend>, config: AppConfig) -> AppResult<Self> {
        let config = Arc::new(GlobalConfig::new(config));
        let notifications = NotificationHub::default();

        let playback = Arc::new(PlaybackSessionManager::new(
            backend,
            Arc::clone(&config),
            notifications.clone(),
        )?);
        let dispatcher = TriggerDispatcher::new(
            Arc::clone(&config),
            Arc::clone(&playback),
            notifications.clone(),
        );

        tracing::info!("Application context initialized");

        Ok(Self {
            config,
            notifications,
            playback,
            dispatcher,
        })
    }

    /// 全局配置
    pub fn config(&self) -> &Arc<GlobalConfig> {
        &self.config
    }

    /// 播放会话管理器
    pub fn playback(&self) -> &Arc<PlaybackSessionManager> {
        &self.playback
    }

    /// 热键分发器
    pub fn dispatcher(&self) -> &TriggerDispatcher {
        &self.dispatcher
    }

    /// 订阅对外通知
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// 输入钩子入口
    pub fn on_key_event(&self, key: KeyCode, down: bool) -> Option<SoundId> {
        self.dispatcher.on_key_event(key, down)
    }
}
