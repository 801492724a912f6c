//! 播放会话管理器
//!
//! 管理所有正在播放的音效实例的生命周期。
//!
//! 所有请求（界面请求、热键触发、后端进度与结束报告）都通过一个命令通道
//! 送到专门的会话线程，按到达顺序逐个处理。因此：
//!
//! - 同一实例上的操作按调用顺序生效
//! - `stop_all` 与并发的 `trigger` 之间只有"之前"或"之后"两种结果
//! - 实例集合只在会话线程中被修改

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::backend::{AudioBackend, BackendHandle, BackendNotifier};
use super::device::PlaybackDevice;
use super::error::{PlaybackError, PlaybackResult};
use super::playing::{Completion, InstanceId, PlayingSound};
use crate::events::{Notification, NotificationHub};
use crate::library::Sound;
use crate::state::GlobalConfig;
use crate::utils::{AppError, ErrorCode};

/// 会话命令
#[derive(Debug)]
pub(crate) enum Command {
    /// 按当前路由配置播放音效
    Trigger { sound: Sound },
    /// 在指定设备上播放音效
    Play {
        sound: Sound,
        device: PlaybackDevice,
        response: oneshot::Sender<Vec<InstanceId>>,
    },
    Pause {
        id: InstanceId,
        response: oneshot::Sender<Option<PlayingSound>>,
    },
    Resume {
        id: InstanceId,
        response: oneshot::Sender<Option<PlayingSound>>,
    },
    Seek {
        id: InstanceId,
        position: Duration,
        response: oneshot::Sender<Option<PlayingSound>>,
    },
    SetRepeat {
        id: InstanceId,
        repeat: bool,
        response: oneshot::Sender<Option<PlayingSound>>,
    },
    Stop {
        id: InstanceId,
        response: oneshot::Sender<()>,
    },
    StopAll {
        response: oneshot::Sender<()>,
    },
    Get {
        id: InstanceId,
        response: oneshot::Sender<Option<PlayingSound>>,
    },
    List {
        response: oneshot::Sender<Vec<PlayingSound>>,
    },
    /// 后端报告播放位置
    Progressed {
        handle: BackendHandle,
        position: Duration,
    },
    /// 后端报告播放到结尾
    EndOfStream { handle: BackendHandle },
}

/// 播放会话管理器
///
/// 可以在任意线程上调用。管理器被丢弃后会话线程释放所有后端资源并退出。
pub struct PlaybackSessionManager {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl PlaybackSessionManager {
    /// 创建管理器并启动会话线程
    ///
    /// # Arguments
    ///
    /// * `backend` - 音频后端
    /// * `config` - 全局配置（读取输出路由）
    /// * `notifications` - 通知中心
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        config: Arc<GlobalConfig>,
        notifications: NotificationHub,
    ) -> PlaybackResult<Self> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let task = SessionTask {
            backend,
            config,
            notifications,
            notifier: BackendNotifier::new(command_tx.downgrade()),
            live: BTreeMap::new(),
            handles: HashMap::new(),
            next_id: 1,
        };

        std::thread::Builder::new()
            .name("playback-session".to_string())
            .spawn(move || task.run(command_rx))
            .map_err(|e| PlaybackError::ManagerUnavailable(e.to_string()))?;

        Ok(Self { command_tx })
    }

    /// 按当前路由配置播放音效
    ///
    /// 立即返回，不等待设备打开。可以在输入线程上直接调用。
    pub fn trigger(&self, sound: Sound) {
        tracing::debug!(sound_id = %sound.id, "Sound triggered");
        if self.command_tx.send(Command::Trigger { sound }).is_err() {
            tracing::warn!("Playback session is closed, trigger dropped");
        }
    }

    /// 在指定设备上播放音效
    ///
    /// `device` 不是默认设备且开启了"同时输出到默认设备"时，默认设备上会再创建
    /// 一个实例。返回创建的实例 ID，`device` 上的实例排在第一位；
    /// 后端启动失败时返回空列表，并发出错误通知。
    pub async fn play(&self, sound: Sound, device: PlaybackDevice) -> Vec<InstanceId> {
        self.request(|response| Command::Play {
            sound,
            device,
            response,
        })
        .await
        .unwrap_or_default()
    }

    /// 暂停播放（仅 Playing 状态有效）
    pub async fn pause(&self, id: InstanceId) -> Option<PlayingSound> {
        self.request(|response| Command::Pause { id, response })
            .await
            .flatten()
    }

    /// 恢复播放（仅 Paused 状态有效）
    pub async fn resume(&self, id: InstanceId) -> Option<PlayingSound> {
        self.request(|response| Command::Resume { id, response })
            .await
            .flatten()
    }

    /// 跳转到指定位置（Playing 或 Paused 状态有效）
    pub async fn seek(&self, id: InstanceId, position: Duration) -> Option<PlayingSound> {
        self.request(|response| Command::Seek {
            id,
            position,
            response,
        })
        .await
        .flatten()
    }

    /// 设置是否循环播放
    pub async fn set_repeat(&self, id: InstanceId, repeat: bool) -> Option<PlayingSound> {
        self.request(|response| Command::SetRepeat {
            id,
            repeat,
            response,
        })
        .await
        .flatten()
    }

    /// 停止播放并释放设备
    ///
    /// 返回时设备已经释放
    pub async fn stop(&self, id: InstanceId) {
        self.request(|response| Command::Stop { id, response }).await;
    }

    /// 停止所有正在播放的音效
    pub async fn stop_all(&self) {
        self.request(|response| Command::StopAll { response }).await;
    }

    /// 获取实例快照
    pub async fn get(&self, id: InstanceId) -> Option<PlayingSound> {
        self.request(|response| Command::Get { id, response })
            .await
            .flatten()
    }

    /// 获取所有正在播放的实例（按实例 ID 排序）
    pub async fn playing(&self) -> Vec<PlayingSound> {
        self.request(|response| Command::List { response })
            .await
            .unwrap_or_default()
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (response_tx, response_rx) = oneshot::channel();

        if self.command_tx.send(command(response_tx)).is_err() {
            tracing::warn!("Playback session is closed, request dropped");
            return None;
        }

        response_rx.await.ok()
    }
}

/// 实例及其后端句柄
struct LiveSound {
    playing: PlayingSound,
    handle: BackendHandle,
}

/// 会话线程状态
struct SessionTask {
    backend: Arc<dyn AudioBackend>,
    config: Arc<GlobalConfig>,
    notifications: NotificationHub,
    notifier: BackendNotifier,
    live: BTreeMap<InstanceId, LiveSound>,
    handles: HashMap<BackendHandle, InstanceId>,
    next_id: u32,
}

impl SessionTask {
    fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<Command>) {
        tracing::info!("Playback session started");

        while let Some(command) = command_rx.blocking_recv() {
            self.handle(command);
        }

        self.shutdown();
        tracing::info!("Playback session stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Trigger { sound } => self.trigger(sound),
            Command::Play {
                sound,
                device,
                response,
            } => {
                let _ = response.send(self.play_routed(sound, device));
            }
            Command::Pause { id, response } => {
                let result = self.transition(id, PlayingSound::pause, |backend, handle, _| {
                    backend.pause_playback(handle)
                });
                let _ = response.send(result);
            }
            Command::Resume { id, response } => {
                let result = self.transition(id, PlayingSound::resume, |backend, handle, _| {
                    backend.resume_playback(handle)
                });
                let _ = response.send(result);
            }
            Command::Seek {
                id,
                position,
                response,
            } => {
                let result = self.transition(
                    id,
                    |playing| playing.seek(position),
                    |backend, handle, playing| backend.seek_playback(handle, playing.position),
                );
                let _ = response.send(result);
            }
            Command::SetRepeat {
                id,
                repeat,
                response,
            } => {
                let result = self.transition(id, |playing| playing.set_repeat(repeat), |_, _, _| Ok(()));
                let _ = response.send(result);
            }
            Command::Stop { id, response } => {
                self.stop(id);
                let _ = response.send(());
            }
            Command::StopAll { response } => {
                self.stop_all();
                let _ = response.send(());
            }
            Command::Get { id, response } => {
                let _ = response.send(self.live.get(&id).map(|live| live.playing.clone()));
            }
            Command::List { response } => {
                let _ = response.send(self.live.values().map(|live| live.playing.clone()).collect());
            }
            Command::Progressed { handle, position } => self.progressed(handle, position),
            Command::EndOfStream { handle } => self.end_of_stream(handle),
        }
    }

    fn trigger(&mut self, sound: Sound) {
        let selected = self.selected_device();
        let Some(selected) = self.report(selected) else {
            return;
        };

        self.play_routed(sound, selected);
    }

    /// 当前选中的输出设备
    ///
    /// 未选择或选中的设备已不存在时使用默认设备
    fn selected_device(&self) -> PlaybackResult<PlaybackDevice> {
        let config = self.config.get();
        let Some(device_id) = config.playback.output_device.as_deref() else {
            return self.backend.default_output_device();
        };

        match self.backend.find_output_device(device_id) {
            Err(PlaybackError::DeviceNotFound) => {
                tracing::warn!(device_id, "Selected output device not found, using default");
                self.backend.default_output_device()
            }
            result => result,
        }
    }

    /// 在设备上播放，并按路由配置复制到默认设备
    ///
    /// 选中非默认设备且开启"同时输出到默认设备"（未开启播放时静音）时，
    /// 默认设备上的实例作为第二个目标独立跟踪
    fn play_routed(&mut self, sound: Sound, device: PlaybackDevice) -> Vec<InstanceId> {
        let duplicate = !device.is_default && self.config.get().playback.duplicates_to_default();

        let Some(primary) = self.play(sound.clone(), device) else {
            return Vec::new();
        };
        let mut ids = vec![primary];

        if duplicate {
            let default = self.backend.default_output_device();
            if let Some(id) = self.report(default).and_then(|default| self.play(sound, default)) {
                ids.push(id);
            }
        }

        ids
    }

    fn play(&mut self, sound: Sound, device: PlaybackDevice) -> Option<InstanceId> {
        let id = next_instance_id(&mut self.next_id);
        let id = self.report(id)?;

        let mut playing = PlayingSound::new(id, sound, device);
        self.report(playing.start())?;

        let started = self.backend.start_playback(
            &playing.sound.source,
            &playing.device,
            self.notifier.clone(),
        );
        let started = self.report(started)?;
        playing.length = started.length;

        tracing::info!(
            instance = %id,
            sound_id = %playing.sound.id,
            device = %playing.device.name,
            handle = %started.handle,
            "Playback started"
        );

        self.handles.insert(started.handle, id);
        self.live.insert(
            id,
            LiveSound {
                playing: playing.clone(),
                handle: started.handle,
            },
        );
        self.notifications
            .emit(Notification::SoundPlayed { sound: playing });

        Some(id)
    }

    /// 执行一次状态迁移
    ///
    /// 先在副本上检查状态机守卫，后端操作成功后才提交
    fn transition(
        &mut self,
        id: InstanceId,
        update: impl FnOnce(&mut PlayingSound) -> PlaybackResult<()>,
        effect: impl FnOnce(&dyn AudioBackend, BackendHandle, &PlayingSound) -> PlaybackResult<()>,
    ) -> Option<PlayingSound> {
        let result = self.try_transition(id, update, effect);
        self.report(result)
    }

    fn try_transition(
        &mut self,
        id: InstanceId,
        update: impl FnOnce(&mut PlayingSound) -> PlaybackResult<()>,
        effect: impl FnOnce(&dyn AudioBackend, BackendHandle, &PlayingSound) -> PlaybackResult<()>,
    ) -> PlaybackResult<PlayingSound> {
        let live = self
            .live
            .get_mut(&id)
            .ok_or(PlaybackError::UnknownInstance(id))?;

        let mut next = live.playing.clone();
        update(&mut next)?;
        effect(self.backend.as_ref(), live.handle, &next)?;

        tracing::debug!(instance = %id, state = %next.state, "Playback state changed");
        live.playing = next.clone();
        Ok(next)
    }

    fn stop(&mut self, id: InstanceId) {
        let checked = self
            .live
            .get(&id)
            .ok_or(PlaybackError::UnknownInstance(id))
            .and_then(|live| live.playing.clone().stop());
        if self.report(checked).is_none() {
            return;
        }

        self.release(id);
        tracing::info!(instance = %id, "Playback stopped");

        if self.live.is_empty() {
            self.notifications.emit(Notification::AllSoundsFinished);
        }
    }

    fn stop_all(&mut self) {
        let ids: Vec<InstanceId> = self.live.keys().copied().collect();
        for &id in &ids {
            self.release(id);
        }

        tracing::info!(count = ids.len(), "All playback stopped");
        self.notifications.emit(Notification::AllSoundsFinished);
    }

    fn progressed(&mut self, handle: BackendHandle, position: Duration) {
        let Some(live) = self
            .handles
            .get(&handle)
            .and_then(|id| self.live.get_mut(id))
        else {
            tracing::trace!(handle = %handle, "Progress for released handle ignored");
            return;
        };

        let mut next = live.playing.clone();
        if let Err(err) = next.progress(position) {
            tracing::trace!(error = %err, "Progress report ignored");
            return;
        }

        live.playing = next.clone();
        self.notifications
            .emit(Notification::SoundProgressed { sound: next });
    }

    fn end_of_stream(&mut self, handle: BackendHandle) {
        let Some(&id) = self.handles.get(&handle) else {
            tracing::trace!(handle = %handle, "End of stream for released handle ignored");
            return;
        };
        let Some(live) = self.live.get_mut(&id) else {
            return;
        };

        let mut next = live.playing.clone();
        match next.complete() {
            Ok(Completion::Restarted) => match self.backend.seek_playback(handle, Duration::ZERO) {
                Ok(()) => {
                    tracing::debug!(instance = %id, "Playback restarted");
                    live.playing = next.clone();
                    self.notifications
                        .emit(Notification::SoundProgressed { sound: next });
                }
                Err(err) => {
                    tracing::error!(instance = %id, error = %err, "Failed to restart playback");
                    self.notifications.emit(Notification::Error {
                        code: ErrorCode::FailedToRepeat,
                    });
                    match next.finish() {
                        Ok(()) => self.finish(id, next),
                        Err(err) => tracing::debug!(error = %err, "Finish ignored"),
                    }
                }
            },
            Ok(Completion::Finished) => self.finish(id, next),
            Err(err) => tracing::debug!(error = %err, "End of stream ignored"),
        }
    }

    fn finish(&mut self, id: InstanceId, finished: PlayingSound) {
        self.release(id);
        tracing::info!(instance = %id, sound_id = %finished.sound.id, "Playback finished");

        self.notifications
            .emit(Notification::SoundFinished { sound: finished });
        if self.live.is_empty() {
            self.notifications.emit(Notification::AllSoundsFinished);
        }
    }

    /// 从实例集合中移除并释放后端资源
    fn release(&mut self, id: InstanceId) -> Option<PlayingSound> {
        let live = self.live.remove(&id)?;
        self.handles.remove(&live.handle);

        let result = self.backend.stop_playback(live.handle);
        self.report(result);

        Some(live.playing)
    }

    fn shutdown(&mut self) {
        self.handles.clear();
        for (id, live) in std::mem::take(&mut self.live) {
            if let Err(err) = self.backend.stop_playback(live.handle) {
                tracing::warn!(instance = %id, error = %err, "Failed to release playback on shutdown");
            }
        }
    }

    /// 处理操作结果
    ///
    /// 守卫拒绝只记录日志；其余错误发出错误通知
    fn report<T>(&self, result: PlaybackResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) if err.is_guard_violation() => {
                tracing::debug!(error = %err, "Playback request ignored");
                None
            }
            Err(err) => {
                tracing::error!(error = %err, "Playback operation failed");
                let code = AppError::from(err).code();
                self.notifications.emit(Notification::Error { code });
                None
            }
        }
    }
}

/// 分配下一个实例 ID
fn next_instance_id(next_id: &mut u32) -> PlaybackResult<InstanceId> {
    let id = InstanceId(*next_id);
    *next_id = next_id
        .checked_add(1)
        .ok_or(PlaybackError::InstanceIdsExhausted)?;
    Ok(id)
}
