//! 集成测试公共工具
//!
//! 提供记录所有调用的模拟音频后端

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::TryRecvError};

use soundbind_lib::events::Notification;
use soundbind_lib::hotkey::{HotkeyCombination, KeyCode};
use soundbind_lib::library::{Sound, SoundId, SoundSource};
use soundbind_lib::playback::{
    AudioBackend, BackendHandle, BackendNotifier, BackendOperation, PlaybackDevice,
    PlaybackError, PlaybackResult, StartedPlayback,
};

pub const DEFAULT_DEVICE: &str = "speakers";
pub const VIRTUAL_DEVICE: &str = "virtual-cable";

/// 后端收到的调用
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start {
        source: String,
        device: String,
        handle: BackendHandle,
    },
    Pause(BackendHandle),
    Resume(BackendHandle),
    Seek(BackendHandle, Duration),
    Stop(BackendHandle),
}

/// 模拟音频后端
pub struct MockBackend {
    devices: Vec<PlaybackDevice>,
    length: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    failing: Mutex<Vec<BackendOperation>>,
    notifiers: Mutex<HashMap<BackendHandle, BackendNotifier>>,
    next_handle: AtomicU64,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            devices: vec![
                PlaybackDevice::new(DEFAULT_DEVICE, "Speakers", true),
                PlaybackDevice::new(VIRTUAL_DEVICE, "Virtual Cable", false),
            ],
            length: None,
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
            notifiers: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(100),
        }
    }

    /// 所有播放都报告指定的时长
    pub fn with_length(mut self, length: Duration) -> Self {
        self.length = Some(length);
        self
    }

    /// 让指定操作失败
    pub fn fail(&self, operation: BackendOperation) {
        self.failing.lock().push(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// 已启动播放的 (音源, 设备) 列表
    pub fn starts(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Start { source, device, .. } => Some((source, device)),
                _ => None,
            })
            .collect()
    }

    pub fn started_handles(&self) -> Vec<BackendHandle> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Start { handle, .. } => Some(handle),
                _ => None,
            })
            .collect()
    }

    pub fn stopped_handles(&self) -> Vec<BackendHandle> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Stop(handle) => Some(handle),
                _ => None,
            })
            .collect()
    }

    /// 最近一次启动的句柄
    pub fn last_handle(&self) -> BackendHandle {
        *self.started_handles().last().expect("no playback started")
    }

    /// 模拟播放到结尾
    pub fn end_of_stream(&self, handle: BackendHandle) {
        let notifier = self.notifiers.lock().get(&handle).cloned();
        notifier.expect("unknown handle").end_of_stream(handle);
    }

    /// 模拟进度报告
    pub fn progress(&self, handle: BackendHandle, position: Duration) {
        let notifier = self.notifiers.lock().get(&handle).cloned();
        notifier.expect("unknown handle").progressed(handle, position);
    }

    fn record(&self, operation: BackendOperation, call: Call) -> PlaybackResult<()> {
        if self.failing.lock().contains(&operation) {
            return Err(PlaybackError::backend(operation, "mock failure"));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

impl AudioBackend for MockBackend {
    fn start_playback(
        &self,
        source: &SoundSource,
        device: &PlaybackDevice,
        notifier: BackendNotifier,
    ) -> PlaybackResult<StartedPlayback> {
        let handle = BackendHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.record(
            BackendOperation::Start,
            Call::Start {
                source: source.as_str().to_string(),
                device: device.id.clone(),
                handle,
            },
        )?;
        self.notifiers.lock().insert(handle, notifier);

        let started = StartedPlayback::new(handle);
        Ok(match self.length {
            Some(length) => started.with_length(length),
            None => started,
        })
    }

    fn pause_playback(&self, handle: BackendHandle) -> PlaybackResult<()> {
        self.record(BackendOperation::Pause, Call::Pause(handle))
    }

    fn resume_playback(&self, handle: BackendHandle) -> PlaybackResult<()> {
        self.record(BackendOperation::Resume, Call::Resume(handle))
    }

    fn seek_playback(&self, handle: BackendHandle, position: Duration) -> PlaybackResult<()> {
        self.record(BackendOperation::Seek, Call::Seek(handle, position))
    }

    fn stop_playback(&self, handle: BackendHandle) -> PlaybackResult<()> {
        self.record(BackendOperation::Stop, Call::Stop(handle))
    }

    fn output_devices(&self) -> PlaybackResult<Vec<PlaybackDevice>> {
        Ok(self.devices.clone())
    }

    fn default_output_device(&self) -> PlaybackResult<PlaybackDevice> {
        self.devices
            .iter()
            .find(|device| device.is_default)
            .cloned()
            .ok_or(PlaybackError::DeviceNotFound)
    }
}

pub fn combo(keys: &[u32]) -> HotkeyCombination {
    HotkeyCombination::new(keys.iter().copied().map(KeyCode)).unwrap()
}

pub fn sound(id: u32) -> Sound {
    Sound::new(SoundId(id), format!("sound {}", id), format!("sound-{}.wav", id))
}

pub fn default_device() -> PlaybackDevice {
    PlaybackDevice::new(DEFAULT_DEVICE, "Speakers", true)
}

/// 取出当前已收到的全部通知
pub fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut received = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(notification) => received.push(notification),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => return received,
        }
    }
}
