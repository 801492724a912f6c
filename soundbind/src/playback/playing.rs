//! 播放实例与状态机
//!
//! ```text
//! Created ──▶ Playing ◀──▶ Paused
//!                │  ▲         │
//!                │  └ repeat  │
//!                ▼            ▼
//!            Finished      Stopped ◀── Playing
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::device::PlaybackDevice;
use super::error::{PlaybackError, PlaybackResult};
use crate::library::Sound;

/// 播放实例 ID
///
/// 与音效 ID 属于不同命名空间，同一进程内永不复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// 已创建，尚未开始输出
    Created,
    /// 播放中
    Playing,
    /// 已暂停
    Paused,
    /// 自然播放结束（终态）
    Finished,
    /// 被显式停止（终态）
    Stopped,
}

impl PlaybackState {
    /// 获取状态名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Finished => "Finished",
            Self::Stopped => "Stopped",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Stopped)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 自然播放结束后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 循环播放，从头重新进入 Playing
    Restarted,
    /// 进入 Finished
    Finished,
}

/// 正在播放的音效实例
///
/// 由播放会话管理器独占持有，对外只暴露快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayingSound {
    /// 实例 ID
    pub id: InstanceId,
    /// 来源音效
    pub sound: Sound,
    /// 目标输出设备
    pub device: PlaybackDevice,
    /// 当前播放位置
    #[serde(rename = "position_ms", with = "duration_ms")]
    pub position: Duration,
    /// 总时长（后端报告，可能未知）
    #[serde(rename = "length_ms", with = "option_duration_ms", default)]
    pub length: Option<Duration>,
    /// 是否循环播放（创建时从音效复制）
    pub repeat: bool,
    /// 当前状态
    pub state: PlaybackState,
}

impl PlayingSound {
    pub(crate) fn new(id: InstanceId, sound: Sound, device: PlaybackDevice) -> Self {
        Self {
            id,
            repeat: sound.repeat,
            sound,
            device,
            position: Duration::ZERO,
            length: None,
            state: PlaybackState::Created,
        }
    }

    pub(crate) fn start(&mut self) -> PlaybackResult<()> {
        self.guard("start", self.state == PlaybackState::Created)?;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    pub(crate) fn pause(&mut self) -> PlaybackResult<()> {
        self.guard("pause", self.state == PlaybackState::Playing)?;
        self.state = PlaybackState::Paused;
        Ok(())
    }

    pub(crate) fn resume(&mut self) -> PlaybackResult<()> {
        self.guard("resume", self.state == PlaybackState::Paused)?;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    pub(crate) fn seek(&mut self, position: Duration) -> PlaybackResult<()> {
        self.guard("seek", self.is_running())?;
        self.position = self.clamp(position);
        Ok(())
    }

    pub(crate) fn progress(&mut self, position: Duration) -> PlaybackResult<()> {
        self.guard("progress", self.state == PlaybackState::Playing)?;
        self.position = self.clamp(position);
        Ok(())
    }

    pub(crate) fn set_repeat(&mut self, repeat: bool) -> PlaybackResult<()> {
        self.guard("set repeat on", !self.state.is_terminal())?;
        self.repeat = repeat;
        Ok(())
    }

    pub(crate) fn stop(&mut self) -> PlaybackResult<()> {
        self.guard("stop", self.is_running())?;
        self.state = PlaybackState::Stopped;
        Ok(())
    }

    /// 后端报告播放到结尾
    pub(crate) fn complete(&mut self) -> PlaybackResult<Completion> {
        self.guard("complete", self.state == PlaybackState::Playing)?;
        if self.repeat {
            self.position = Duration::ZERO;
            Ok(Completion::Restarted)
        } else {
            self.finish()?;
            Ok(Completion::Finished)
        }
    }

    /// 不论是否循环，直接结束播放
    pub(crate) fn finish(&mut self) -> PlaybackResult<()> {
        self.guard("finish", self.state == PlaybackState::Playing)?;
        if let Some(length) = self.length {
            self.position = length;
        }
        self.state = PlaybackState::Finished;
        Ok(())
    }

    /// 是否处于 Playing 或 Paused
    pub fn is_running(&self) -> bool {
        matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
    }

    fn clamp(&self, position: Duration) -> Duration {
        match self.length {
            Some(length) => position.min(length),
            None => position,
        }
    }

    fn guard(&self, operation: &'static str, allowed: bool) -> PlaybackResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(PlaybackError::InvalidTransition {
                id: self.id,
                operation,
                state: self.state,
            })
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod option_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer
                .serialize_some(&u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
