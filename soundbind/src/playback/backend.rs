//! Audio backend capability
//!
//! The session manager never talks to an audio API directly. Whatever renders
//! sound (a cpal stream, a platform mixer, a test double) implements
//! [`AudioBackend`] and is selected once when the application context is built.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;

use super::device::{self, PlaybackDevice};
use super::error::{PlaybackError, PlaybackResult};
use super::manager::Command;
use crate::library::SoundSource;

/// Opaque handle identifying one backend playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendHandle(pub u64);

impl fmt::Display for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of a successful `start_playback`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartedPlayback {
    /// Handle used for every later call on this playback
    pub handle: BackendHandle,
    /// Total length of the source, if the backend knows it
    pub length: Option<Duration>,
}

impl StartedPlayback {
    pub fn new(handle: BackendHandle) -> Self {
        Self {
            handle,
            length: None,
        }
    }

    pub fn with_length(mut self, length: Duration) -> Self {
        self.length = Some(length);
        self
    }
}

/// Audio output capability
///
/// Calls are made from the session manager's thread, one at a time.
/// After end-of-stream a handle stays valid until `stop_playback`;
/// seeking it back to zero restarts rendering.
pub trait AudioBackend: Send + Sync {
    /// Open `device` and start rendering `source`
    ///
    /// Progress and end-of-stream for the returned handle are reported through `notifier`.
    fn start_playback(
        &self,
        source: &SoundSource,
        device: &PlaybackDevice,
        notifier: BackendNotifier,
    ) -> PlaybackResult<StartedPlayback>;

    fn pause_playback(&self, handle: BackendHandle) -> PlaybackResult<()>;

    fn resume_playback(&self, handle: BackendHandle) -> PlaybackResult<()>;

    fn seek_playback(&self, handle: BackendHandle, position: Duration) -> PlaybackResult<()>;

    /// Stop rendering and release the device
    ///
    /// The device must be free for a new `start_playback` once this returns.
    fn stop_playback(&self, handle: BackendHandle) -> PlaybackResult<()>;

    /// Available output devices
    fn output_devices(&self) -> PlaybackResult<Vec<PlaybackDevice>> {
        device::list_output_devices()
    }

    /// The system's default output device
    fn default_output_device(&self) -> PlaybackResult<PlaybackDevice> {
        device::get_default_output_device()
    }

    /// Find an output device by its ID
    ///
    /// # Errors
    /// Returns `PlaybackError::DeviceNotFound` if no output device carries this ID.
    fn find_output_device(&self, device_id: &str) -> PlaybackResult<PlaybackDevice> {
        self.output_devices()?
            .into_iter()
            .find(|device| device.id == device_id)
            .ok_or(PlaybackError::DeviceNotFound)
    }
}

/// Reporting channel from the backend back into the session manager
///
/// Holds no strong reference to the manager: reports sent after the manager
/// has shut down are dropped.
#[derive(Clone)]
pub struct BackendNotifier {
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl BackendNotifier {
    pub(crate) fn new(tx: mpsc::WeakUnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Report the current rendering position of `handle`
    pub fn progressed(&self, handle: BackendHandle, position: Duration) {
        self.send(Command::Progressed { handle, position });
    }

    /// Report that `handle` reached the end of its source
    pub fn end_of_stream(&self, handle: BackendHandle) {
        self.send(Command::EndOfStream { handle });
    }

    fn send(&self, command: Command) {
        let Some(tx) = self.tx.upgrade() else {
            tracing::trace!("Playback manager gone, backend report dropped");
            return;
        };
        if tx.send(command).is_err() {
            tracing::trace!("Playback manager gone, backend report dropped");
        }
    }
}

impl fmt::Debug for BackendNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendNotifier").finish_non_exhaustive()
    }
}
