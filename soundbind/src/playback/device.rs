use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;
use serde::{Deserialize, Serialize};

use super::error::{PlaybackError, PlaybackResult};

/// Information about an audio output device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackDevice {
    /// Device identifier (unique name)
    pub id: String,
    /// Human-readable device name
    pub name: String,
    /// Whether this is the system's default output
    pub is_default: bool,
}

impl PlaybackDevice {
    /// Create a device description
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_default: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_default,
        }
    }
}

/// List all available output devices
///
/// # Errors
/// Returns `PlaybackError::DeviceNotFound` if no output devices are found.
/// Returns `PlaybackError::CpalError` if there's an error accessing devices.
///
/// # Example
/// ```no_run
/// use soundbind_lib::playback::device::list_output_devices;
///
/// let devices = list_output_devices().unwrap();
/// for device in devices {
///     println!("Device: {} (default: {})", device.name, device.is_default);
/// }
/// ```
pub fn list_output_devices() -> PlaybackResult<Vec<PlaybackDevice>> {
    let host = cpal::default_host();
    let devices: Vec<Device> = host.output_devices()?.collect();

    if devices.is_empty() {
        return Err(PlaybackError::DeviceNotFound);
    }

    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let mut output_devices = Vec::with_capacity(devices.len());
    for device in devices {
        let name = device.name().map_err(|_| PlaybackError::InvalidDeviceName)?;
        let is_default = default_name.as_deref() == Some(name.as_str());

        output_devices.push(PlaybackDevice::new(name.clone(), name, is_default));
    }

    tracing::debug!(count = output_devices.len(), "Enumerated output devices");
    Ok(output_devices)
}

/// Get the default output device
///
/// # Errors
/// Returns `PlaybackError::DeviceNotFound` if the host has no default output.
pub fn get_default_output_device() -> PlaybackResult<PlaybackDevice> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(PlaybackError::DeviceNotFound)?;

    let name = device.name().map_err(|_| PlaybackError::InvalidDeviceName)?;

    Ok(PlaybackDevice::new(name.clone(), name, true))
}
