//! Error types for audio route switching.
//!
//! Most of these never cross the public surface of [`AudioSwitch`](crate::AudioSwitch):
//! collaborator failures are logged and the switch degrades to "feature unavailable".
//! The exceptions are construction-time validation and activating a stopped switch.

use thiserror::Error;

use crate::audio::DeviceKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwitchError {
    /// Bluetooth connect permission has not been granted.
    #[error("Bluetooth unsupported, permissions not granted")]
    PermissionDenied,

    /// Required hardware (usually the Bluetooth adapter) is missing or disabled.
    #[error("Hardware unavailable: {0}")]
    HardwareUnavailable(String),

    /// The requested device is not in the available list.
    #[error("Audio device is not available: {0}")]
    InvalidSelection(String),

    /// The platform declined the audio focus request.
    #[error("Audio focus request was declined")]
    FocusRequestFailed,

    /// Starting the SCO link to a Bluetooth headset failed.
    #[error("Bluetooth SCO activation failed for {0}")]
    ScoActivationFailed(String),

    /// A preferred device list named the same kind more than once.
    #[error("Preferred device list contains {0} more than once")]
    DuplicatePreferredDevice(DeviceKind),

    /// A device kind name in the configuration could not be parsed.
    #[error("Unknown audio device kind: '{0}'")]
    UnknownDeviceKind(String),

    /// The operation requires a started switch.
    #[error("Audio switch has not been started")]
    NotStarted,
}

pub type Result<T> = std::result::Result<T, SwitchError>;
