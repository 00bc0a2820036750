use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Callback registered with the platform Bluetooth headset profile.
/// May be invoked from any thread.
pub type BluetoothCallback = Box<dyn Fn(BluetoothEvent) + Send + Sync>;

/// Callback registered for wired headset plug broadcasts. May be invoked from any thread.
pub type WiredCallback = Box<dyn Fn(WiredEvent) + Send + Sync>;

/// Receives audio focus changes after focus has been requested.
pub type FocusChangeListener = Arc<dyn Fn(FocusChange) + Send + Sync>;

/// Notifications delivered by the platform Bluetooth headset profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BluetoothEvent {
    Connected { address: String, name: String },
    Disconnected { address: String },
    AudioConnected { address: String },
    AudioDisconnected { address: String },
    /// The platform gave up establishing the SCO link.
    AudioActivationFailed { address: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WiredEvent {
    Plugged { name: String },
    Unplugged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Gain,
    Loss,
    LossTransient,
    LossTransientCanDuck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    BluetoothConnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    Normal,
    Ringtone,
    InCall,
    InCommunication,
}

/// Snapshot of the platform audio settings the switch changes while activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioState {
    pub mode: AudioMode,
    pub speakerphone_on: bool,
    pub microphone_muted: bool,
}

impl Default for AudioState {
    fn default() -> Self {
        Self {
            mode: AudioMode::Normal,
            speakerphone_on: false,
            microphone_muted: false,
        }
    }
}

/// Trait for the platform Bluetooth headset profile and its SCO control
pub trait BluetoothHeadsetInterface {
    /// Whether a Bluetooth adapter exists and is enabled
    fn is_adapter_available(&self) -> bool;

    /// Start delivering headset events. Headsets that are already connected are
    /// reported through the callback as `Connected` events.
    fn start_listening(&self, callback: BluetoothCallback) -> Result<()>;

    /// Stop delivering events. Must be safe to call when not listening.
    fn stop_listening(&self);

    /// Ask the platform to open an SCO link to the headset. Completion is reported
    /// later as `AudioConnected` or `AudioActivationFailed`.
    fn enable_sco(&self, address: &str) -> Result<()>;

    /// Close any SCO link. Must be safe to call when none is open.
    fn disable_sco(&self);
}

/// Trait for the platform wired headset plug broadcast
pub trait WiredHeadsetInterface {
    fn register(&self, callback: WiredCallback) -> Result<()>;

    /// Must be safe to call when not registered.
    fn unregister(&self);

    /// Name of the headset plugged in right now, if any
    fn plugged_headset(&self) -> Option<String>;
}

/// Trait for runtime permission checks
pub trait PermissionInterface {
    fn is_granted(&self, permission: Permission) -> bool;
}

/// Trait for the platform audio manager: focus, speaker, microphone and audio mode
pub trait AudioManagerInterface {
    /// Whether the hardware has a phone-call earpiece
    fn has_earpiece(&self) -> bool;

    /// Returns false when the platform declines focus
    fn request_focus(&self, listener: Option<FocusChangeListener>) -> bool;

    fn abandon_focus(&self);

    fn set_speakerphone_on(&self, on: bool);

    fn set_microphone_mute(&self, muted: bool);

    fn set_mode(&self, mode: AudioMode);

    fn audio_state(&self) -> AudioState;
}

/// Trait for file system operations - abstracts std::fs for testability
pub trait FileSystemInterface {
    /// Read the entire contents of a configuration file
    fn read_config_file(&self, path: &Path) -> Result<String>;

    /// Write configuration content to a file
    fn write_config_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Check if a configuration file exists
    fn config_file_exists(&self, path: &Path) -> bool;

    /// Create the directory structure for config files
    fn create_config_dir(&self, path: &Path) -> Result<()>;
}
