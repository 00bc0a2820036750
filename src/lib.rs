#[macro_use]
pub mod logging;

pub mod audio;
pub mod config;
pub mod error;
pub mod notifications;
pub mod priority;
pub mod scenario;
pub mod switch;
pub mod system;

pub use audio::{AudioDevice, DeviceKind};
pub use config::Config;
pub use error::SwitchError;
pub use notifications::{AudioDeviceChangeListener, BluetoothHeadsetEvent};
pub use switch::{AudioSwitch, SimulatedAudioSwitch, SwitchConfig, SwitchState, VERSION};
