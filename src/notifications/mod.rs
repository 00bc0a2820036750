use std::fmt;

use crate::audio::AudioDevice;
use crate::logging::Logger;

/// Invoked with the available devices (in priority order) and the selected device.
pub type AudioDeviceChangeListener = Box<dyn FnMut(&[AudioDevice], Option<&AudioDevice>) + Send>;

/// Invoked for every Bluetooth headset state change the switch observes.
pub type BluetoothHeadsetListener = Box<dyn FnMut(&BluetoothHeadsetEvent) + Send>;

/// Headset-level Bluetooth events forwarded to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BluetoothHeadsetEvent {
    Connected(AudioDevice),
    Disconnected(AudioDevice),
    AudioConnected(AudioDevice),
    AudioDisconnected(AudioDevice),
    /// SCO could not be established; the switch has fallen back to another device.
    ActivationError(AudioDevice),
}

impl fmt::Display for BluetoothHeadsetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BluetoothHeadsetEvent::Connected(d) => write!(f, "{} connected", d.name()),
            BluetoothHeadsetEvent::Disconnected(d) => write!(f, "{} disconnected", d.name()),
            BluetoothHeadsetEvent::AudioConnected(d) => {
                write!(f, "{} audio connected", d.name())
            }
            BluetoothHeadsetEvent::AudioDisconnected(d) => {
                write!(f, "{} audio disconnected", d.name())
            }
            BluetoothHeadsetEvent::ActivationError(d) => {
                write!(f, "{} audio activation failed", d.name())
            }
        }
    }
}

/// Owns the application's optional listener slots.
///
/// Every notification goes through here so that "no listener registered" is handled
/// in exactly one place.
#[derive(Default)]
pub struct NotificationManager {
    device_listener: Option<AudioDeviceChangeListener>,
    bluetooth_listener: Option<BluetoothHeadsetListener>,
    logger: Logger,
}

impl NotificationManager {
    pub fn new(logger: Logger) -> Self {
        Self {
            device_listener: None,
            bluetooth_listener: None,
            logger,
        }
    }

    pub fn set_device_listener(&mut self, listener: Option<AudioDeviceChangeListener>) {
        self.device_listener = listener;
    }

    pub fn has_device_listener(&self) -> bool {
        self.device_listener.is_some()
    }

    pub fn set_bluetooth_listener(&mut self, listener: Option<BluetoothHeadsetListener>) {
        self.bluetooth_listener = listener;
    }

    /// Notify the device listener, if any, of the current device state.
    pub fn devices_changed(&mut self, devices: &[AudioDevice], selected: Option<&AudioDevice>) {
        match self.device_listener.as_mut() {
            Some(listener) => {
                log_debug!(
                    self.logger,
                    devices = devices.len(),
                    selected = ?selected.map(AudioDevice::name),
                    "Notifying audio device change listener"
                );
                listener(devices, selected);
            }
            None => {
                log_debug!(self.logger, "No audio device change listener registered");
            }
        }
    }

    /// Forward a Bluetooth headset event to the application, if it asked for them.
    pub fn bluetooth_event(&mut self, event: &BluetoothHeadsetEvent) {
        if let Some(listener) = self.bluetooth_listener.as_mut() {
            log_debug!(self.logger, event = %event, "Notifying Bluetooth headset listener");
            listener(event);
        }
    }
}
