use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SwitchError;

/// The four kinds of audio endpoint a handset can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    BluetoothHeadset,
    WiredHeadset,
    Earpiece,
    Speakerphone,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 4] = [
        DeviceKind::BluetoothHeadset,
        DeviceKind::WiredHeadset,
        DeviceKind::Earpiece,
        DeviceKind::Speakerphone,
    ];
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::BluetoothHeadset => write!(f, "BluetoothHeadset"),
            DeviceKind::WiredHeadset => write!(f, "WiredHeadset"),
            DeviceKind::Earpiece => write!(f, "Earpiece"),
            DeviceKind::Speakerphone => write!(f, "Speakerphone"),
        }
    }
}

impl FromStr for DeviceKind {
    type Err = SwitchError;

    /// Accepts both `BluetoothHeadset` and `bluetooth_headset` spellings, plus the
    /// short forms `bluetooth`, `wired` and `speaker`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "bluetoothheadset" | "bluetooth" => Ok(DeviceKind::BluetoothHeadset),
            "wiredheadset" | "wired" => Ok(DeviceKind::WiredHeadset),
            "earpiece" => Ok(DeviceKind::Earpiece),
            "speakerphone" | "speaker" => Ok(DeviceKind::Speakerphone),
            _ => Err(SwitchError::UnknownDeviceKind(s.to_string())),
        }
    }
}

/// An audio endpoint. Bluetooth headsets are identified by their hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioDevice {
    Earpiece,
    Speakerphone,
    WiredHeadset { name: String },
    BluetoothHeadset { name: String, address: String },
}

pub const EARPIECE_NAME: &str = "Earpiece";
pub const SPEAKERPHONE_NAME: &str = "Speakerphone";
pub const DEFAULT_WIRED_HEADSET_NAME: &str = "Wired Headset";

impl AudioDevice {
    pub fn wired_headset(name: impl Into<String>) -> Self {
        AudioDevice::WiredHeadset { name: name.into() }
    }

    pub fn bluetooth_headset(name: impl Into<String>, address: impl Into<String>) -> Self {
        AudioDevice::BluetoothHeadset {
            name: name.into(),
            address: address.into(),
        }
    }

    pub fn kind(&self) -> DeviceKind {
        match self {
            AudioDevice::Earpiece => DeviceKind::Earpiece,
            AudioDevice::Speakerphone => DeviceKind::Speakerphone,
            AudioDevice::WiredHeadset { .. } => DeviceKind::WiredHeadset,
            AudioDevice::BluetoothHeadset { .. } => DeviceKind::BluetoothHeadset,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AudioDevice::Earpiece => EARPIECE_NAME,
            AudioDevice::Speakerphone => SPEAKERPHONE_NAME,
            AudioDevice::WiredHeadset { name } => name,
            AudioDevice::BluetoothHeadset { name, .. } => name,
        }
    }

    /// Hardware address, only present for Bluetooth headsets.
    pub fn address(&self) -> Option<&str> {
        match self {
            AudioDevice::BluetoothHeadset { address, .. } => Some(address),
            _ => None,
        }
    }

    pub fn is_bluetooth(&self) -> bool {
        matches!(self, AudioDevice::BluetoothHeadset { .. })
    }
}

impl fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioDevice::BluetoothHeadset { name, address } => {
                write!(f, "{} ({}) [{}]", name, self.kind(), address)
            }
            AudioDevice::WiredHeadset { name } => write!(f, "{} ({})", name, self.kind()),
            _ => write!(f, "{}", self.name()),
        }
    }
}
