use std::fmt;

use crate::audio::{AudioDevice, DeviceKind};
use crate::error::{Result, SwitchError};
use crate::logging::Logger;

/// Priority of the four device kinds, highest first. Always holds each kind exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferredOrder([DeviceKind; 4]);

impl Default for PreferredOrder {
    /// Bluetooth, wired headset, earpiece, then speakerphone as the last resort
    fn default() -> Self {
        Self(DeviceKind::ALL)
    }
}

impl PreferredOrder {
    /// Build an order from a possibly partial list.
    ///
    /// The listed kinds come first, in the given order, followed by the remaining kinds
    /// in their default order. Listing a kind twice is an error.
    pub fn new(preferred: &[DeviceKind]) -> Result<Self> {
        for (index, kind) in preferred.iter().enumerate() {
            if preferred[..index].contains(kind) {
                return Err(SwitchError::DuplicatePreferredDevice(*kind));
            }
        }

        let mut kinds = DeviceKind::ALL;
        let remaining = DeviceKind::ALL
            .into_iter()
            .filter(|kind| !preferred.contains(kind));
        for (slot, kind) in kinds.iter_mut().zip(preferred.iter().copied().chain(remaining)) {
            *slot = kind;
        }
        Ok(Self(kinds))
    }

    pub fn kinds(&self) -> &[DeviceKind] {
        &self.0
    }

    pub fn head(&self) -> DeviceKind {
        self.0[0]
    }

    /// Position of `kind` in the order; lower is preferred
    pub fn rank(&self, kind: DeviceKind) -> usize {
        self.0
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.0.len())
    }
}

impl fmt::Display for PreferredOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", names.join(" > "))
    }
}

/// Orders devices by kind priority and picks the preferred one.
pub struct DevicePriorityManager {
    order: PreferredOrder,
    logger: Logger,
}

impl DevicePriorityManager {
    pub fn new(order: PreferredOrder, logger: Logger) -> Self {
        log_debug!(logger, order = %order, "Creating device priority manager");
        Self { order, logger }
    }

    pub fn order(&self) -> &PreferredOrder {
        &self.order
    }

    /// Deduplicate `devices` and sort them by kind priority.
    ///
    /// The sort is stable, so devices of the same kind keep the order they were
    /// supplied in (most recently connected first for Bluetooth headsets).
    pub fn order_devices<I>(&self, devices: I) -> Vec<AudioDevice>
    where
        I: IntoIterator<Item = AudioDevice>,
    {
        let mut ordered: Vec<AudioDevice> = Vec::new();
        for device in devices {
            if !ordered.contains(&device) {
                ordered.push(device);
            }
        }
        ordered.sort_by_key(|device| self.order.rank(device.kind()));
        ordered
    }

    /// First device in `available` that `is_excluded` does not reject.
    ///
    /// `available` must already be in priority order. When every device is excluded
    /// the head of the list is returned anyway.
    pub fn find_best_device<F>(&self, available: &[AudioDevice], is_excluded: F) -> Option<AudioDevice>
    where
        F: Fn(&AudioDevice) -> bool,
    {
        let best = available
            .iter()
            .find(|device| !is_excluded(device))
            .or_else(|| available.first())
            .cloned();

        match &best {
            Some(device) => log_debug!(self.logger, device = %device, "Best available device"),
            None => log_debug!(self.logger, "No audio device available"),
        }
        best
    }
}
