use crate::audio::AudioDevice;
use crate::logging::Logger;
use crate::priority::{DevicePriorityManager, PreferredOrder};

/// Owns the available device list and the selected device.
///
/// Trackers only report what is connected; every selection decision is made here.
pub struct DeviceSelector {
    priority: DevicePriorityManager,
    available: Vec<AudioDevice>,
    selected: Option<AudioDevice>,
    pinned: bool,
    logger: Logger,
}

impl DeviceSelector {
    pub fn new(order: PreferredOrder, logger: Logger) -> Self {
        Self {
            priority: DevicePriorityManager::new(order, logger.clone()),
            available: Vec::new(),
            selected: None,
            pinned: false,
            logger,
        }
    }

    pub fn order(&self) -> &PreferredOrder {
        self.priority.order()
    }

    /// Available devices in priority order
    pub fn available(&self) -> &[AudioDevice] {
        &self.available
    }

    pub fn selected(&self) -> Option<&AudioDevice> {
        self.selected.as_ref()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Rebuild the available list from `candidates` and recompute the selection.
    ///
    /// A pinned device is kept while it is still available. A pinned Bluetooth headset
    /// that went away hands its pin to the most recently connected remaining headset.
    /// Otherwise the highest priority device not rejected by `is_excluded` wins.
    /// Returns whether the selected device changed.
    pub fn recompute<F>(&mut self, candidates: Vec<AudioDevice>, is_excluded: F) -> bool
    where
        F: Fn(&AudioDevice) -> bool,
    {
        self.available = self.priority.order_devices(candidates);

        if self.pinned {
            self.pinned = self.revalidate_pin(&is_excluded);
        }

        let next = if self.pinned {
            self.selected.clone()
        } else {
            self.priority.find_best_device(&self.available, &is_excluded)
        };

        if next == self.selected {
            return false;
        }
        log_info!(
            self.logger,
            from = ?self.selected.as_ref().map(AudioDevice::name),
            to = ?next.as_ref().map(AudioDevice::name),
            pinned = self.pinned,
            "Selected audio device changed"
        );
        self.selected = next;
        true
    }

    fn revalidate_pin<F>(&mut self, is_excluded: &F) -> bool
    where
        F: Fn(&AudioDevice) -> bool,
    {
        let Some(pinned) = self.selected.as_ref() else {
            return false;
        };
        // The pin belongs to the exact device, not its kind: a wired headset reported
        // under a new name no longer matches it.
        if self.available.contains(pinned) {
            return true;
        }

        if pinned.is_bluetooth() {
            let successor = self
                .available
                .iter()
                .find(|device| device.is_bluetooth() && !is_excluded(device))
                .cloned();
            if let Some(successor) = successor {
                log_debug!(self.logger, device = %successor, "Moving pin to remaining Bluetooth headset");
                self.selected = Some(successor);
                return true;
            }
        }

        log_debug!(self.logger, device = %pinned, "Pinned device is gone, clearing pin");
        false
    }

    /// Pin `device` as the explicit selection.
    ///
    /// Returns false, leaving everything unchanged, when `device` is not available.
    pub fn pin(&mut self, device: &AudioDevice) -> bool {
        if !self.available.contains(device) {
            return false;
        }
        self.selected = Some(device.clone());
        self.pinned = true;
        true
    }

    /// Return to automatic selection on the next recompute.
    pub fn clear_pin(&mut self) {
        self.pinned = false;
    }

    /// Drop the pin if it is on `device`.
    pub fn unpin(&mut self, device: &AudioDevice) {
        if self.pinned && self.selected.as_ref() == Some(device) {
            self.pinned = false;
        }
    }

    pub fn clear(&mut self) {
        self.available.clear();
        self.selected = None;
        self.pinned = false;
    }
}
