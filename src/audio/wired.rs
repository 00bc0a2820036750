use crate::error::{Result, SwitchError};
use crate::logging::Logger;
use crate::system::{WiredCallback, WiredEvent, WiredHeadsetInterface};

use super::device::{AudioDevice, DEFAULT_WIRED_HEADSET_NAME};

/// Tracks whether a wired headset is plugged in.
pub struct WiredHeadsetTracker<W: WiredHeadsetInterface> {
    wired: W,
    logger: Logger,
    registered: bool,
    headset: Option<AudioDevice>,
}

impl<W: WiredHeadsetInterface> WiredHeadsetTracker<W> {
    pub fn new(wired: W, logger: Logger) -> Self {
        Self {
            wired,
            logger,
            registered: false,
            headset: None,
        }
    }

    /// Register for plug broadcasts and pick up whatever is plugged in right now.
    pub fn start(&mut self, callback: WiredCallback) -> Result<()> {
        if self.registered {
            return Ok(());
        }

        self.wired
            .register(callback)
            .map_err(|e| SwitchError::HardwareUnavailable(e.to_string()))?;
        self.registered = true;
        self.headset = self.wired.plugged_headset().map(headset_device);
        log_debug!(
            self.logger,
            plugged = self.headset.is_some(),
            "Wired headset receiver registered"
        );
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.registered {
            self.wired.unregister();
            self.registered = false;
        }
        self.headset = None;
    }

    pub fn headset(&self) -> Option<&AudioDevice> {
        self.headset.as_ref()
    }

    /// Apply a plug event. Returns whether the tracked headset changed.
    pub fn handle_event(&mut self, event: WiredEvent) -> bool {
        let next = match event {
            WiredEvent::Plugged { name } => Some(headset_device(name)),
            WiredEvent::Unplugged => None,
        };
        if next == self.headset {
            return false;
        }

        match &next {
            Some(device) => log_debug!(self.logger, device = %device, "Wired headset connected"),
            None => log_debug!(self.logger, "Wired headset disconnected"),
        }
        self.headset = next;
        true
    }
}

fn headset_device(name: String) -> AudioDevice {
    if name.trim().is_empty() {
        AudioDevice::wired_headset(DEFAULT_WIRED_HEADSET_NAME)
    } else {
        AudioDevice::wired_headset(name)
    }
}
