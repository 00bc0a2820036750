use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::error::{Result, SwitchError};
use crate::logging::Logger;
use crate::notifications::BluetoothHeadsetEvent;
use crate::system::{BluetoothCallback, BluetoothEvent, BluetoothHeadsetInterface};

use super::device::AudioDevice;

/// State of the SCO audio link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoState {
    Idle,
    Activating { address: String, since: Instant },
    Active { address: String },
}

/// Tracks connected Bluetooth headsets and the SCO link to one of them.
///
/// Headsets are kept most recently connected first. A headset whose SCO link could not
/// be established is remembered as failed until it reconnects or is explicitly
/// re-selected, so automatic selection can skip it.
pub struct BluetoothHeadsetTracker<B: BluetoothHeadsetInterface> {
    bluetooth: B,
    logger: Logger,
    listening: bool,
    headsets: Vec<AudioDevice>,
    sco: ScoState,
    activation_errors: HashSet<String>,
    sco_timeout: Duration,
}

impl<B: BluetoothHeadsetInterface> BluetoothHeadsetTracker<B> {
    pub fn new(bluetooth: B, sco_timeout: Duration, logger: Logger) -> Self {
        Self {
            bluetooth,
            logger,
            listening: false,
            headsets: Vec::new(),
            sco: ScoState::Idle,
            activation_errors: HashSet::new(),
            sco_timeout,
        }
    }

    /// Begin listening for headset events. A no-op while already listening.
    pub fn start(&mut self, callback: BluetoothCallback) -> Result<()> {
        if self.listening {
            log_debug!(self.logger, "Bluetooth tracker already listening");
            return Ok(());
        }

        if !self.bluetooth.is_adapter_available() {
            return Err(SwitchError::HardwareUnavailable(
                "Bluetooth is not supported on this device".to_string(),
            ));
        }

        self.bluetooth
            .start_listening(callback)
            .map_err(|e| SwitchError::HardwareUnavailable(e.to_string()))?;
        self.listening = true;
        log_info!(self.logger, "Bluetooth headset tracking started");
        Ok(())
    }

    /// Stop listening, release any SCO link and forget every headset.
    pub fn stop(&mut self) {
        if !self.listening {
            return;
        }

        self.deactivate();
        self.bluetooth.stop_listening();
        self.listening = false;
        self.headsets.clear();
        self.activation_errors.clear();
        log_info!(self.logger, "Bluetooth headset tracking stopped");
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Connected headsets, most recently connected first
    pub fn headsets(&self) -> &[AudioDevice] {
        &self.headsets
    }

    pub fn sco_state(&self) -> &ScoState {
        &self.sco
    }

    pub fn has_activation_error(&self, address: &str) -> bool {
        self.activation_errors.contains(address)
    }

    pub fn activation_errors(&self) -> &HashSet<String> {
        &self.activation_errors
    }

    pub fn clear_activation_error(&mut self, address: &str) {
        self.activation_errors.remove(address);
    }

    fn find(&self, address: &str) -> Option<&AudioDevice> {
        self.headsets
            .iter()
            .find(|device| device.address() == Some(address))
    }

    /// Apply a platform event and describe it for the application.
    ///
    /// Returns `None` for events about headsets the tracker does not know.
    pub fn handle_event(&mut self, event: BluetoothEvent) -> Option<BluetoothHeadsetEvent> {
        match event {
            BluetoothEvent::Connected { address, name } => {
                let device = AudioDevice::bluetooth_headset(name, address.clone());
                log_debug!(self.logger, device = %device, "Bluetooth headset connected");
                self.headsets
                    .retain(|existing| existing.address() != Some(address.as_str()));
                self.headsets.insert(0, device.clone());
                self.activation_errors.remove(&address);
                Some(BluetoothHeadsetEvent::Connected(device))
            }
            BluetoothEvent::Disconnected { address } => {
                let device = self.find(&address).cloned()?;
                log_debug!(self.logger, device = %device, "Bluetooth headset disconnected");
                self.headsets
                    .retain(|existing| existing.address() != Some(address.as_str()));
                self.activation_errors.remove(&address);
                if self.sco_address() == Some(address.as_str()) {
                    self.sco = ScoState::Idle;
                }
                Some(BluetoothHeadsetEvent::Disconnected(device))
            }
            BluetoothEvent::AudioConnected { address } => {
                let device = self.find(&address).cloned()?;
                log_debug!(self.logger, device = %device, "Bluetooth audio connected");
                self.sco = ScoState::Active { address };
                Some(BluetoothHeadsetEvent::AudioConnected(device))
            }
            BluetoothEvent::AudioDisconnected { address } => {
                let device = self.find(&address).cloned()?;
                log_debug!(self.logger, device = %device, "Bluetooth audio disconnected");
                if matches!(&self.sco, ScoState::Active { address: active } if *active == address)
                {
                    self.sco = ScoState::Idle;
                }
                Some(BluetoothHeadsetEvent::AudioDisconnected(device))
            }
            BluetoothEvent::AudioActivationFailed { address } => {
                let device = self.find(&address).cloned()?;
                self.mark_activation_error(&address);
                Some(BluetoothHeadsetEvent::ActivationError(device))
            }
        }
    }

    fn sco_address(&self) -> Option<&str> {
        match &self.sco {
            ScoState::Idle => None,
            ScoState::Activating { address, .. } | ScoState::Active { address } => Some(address),
        }
    }

    fn mark_activation_error(&mut self, address: &str) {
        log_warn!(self.logger, address, "Bluetooth SCO activation failed");
        self.activation_errors.insert(address.to_string());
        if self.sco_address() == Some(address) {
            self.sco = ScoState::Idle;
        }
    }

    /// Open the SCO link to `device`, closing any link to a different headset first.
    pub fn activate(&mut self, device: &AudioDevice, now: Instant) -> Result<()> {
        let Some(address) = device.address() else {
            return Ok(());
        };

        if self.sco_address() == Some(address) {
            log_debug!(self.logger, address, "SCO already active or activating");
            return Ok(());
        }
        if self.find(address).is_none() {
            log_warn!(self.logger, address, "Cannot activate a disconnected headset");
            return Err(SwitchError::ScoActivationFailed(address.to_string()));
        }
        if self.sco != ScoState::Idle {
            self.deactivate();
        }

        log_debug!(self.logger, address, "Attempting to enable Bluetooth SCO");
        match self.bluetooth.enable_sco(address) {
            Ok(()) => {
                self.sco = ScoState::Activating {
                    address: address.to_string(),
                    since: now,
                };
                Ok(())
            }
            Err(e) => {
                log_error!(self.logger, address, error = %e, "Platform rejected SCO request");
                self.mark_activation_error(address);
                Err(SwitchError::ScoActivationFailed(address.to_string()))
            }
        }
    }

    /// Close the SCO link if one is open or opening.
    pub fn deactivate(&mut self) {
        if self.sco == ScoState::Idle {
            return;
        }
        log_debug!(self.logger, "Attempting to disable Bluetooth SCO");
        self.bluetooth.disable_sco();
        self.sco = ScoState::Idle;
    }

    /// When the pending SCO request times out
    pub fn sco_deadline(&self) -> Option<Instant> {
        match &self.sco {
            ScoState::Activating { since, .. } => Some(*since + self.sco_timeout),
            _ => None,
        }
    }

    /// Fail a pending SCO request whose deadline has passed.
    pub fn check_sco_timeout(&mut self, now: Instant) -> Option<BluetoothHeadsetEvent> {
        let deadline = self.sco_deadline()?;
        if now < deadline {
            return None;
        }

        let address = self.sco_address()?.to_string();
        log_warn!(self.logger, address = %address, "Timed out waiting for Bluetooth SCO");
        self.bluetooth.disable_sco();
        self.mark_activation_error(&address);
        let device = self.find(&address).cloned()?;
        Some(BluetoothHeadsetEvent::ActivationError(device))
    }
}
