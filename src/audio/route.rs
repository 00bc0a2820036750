use std::time::Instant;

use crate::error::{Result, SwitchError};
use crate::logging::Logger;
use crate::system::{
    AudioManagerInterface, AudioMode, AudioState, BluetoothHeadsetInterface, FocusChangeListener,
};

use super::bluetooth::BluetoothHeadsetTracker;
use super::device::AudioDevice;

/// Applies routing decisions to the platform audio manager.
///
/// Holds audio focus and the routed device while a session is activated. Nothing is sent
/// to the platform unless [`activate`](Self::activate) succeeded first.
pub struct RouteController<M: AudioManagerInterface> {
    audio: M,
    logger: Logger,
    manage_audio_mode: bool,
    focus_listener: Option<FocusChangeListener>,
    saved_state: Option<AudioState>,
    activated: bool,
    focus_held: bool,
    routed: Option<AudioDevice>,
}

impl<M: AudioManagerInterface> RouteController<M> {
    pub fn new(audio: M, manage_audio_mode: bool, logger: Logger) -> Self {
        Self {
            audio,
            logger,
            manage_audio_mode,
            focus_listener: None,
            saved_state: None,
            activated: false,
            focus_held: false,
            routed: None,
        }
    }

    pub fn has_earpiece(&self) -> bool {
        self.audio.has_earpiece()
    }

    /// Listener passed along with the next focus request
    pub fn set_focus_listener(&mut self, listener: Option<FocusChangeListener>) {
        self.focus_listener = listener;
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn has_focus(&self) -> bool {
        self.focus_held
    }

    /// Whether device commands are currently sent to the platform
    pub fn is_routing(&self) -> bool {
        self.activated && self.focus_held
    }

    pub fn routed(&self) -> Option<&AudioDevice> {
        self.routed.as_ref()
    }

    /// Prepare the platform for a call and take audio focus.
    ///
    /// The audio state is cached on the first call only. Repeated calls retry a focus
    /// request that was previously declined.
    pub fn activate(&mut self) -> Result<()> {
        if !self.activated {
            if self.manage_audio_mode {
                let state = self.audio.audio_state();
                log_debug!(self.logger, state = ?state, "Caching audio state");
                self.saved_state = Some(state);
                self.audio.set_mode(AudioMode::InCommunication);
                self.audio.set_microphone_mute(false);
                self.audio.set_speakerphone_on(false);
            }
            self.activated = true;
        }

        if !self.focus_held {
            self.focus_held = self.audio.request_focus(self.focus_listener.clone());
            if !self.focus_held {
                log_warn!(self.logger, "Audio focus request was declined");
                return Err(SwitchError::FocusRequestFailed);
            }
            log_debug!(self.logger, "Audio focus granted");
        }
        Ok(())
    }

    /// Move audio from the routed device to `device`.
    ///
    /// Issues at most one disable command for the old device and one enable command for
    /// the new one. A no-op unless routing is active or when `device` is already routed.
    pub fn route_to<B: BluetoothHeadsetInterface>(
        &mut self,
        device: Option<&AudioDevice>,
        bluetooth: Option<&mut BluetoothHeadsetTracker<B>>,
        now: Instant,
    ) -> Result<()> {
        if !self.is_routing() || self.routed.as_ref() == device {
            return Ok(());
        }

        let mut bluetooth = bluetooth;
        if let Some(old) = self.routed.take() {
            log_debug!(self.logger, device = %old, "Disabling audio device");
            match old {
                AudioDevice::BluetoothHeadset { .. } => {
                    // Switching between headsets is handled by the tracker itself
                    if !device.is_some_and(AudioDevice::is_bluetooth) {
                        if let Some(tracker) = bluetooth.as_deref_mut() {
                            tracker.deactivate();
                        }
                    }
                }
                AudioDevice::Speakerphone => self.audio.set_speakerphone_on(false),
                AudioDevice::Earpiece | AudioDevice::WiredHeadset { .. } => {}
            }
        }

        let Some(device) = device else {
            return Ok(());
        };
        log_info!(self.logger, device = %device, "Routing audio");
        match device {
            AudioDevice::BluetoothHeadset { .. } => match bluetooth {
                Some(tracker) => tracker.activate(device, now)?,
                None => {
                    return Err(SwitchError::ScoActivationFailed(
                        device.address().unwrap_or_default().to_string(),
                    ));
                }
            },
            AudioDevice::Speakerphone => self.audio.set_speakerphone_on(true),
            AudioDevice::Earpiece | AudioDevice::WiredHeadset { .. } => {}
        }
        self.routed = Some(device.clone());
        Ok(())
    }

    /// Forget that `device` is routed after its link dropped on the platform side, so
    /// the next [`route_to`](Self::route_to) enables it again. Returns whether it was routed.
    pub fn release_link(&mut self, device: &AudioDevice) -> bool {
        if self.routed.as_ref() != Some(device) {
            return false;
        }
        self.routed = None;
        true
    }

    /// Release the routed device and audio focus, then restore the cached audio state.
    pub fn deactivate<B: BluetoothHeadsetInterface>(
        &mut self,
        bluetooth: Option<&mut BluetoothHeadsetTracker<B>>,
    ) {
        if !self.activated {
            return;
        }

        match self.routed.take() {
            Some(AudioDevice::BluetoothHeadset { .. }) => {
                if let Some(tracker) = bluetooth {
                    tracker.deactivate();
                }
            }
            Some(AudioDevice::Speakerphone) => self.audio.set_speakerphone_on(false),
            _ => {}
        }

        if self.focus_held {
            self.audio.abandon_focus();
            self.focus_held = false;
        }

        if let Some(state) = self.saved_state.take() {
            log_debug!(self.logger, state = ?state, "Restoring audio state");
            self.audio.set_mode(state.mode);
            self.audio.set_speakerphone_on(state.speakerphone_on);
            self.audio.set_microphone_mute(state.microphone_muted);
        }
        self.activated = false;
    }
}
