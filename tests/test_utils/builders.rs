//! Builders for switches running on the simulated platform.
//!
//! Individual methods may not be used by all tests, so dead code warnings are suppressed.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use audio_route_switch::audio::{AudioDevice, DeviceKind};
use audio_route_switch::notifications::{AudioDeviceChangeListener, BluetoothHeadsetEvent};
use audio_route_switch::system::{Permission, PlatformCommand, SimulatedPlatform};
use audio_route_switch::{SimulatedAudioSwitch, SwitchConfig};

/// One `(available, selected)` pair delivered to the device change listener
pub type Notification = (Vec<AudioDevice>, Option<AudioDevice>);

/// Device change listener that records every notification
#[derive(Clone, Default)]
pub struct RecordingListener {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener(&self) -> AudioDeviceChangeListener {
        let seen = Arc::clone(&self.seen);
        Box::new(move |devices, selected| {
            seen.lock()
                .unwrap()
                .push((devices.to_vec(), selected.cloned()));
        })
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen.lock().unwrap().last().cloned()
    }

    pub fn selections(&self) -> Vec<Option<AudioDevice>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(_, selected)| selected.clone())
            .collect()
    }
}

/// Bluetooth headset listener that records every event
#[derive(Clone, Default)]
pub struct RecordingBluetoothListener {
    events: Arc<Mutex<Vec<BluetoothHeadsetEvent>>>,
}

impl RecordingBluetoothListener {
    pub fn events(&self) -> Vec<BluetoothHeadsetEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn install(&self, switch: &mut SimulatedAudioSwitch) {
        let events = Arc::clone(&self.events);
        switch.set_bluetooth_listener(Some(Box::new(move |event| {
            events.lock().unwrap().push(event.clone());
        })));
    }
}

/// A simulated handset, the switch running on it and a recording listener
pub struct TestSession {
    pub platform: SimulatedPlatform,
    pub switch: SimulatedAudioSwitch,
    pub listener: RecordingListener,
}

impl TestSession {
    /// Start the switch with the recording listener.
    pub fn start(&mut self) {
        self.switch.start(Some(self.listener.listener()));
    }

    /// Pump queued platform callbacks.
    pub fn pump(&mut self) {
        self.switch.process_pending_events();
    }

    pub fn selected(&self) -> Option<AudioDevice> {
        self.switch.selected_audio_device().cloned()
    }

    pub fn available(&self) -> Vec<AudioDevice> {
        self.switch.available_audio_devices().to_vec()
    }

    pub fn commands(&self) -> Vec<PlatformCommand> {
        self.platform.log.commands()
    }

    /// Drop recorded platform commands and return them
    pub fn take_commands(&self) -> Vec<PlatformCommand> {
        self.platform.log.take()
    }
}

/// Builder for [`TestSession`]
pub struct SessionBuilder {
    preferred: Vec<DeviceKind>,
    has_earpiece: bool,
    permission_granted: bool,
    adapter_available: bool,
    auto_connect_audio: bool,
    grant_focus: bool,
    manage_audio_mode: bool,
    sco_timeout: Duration,
    bluetooth: Vec<(String, String)>,
    wired: Option<String>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            preferred: Vec::new(),
            has_earpiece: true,
            permission_granted: true,
            adapter_available: true,
            auto_connect_audio: true,
            grant_focus: true,
            manage_audio_mode: true,
            sco_timeout: Duration::from_secs(5),
            bluetooth: Vec::new(),
            wired: None,
        }
    }

    pub fn preferred(mut self, kinds: &[DeviceKind]) -> Self {
        self.preferred = kinds.to_vec();
        self
    }

    pub fn without_earpiece(mut self) -> Self {
        self.has_earpiece = false;
        self
    }

    pub fn permission_denied(mut self) -> Self {
        self.permission_granted = false;
        self
    }

    pub fn without_bluetooth_adapter(mut self) -> Self {
        self.adapter_available = false;
        self
    }

    /// Headsets do not answer SCO requests on their own
    pub fn manual_sco(mut self) -> Self {
        self.auto_connect_audio = false;
        self
    }

    pub fn focus_denied(mut self) -> Self {
        self.grant_focus = false;
        self
    }

    pub fn without_audio_mode_management(mut self) -> Self {
        self.manage_audio_mode = false;
        self
    }

    pub fn sco_timeout(mut self, timeout: Duration) -> Self {
        self.sco_timeout = timeout;
        self
    }

    /// A headset that is already connected when the switch starts
    pub fn bluetooth_headset(mut self, name: &str, address: &str) -> Self {
        self.bluetooth.push((name.to_string(), address.to_string()));
        self
    }

    /// A wired headset that is already plugged in when the switch starts
    pub fn wired_headset(mut self, name: &str) -> Self {
        self.wired = Some(name.to_string());
        self
    }

    pub fn build(self) -> TestSession {
        let platform = SimulatedPlatform::new();
        platform.audio.set_has_earpiece(self.has_earpiece);
        platform.audio.set_grant_focus(self.grant_focus);
        platform
            .bluetooth
            .set_adapter_available(self.adapter_available);
        platform
            .bluetooth
            .set_auto_connect_audio(self.auto_connect_audio);
        if !self.permission_granted {
            platform.permissions.revoke(Permission::BluetoothConnect);
        }
        for (name, address) in &self.bluetooth {
            platform.bluetooth.connect(name, address);
        }
        if let Some(name) = &self.wired {
            platform.wired.plug(name);
        }

        let config = SwitchConfig {
            sco_timeout: self.sco_timeout,
            manage_audio_mode: self.manage_audio_mode,
            ..SwitchConfig::with_preferred_devices(&self.preferred).unwrap()
        };
        let switch = SimulatedAudioSwitch::simulated(&platform, config);

        TestSession {
            platform,
            switch,
            listener: RecordingListener::new(),
        }
    }

    /// Build and start
    pub fn started(self) -> TestSession {
        let mut session = self.build();
        session.start();
        session
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn headset(name: &str, address: &str) -> AudioDevice {
    AudioDevice::bluetooth_headset(name, address)
}
