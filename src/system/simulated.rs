//! In-process stand-ins for the platform collaborators.
//!
//! Every simulated collaborator records the commands it receives into a shared
//! [`PlatformLog`] and lets the caller inject hardware events. They back the
//! `simulate` command and the test suites.

use anyhow::Result;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::system::traits::{
    AudioManagerInterface, AudioMode, AudioState, BluetoothCallback, BluetoothEvent,
    BluetoothHeadsetInterface, FocusChange, FocusChangeListener, Permission, PermissionInterface,
    WiredCallback, WiredEvent, WiredHeadsetInterface,
};

/// A command the switch issued to the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCommand {
    StartBluetoothListening,
    StopBluetoothListening,
    EnableSco(String),
    DisableSco,
    RegisterWired,
    UnregisterWired,
    RequestFocus,
    AbandonFocus,
    SetSpeakerphone(bool),
    SetMicrophoneMute(bool),
    SetMode(AudioMode),
}

impl fmt::Display for PlatformCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformCommand::StartBluetoothListening => write!(f, "bluetooth: start listening"),
            PlatformCommand::StopBluetoothListening => write!(f, "bluetooth: stop listening"),
            PlatformCommand::EnableSco(address) => write!(f, "bluetooth: enable SCO {address}"),
            PlatformCommand::DisableSco => write!(f, "bluetooth: disable SCO"),
            PlatformCommand::RegisterWired => write!(f, "wired: register"),
            PlatformCommand::UnregisterWired => write!(f, "wired: unregister"),
            PlatformCommand::RequestFocus => write!(f, "audio: request focus"),
            PlatformCommand::AbandonFocus => write!(f, "audio: abandon focus"),
            PlatformCommand::SetSpeakerphone(on) => write!(f, "audio: speakerphone {on}"),
            PlatformCommand::SetMicrophoneMute(muted) => write!(f, "audio: microphone mute {muted}"),
            PlatformCommand::SetMode(mode) => write!(f, "audio: mode {mode:?}"),
        }
    }
}

/// Shared, ordered record of platform commands
#[derive(Debug, Clone, Default)]
pub struct PlatformLog {
    commands: Arc<Mutex<Vec<PlatformCommand>>>,
}

impl PlatformLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, command: PlatformCommand) {
        self.commands.lock().unwrap().push(command);
    }

    pub fn commands(&self) -> Vec<PlatformCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<PlatformCommand> {
        std::mem::take(&mut *self.commands.lock().unwrap())
    }

    pub fn count(&self, command: &PlatformCommand) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| *c == command)
            .count()
    }

    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }
}

struct BluetoothState {
    adapter_available: bool,
    connected: Vec<(String, String)>,
    auto_connect_audio: bool,
    fail_enable_sco: bool,
}

/// Simulated Bluetooth headset profile
#[derive(Clone)]
pub struct SimulatedBluetooth {
    state: Arc<Mutex<BluetoothState>>,
    callback: Arc<Mutex<Option<BluetoothCallback>>>,
    log: PlatformLog,
}

impl SimulatedBluetooth {
    pub fn new(log: PlatformLog) -> Self {
        Self {
            state: Arc::new(Mutex::new(BluetoothState {
                adapter_available: true,
                connected: Vec::new(),
                auto_connect_audio: true,
                fail_enable_sco: false,
            })),
            callback: Arc::new(Mutex::new(None)),
            log,
        }
    }

    /// Simulate a missing or disabled adapter
    pub fn set_adapter_available(&self, available: bool) {
        self.state.lock().unwrap().adapter_available = available;
    }

    /// When set, `enable_sco` immediately answers with `AudioConnected`
    pub fn set_auto_connect_audio(&self, enabled: bool) {
        self.state.lock().unwrap().auto_connect_audio = enabled;
    }

    /// Make `enable_sco` return an error
    pub fn set_enable_sco_failure(&self, should_fail: bool) {
        self.state.lock().unwrap().fail_enable_sco = should_fail;
    }

    pub fn is_listening(&self) -> bool {
        self.callback.lock().unwrap().is_some()
    }

    pub fn connect(&self, name: &str, address: &str) {
        {
            let mut state = self.state.lock().unwrap();
            state.connected.retain(|(a, _)| a != address);
            state.connected.push((address.to_string(), name.to_string()));
        }
        self.emit(BluetoothEvent::Connected {
            address: address.to_string(),
            name: name.to_string(),
        });
    }

    pub fn disconnect(&self, address: &str) {
        self.state
            .lock()
            .unwrap()
            .connected
            .retain(|(a, _)| a != address);
        self.emit(BluetoothEvent::Disconnected {
            address: address.to_string(),
        });
    }

    pub fn audio_connected(&self, address: &str) {
        self.emit(BluetoothEvent::AudioConnected {
            address: address.to_string(),
        });
    }

    pub fn audio_disconnected(&self, address: &str) {
        self.emit(BluetoothEvent::AudioDisconnected {
            address: address.to_string(),
        });
    }

    pub fn audio_activation_failed(&self, address: &str) {
        self.emit(BluetoothEvent::AudioActivationFailed {
            address: address.to_string(),
        });
    }

    /// Deliver an event to the registered callback, if any
    pub fn emit(&self, event: BluetoothEvent) {
        if let Some(callback) = self.callback.lock().unwrap().as_ref() {
            callback(event);
        }
    }
}

impl BluetoothHeadsetInterface for SimulatedBluetooth {
    fn is_adapter_available(&self) -> bool {
        self.state.lock().unwrap().adapter_available
    }

    fn start_listening(&self, callback: BluetoothCallback) -> Result<()> {
        self.log.record(PlatformCommand::StartBluetoothListening);
        let connected = self.state.lock().unwrap().connected.clone();
        *self.callback.lock().unwrap() = Some(callback);

        for (address, name) in connected {
            self.emit(BluetoothEvent::Connected { address, name });
        }
        Ok(())
    }

    fn stop_listening(&self) {
        self.log.record(PlatformCommand::StopBluetoothListening);
        *self.callback.lock().unwrap() = None;
    }

    fn enable_sco(&self, address: &str) -> Result<()> {
        self.log.record(PlatformCommand::EnableSco(address.to_string()));

        let (should_fail, auto_connect) = {
            let state = self.state.lock().unwrap();
            (state.fail_enable_sco, state.auto_connect_audio)
        };
        if should_fail {
            return Err(anyhow::anyhow!("Simulated SCO failure"));
        }
        if auto_connect {
            self.audio_connected(address);
        }
        Ok(())
    }

    fn disable_sco(&self) {
        self.log.record(PlatformCommand::DisableSco);
    }
}

/// Simulated wired headset plug broadcast
#[derive(Clone)]
pub struct SimulatedWiredHeadset {
    plugged: Arc<Mutex<Option<String>>>,
    callback: Arc<Mutex<Option<WiredCallback>>>,
    log: PlatformLog,
}

impl SimulatedWiredHeadset {
    pub fn new(log: PlatformLog) -> Self {
        Self {
            plugged: Arc::new(Mutex::new(None)),
            callback: Arc::new(Mutex::new(None)),
            log,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.callback.lock().unwrap().is_some()
    }

    pub fn plug(&self, name: &str) {
        *self.plugged.lock().unwrap() = Some(name.to_string());
        self.emit(WiredEvent::Plugged {
            name: name.to_string(),
        });
    }

    pub fn unplug(&self) {
        *self.plugged.lock().unwrap() = None;
        self.emit(WiredEvent::Unplugged);
    }

    pub fn emit(&self, event: WiredEvent) {
        if let Some(callback) = self.callback.lock().unwrap().as_ref() {
            callback(event);
        }
    }
}

impl WiredHeadsetInterface for SimulatedWiredHeadset {
    fn register(&self, callback: WiredCallback) -> Result<()> {
        self.log.record(PlatformCommand::RegisterWired);
        *self.callback.lock().unwrap() = Some(callback);
        Ok(())
    }

    fn unregister(&self) {
        self.log.record(PlatformCommand::UnregisterWired);
        *self.callback.lock().unwrap() = None;
    }

    fn plugged_headset(&self) -> Option<String> {
        self.plugged.lock().unwrap().clone()
    }
}

struct AudioManagerState {
    has_earpiece: bool,
    grant_focus: bool,
    focus_held: bool,
    focus_listener: Option<FocusChangeListener>,
    audio: AudioState,
}

/// Simulated platform audio manager
#[derive(Clone)]
pub struct SimulatedAudioManager {
    state: Arc<Mutex<AudioManagerState>>,
    log: PlatformLog,
}

impl SimulatedAudioManager {
    pub fn new(log: PlatformLog) -> Self {
        Self {
            state: Arc::new(Mutex::new(AudioManagerState {
                has_earpiece: true,
                grant_focus: true,
                focus_held: false,
                focus_listener: None,
                audio: AudioState::default(),
            })),
            log,
        }
    }

    /// Simulate a device without telephony hardware
    pub fn set_has_earpiece(&self, has_earpiece: bool) {
        self.state.lock().unwrap().has_earpiece = has_earpiece;
    }

    /// Make subsequent focus requests succeed or fail
    pub fn set_grant_focus(&self, grant: bool) {
        self.state.lock().unwrap().grant_focus = grant;
    }

    /// Overwrite the platform audio state, e.g. to test restoration
    pub fn set_audio_state(&self, audio: AudioState) {
        self.state.lock().unwrap().audio = audio;
    }

    pub fn is_focus_held(&self) -> bool {
        self.state.lock().unwrap().focus_held
    }

    /// Deliver a focus change to whoever requested focus
    pub fn change_focus(&self, change: FocusChange) {
        let listener = self.state.lock().unwrap().focus_listener.clone();
        if let Some(listener) = listener {
            listener(change);
        }
    }
}

impl AudioManagerInterface for SimulatedAudioManager {
    fn has_earpiece(&self) -> bool {
        self.state.lock().unwrap().has_earpiece
    }

    fn request_focus(&self, listener: Option<FocusChangeListener>) -> bool {
        self.log.record(PlatformCommand::RequestFocus);
        let mut state = self.state.lock().unwrap();
        if state.grant_focus {
            state.focus_held = true;
            state.focus_listener = listener;
        }
        state.grant_focus
    }

    fn abandon_focus(&self) {
        self.log.record(PlatformCommand::AbandonFocus);
        let mut state = self.state.lock().unwrap();
        state.focus_held = false;
        state.focus_listener = None;
    }

    fn set_speakerphone_on(&self, on: bool) {
        self.log.record(PlatformCommand::SetSpeakerphone(on));
        self.state.lock().unwrap().audio.speakerphone_on = on;
    }

    fn set_microphone_mute(&self, muted: bool) {
        self.log.record(PlatformCommand::SetMicrophoneMute(muted));
        self.state.lock().unwrap().audio.microphone_muted = muted;
    }

    fn set_mode(&self, mode: AudioMode) {
        self.log.record(PlatformCommand::SetMode(mode));
        self.state.lock().unwrap().audio.mode = mode;
    }

    fn audio_state(&self) -> AudioState {
        self.state.lock().unwrap().audio
    }
}

/// Simulated runtime permission store
#[derive(Clone, Default)]
pub struct SimulatedPermissions {
    granted: Arc<Mutex<HashSet<Permission>>>,
}

impl SimulatedPermissions {
    /// Permissions that start out granted
    pub fn granted() -> Self {
        let permissions = Self::default();
        permissions.grant(Permission::BluetoothConnect);
        permissions
    }

    pub fn denied() -> Self {
        Self::default()
    }

    pub fn grant(&self, permission: Permission) {
        self.granted.lock().unwrap().insert(permission);
    }

    pub fn revoke(&self, permission: Permission) {
        self.granted.lock().unwrap().remove(&permission);
    }
}

impl PermissionInterface for SimulatedPermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        self.granted.lock().unwrap().contains(&permission)
    }
}

/// One complete simulated handset sharing a single command log
#[derive(Clone)]
pub struct SimulatedPlatform {
    pub bluetooth: SimulatedBluetooth,
    pub wired: SimulatedWiredHeadset,
    pub audio: SimulatedAudioManager,
    pub permissions: SimulatedPermissions,
    pub log: PlatformLog,
}

impl SimulatedPlatform {
    /// A handset with earpiece, enabled Bluetooth adapter and granted permissions
    pub fn new() -> Self {
        let log = PlatformLog::new();
        Self {
            bluetooth: SimulatedBluetooth::new(log.clone()),
            wired: SimulatedWiredHeadset::new(log.clone()),
            audio: SimulatedAudioManager::new(log.clone()),
            permissions: SimulatedPermissions::granted(),
            log,
        }
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bluetooth_reports_existing_headsets_on_listen() {
        let bluetooth = SimulatedBluetooth::new(PlatformLog::new());
        bluetooth.connect("MyHeadset", "AA:BB");

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        bluetooth
            .start_listening(Box::new(move |event| sink.lock().unwrap().push(event)))
            .unwrap();

        assert_eq!(
            *received.lock().unwrap(),
            vec![BluetoothEvent::Connected {
                address: "AA:BB".to_string(),
                name: "MyHeadset".to_string(),
            }]
        );
    }

    #[test]
    fn test_events_are_dropped_when_not_listening() {
        let log = PlatformLog::new();
        let wired = SimulatedWiredHeadset::new(log.clone());
        wired.plug("Jack");

        assert!(!wired.is_registered());
        assert_eq!(wired.plugged_headset(), Some("Jack".to_string()));
        assert!(log.commands().is_empty());
    }

    #[test]
    fn test_focus_denial() {
        let log = PlatformLog::new();
        let audio = SimulatedAudioManager::new(log.clone());
        audio.set_grant_focus(false);

        assert!(!audio.request_focus(None));
        assert!(!audio.is_focus_held());
        assert_eq!(log.count(&PlatformCommand::RequestFocus), 1);
    }
}
