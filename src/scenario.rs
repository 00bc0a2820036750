//! Scripted sessions over the simulated platform.
//!
//! A scenario is a TOML document describing the simulated handset and a list of steps:
//!
//! ```toml
//! [platform]
//! has_earpiece = true
//!
//! [[step]]
//! action = "start"
//!
//! [[step]]
//! action = "bluetooth_connect"
//! name = "MyHeadset"
//! address = "AA:BB"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::audio::{AudioDevice, DeviceKind};
use crate::notifications::BluetoothHeadsetEvent;
use crate::switch::{SimulatedAudioSwitch, SwitchConfig};
use crate::system::{Permission, PlatformCommand, SimulatedPlatform};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub platform: PlatformSetup,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// Initial state of the simulated handset
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformSetup {
    pub has_earpiece: bool,
    pub bluetooth_adapter: bool,
    pub bluetooth_permission: bool,
    /// Headsets answer SCO requests immediately
    pub auto_connect_audio: bool,
    pub grant_focus: bool,
}

impl Default for PlatformSetup {
    fn default() -> Self {
        Self {
            has_earpiece: true,
            bluetooth_adapter: true,
            bluetooth_permission: true,
            auto_connect_audio: true,
            grant_focus: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Start,
    Stop,
    Activate,
    Deactivate,
    /// Select the first available device of `kind`, optionally a specific headset
    Select {
        kind: DeviceKind,
        #[serde(default)]
        address: Option<String>,
    },
    ClearSelection,
    BluetoothConnect {
        name: String,
        address: String,
    },
    BluetoothDisconnect {
        address: String,
    },
    BluetoothAudioConnected {
        address: String,
    },
    BluetoothAudioFailed {
        address: String,
    },
    WiredPlug {
        #[serde(default)]
        name: String,
    },
    WiredUnplug,
    GrantPermission,
    RevokePermission,
    HostResumed,
    /// Keep pumping events for `ms` milliseconds
    Wait {
        ms: u64,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Start => write!(f, "start"),
            Step::Stop => write!(f, "stop"),
            Step::Activate => write!(f, "activate"),
            Step::Deactivate => write!(f, "deactivate"),
            Step::Select { kind, address } => match address {
                Some(address) => write!(f, "select {kind} {address}"),
                None => write!(f, "select {kind}"),
            },
            Step::ClearSelection => write!(f, "clear selection"),
            Step::BluetoothConnect { name, address } => {
                write!(f, "bluetooth connect {name} ({address})")
            }
            Step::BluetoothDisconnect { address } => write!(f, "bluetooth disconnect {address}"),
            Step::BluetoothAudioConnected { address } => {
                write!(f, "bluetooth audio connected {address}")
            }
            Step::BluetoothAudioFailed { address } => write!(f, "bluetooth audio failed {address}"),
            Step::WiredPlug { name } => write!(f, "wired plug {name}"),
            Step::WiredUnplug => write!(f, "wired unplug"),
            Step::GrantPermission => write!(f, "grant bluetooth permission"),
            Step::RevokePermission => write!(f, "revoke bluetooth permission"),
            Step::HostResumed => write!(f, "host resumed"),
            Step::Wait { ms } => write!(f, "wait {ms}ms"),
        }
    }
}

/// Everything observable that happened while running a scenario, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Step(Step),
    DevicesChanged {
        available: Vec<AudioDevice>,
        selected: Option<AudioDevice>,
    },
    Bluetooth(BluetoothHeadsetEvent),
    Command(PlatformCommand),
    Rejected(String),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Step(step) => write!(f, "> {step}"),
            Output::DevicesChanged {
                available,
                selected,
            } => {
                let names: Vec<&str> = available.iter().map(AudioDevice::name).collect();
                let selected = selected.as_ref().map(AudioDevice::name).unwrap_or("none");
                write!(f, "  devices [{}], selected {selected}", names.join(", "))
            }
            Output::Bluetooth(event) => write!(f, "  bluetooth: {event}"),
            Output::Command(command) => write!(f, "  platform {command}"),
            Output::Rejected(reason) => write!(f, "  rejected: {reason}"),
        }
    }
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse scenario")
    }

    /// Run every step against a fresh simulated platform.
    pub async fn run(&self, config: SwitchConfig) -> Result<Vec<Output>> {
        let platform = SimulatedPlatform::new();
        platform.audio.set_has_earpiece(self.platform.has_earpiece);
        platform.audio.set_grant_focus(self.platform.grant_focus);
        platform
            .bluetooth
            .set_adapter_available(self.platform.bluetooth_adapter);
        platform
            .bluetooth
            .set_auto_connect_audio(self.platform.auto_connect_audio);
        if !self.platform.bluetooth_permission {
            platform.permissions.revoke(Permission::BluetoothConnect);
        }

        let outputs = Arc::new(Mutex::new(Vec::new()));
        let mut switch = SimulatedAudioSwitch::simulated(&platform, config);
        let sink = Arc::clone(&outputs);
        switch.set_bluetooth_listener(Some(Box::new(move |event| {
            sink.lock()
                .unwrap()
                .push(Output::Bluetooth(event.clone()));
        })));

        for step in &self.steps {
            outputs.lock().unwrap().push(Output::Step(step.clone()));
            run_step(&mut switch, &platform, step, &outputs).await;
            let commands = platform.log.take();
            outputs
                .lock()
                .unwrap()
                .extend(commands.into_iter().map(Output::Command));
        }

        drop(switch);
        let mut outputs = outputs.lock().unwrap().clone();
        outputs.extend(platform.log.take().into_iter().map(Output::Command));
        Ok(outputs)
    }
}

async fn run_step(
    switch: &mut SimulatedAudioSwitch,
    platform: &SimulatedPlatform,
    step: &Step,
    outputs: &Arc<Mutex<Vec<Output>>>,
) {
    match step {
        Step::Start => {
            let sink = Arc::clone(outputs);
            switch.start(Some(Box::new(move |available, selected| {
                sink.lock().unwrap().push(Output::DevicesChanged {
                    available: available.to_vec(),
                    selected: selected.cloned(),
                });
            })));
        }
        Step::Stop => switch.stop(),
        Step::Activate => {
            if let Err(e) = switch.activate() {
                outputs.lock().unwrap().push(Output::Rejected(e.to_string()));
            }
        }
        Step::Deactivate => switch.deactivate(),
        Step::Select { kind, address } => {
            let device = switch
                .available_audio_devices()
                .iter()
                .find(|device| {
                    device.kind() == *kind
                        && address
                            .as_deref()
                            .is_none_or(|address| device.address() == Some(address))
                })
                .cloned();
            match device {
                Some(device) => switch.select_device(&device),
                None => outputs
                    .lock()
                    .unwrap()
                    .push(Output::Rejected(format!("no available {kind}"))),
            }
        }
        Step::ClearSelection => switch.clear_selection(),
        Step::BluetoothConnect { name, address } => platform.bluetooth.connect(name, address),
        Step::BluetoothDisconnect { address } => platform.bluetooth.disconnect(address),
        Step::BluetoothAudioConnected { address } => platform.bluetooth.audio_connected(address),
        Step::BluetoothAudioFailed { address } => {
            platform.bluetooth.audio_activation_failed(address)
        }
        Step::WiredPlug { name } => platform.wired.plug(name),
        Step::WiredUnplug => platform.wired.unplug(),
        Step::GrantPermission => platform.permissions.grant(Permission::BluetoothConnect),
        Step::RevokePermission => platform.permissions.revoke(Permission::BluetoothConnect),
        Step::HostResumed => switch.on_host_resumed(),
        Step::Wait { ms } => {
            let deadline = Instant::now() + Duration::from_millis(*ms);
            while tokio::time::timeout_at(deadline, switch.next_event())
                .await
                .is_ok()
            {}
        }
    }
    switch.process_pending_events();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selections(outputs: &[Output]) -> Vec<Option<String>> {
        outputs
            .iter()
            .filter_map(|output| match output {
                Output::DevicesChanged { selected, .. } => {
                    Some(selected.as_ref().map(|d| d.name().to_string()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_steps() {
        let scenario = Scenario::from_toml(
            r#"
[platform]
has_earpiece = false

[[step]]
action = "start"

[[step]]
action = "select"
kind = "speakerphone"

[[step]]
action = "wait"
ms = 10
"#,
        )
        .unwrap();

        assert!(!scenario.platform.has_earpiece);
        assert!(scenario.platform.grant_focus);
        assert_eq!(
            scenario.steps,
            vec![
                Step::Start,
                Step::Select {
                    kind: DeviceKind::Speakerphone,
                    address: None
                },
                Step::Wait { ms: 10 },
            ]
        );
    }

    #[test]
    fn test_unknown_action_is_an_error() {
        assert!(Scenario::from_toml("[[step]]\naction = \"explode\"\n").is_err());
    }

    #[tokio::test]
    async fn test_bluetooth_connect_and_disconnect() {
        let scenario = Scenario {
            platform: PlatformSetup::default(),
            steps: vec![
                Step::Start,
                Step::BluetoothConnect {
                    name: "MyHeadset".to_string(),
                    address: "AA:BB".to_string(),
                },
                Step::BluetoothDisconnect {
                    address: "AA:BB".to_string(),
                },
            ],
        };

        let outputs = scenario.run(SwitchConfig::default()).await.unwrap();

        assert_eq!(
            selections(&outputs),
            vec![
                Some("Earpiece".to_string()),
                Some("MyHeadset".to_string()),
                Some("Earpiece".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_activate_before_start_is_reported() {
        let scenario = Scenario {
            platform: PlatformSetup::default(),
            steps: vec![Step::Activate],
        };

        let outputs = scenario.run(SwitchConfig::default()).await.unwrap();

        assert!(outputs
            .iter()
            .any(|output| matches!(output, Output::Rejected(_))));
    }

    #[tokio::test]
    async fn test_wait_times_out_pending_sco() {
        let scenario = Scenario {
            platform: PlatformSetup {
                auto_connect_audio: false,
                ..PlatformSetup::default()
            },
            steps: vec![
                Step::BluetoothConnect {
                    name: "MyHeadset".to_string(),
                    address: "AA:BB".to_string(),
                },
                Step::Start,
                Step::Activate,
                Step::Wait { ms: 100 },
            ],
        };
        let config = SwitchConfig {
            sco_timeout: Duration::from_millis(20),
            ..SwitchConfig::default()
        };

        let outputs = scenario.run(config).await.unwrap();

        assert!(outputs.iter().any(|output| matches!(
            output,
            Output::Bluetooth(BluetoothHeadsetEvent::ActivationError(_))
        )));
        assert_eq!(selections(&outputs).last(), Some(&Some("Earpiece".to_string())));
    }
}
