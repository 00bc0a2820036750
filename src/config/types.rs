use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

use crate::audio::DeviceKind;
use crate::error::SwitchError;
use crate::priority::PreferredOrder;
use crate::switch::{DEFAULT_SCO_TIMEOUT, SwitchConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub routing: RoutingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
    /// Turns on the switch's own log output
    pub logging_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Device kinds in priority order. Kinds left out keep their default relative order
    /// behind the listed ones.
    pub preferred_devices: Vec<String>,
    pub sco_timeout_ms: u64,
    pub manage_audio_mode: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            logging_enabled: false,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            preferred_devices: Vec::new(),
            sco_timeout_ms: DEFAULT_SCO_TIMEOUT.as_millis() as u64,
            manage_audio_mode: true,
        }
    }
}

impl Config {
    pub fn preferred_kinds(&self) -> Result<Vec<DeviceKind>, SwitchError> {
        self.routing
            .preferred_devices
            .iter()
            .map(|name| DeviceKind::from_str(name))
            .collect()
    }

    pub fn preferred_order(&self) -> Result<PreferredOrder, SwitchError> {
        PreferredOrder::new(&self.preferred_kinds()?)
    }

    /// Validate the routing section and build the settings for a new switch.
    pub fn switch_config(&self) -> Result<SwitchConfig, SwitchError> {
        Ok(SwitchConfig {
            preferred_order: self.preferred_order()?,
            sco_timeout: Duration::from_millis(self.routing.sco_timeout_ms),
            manage_audio_mode: self.routing.manage_audio_mode,
            logging_enabled: self.general.logging_enabled,
        })
    }

    pub fn log_level(&self) -> Result<Level> {
        Level::from_str(&self.general.log_level)
            .with_context(|| format!("Invalid log level '{}'", self.general.log_level))
    }
}
