use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::system::{FileSystemInterface, StandardFileSystem};

use super::types::Config;

/// Loads and saves the TOML configuration through an injected file system
pub struct ConfigLoader<F: FileSystemInterface> {
    file_system: F,
    config_path: PathBuf,
}

impl<F: FileSystemInterface> ConfigLoader<F> {
    pub fn new(file_system: F, config_path: PathBuf) -> Self {
        Self {
            file_system,
            config_path,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.file_system.config_file_exists(&self.config_path)
    }

    /// Load the configuration, writing out the defaults if there is no file yet.
    pub fn load_config(&self) -> Result<Config> {
        debug!(path = %self.config_path.display(), "Loading configuration");

        if !self.config_exists() {
            info!("Configuration file not found, using defaults");
            return Ok(self.create_default_config());
        }

        let content = self
            .file_system
            .read_config_file(&self.config_path)
            .with_context(|| {
                format!(
                    "Failed to read configuration file: {}",
                    self.config_path.display()
                )
            })?;

        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse configuration file: {}",
                self.config_path.display()
            )
        })?;
        Ok(config)
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            self.file_system.create_config_dir(parent)?;
        }

        let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
        self.file_system
            .write_config_file(&self.config_path, &content)?;

        info!(path = %self.config_path.display(), "Configuration saved");
        Ok(())
    }

    /// Defaults, saved best-effort so the user has a file to edit
    fn create_default_config(&self) -> Config {
        let config = Config::default();
        if let Err(e) = self.save_config(&config) {
            warn!(
                path = %self.config_path.display(),
                error = %e,
                "Could not save default configuration"
            );
        }
        config
    }
}

impl ConfigLoader<StandardFileSystem> {
    /// A loader for `path`, or for the default location when `path` is `None`
    pub fn from_path(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };
        Ok(Self::new(StandardFileSystem, config_path))
    }

    /// `~/.config/audio-route-switch/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home_dir.join(".config/audio-route-switch/config.toml"))
    }
}
