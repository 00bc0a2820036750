use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Emit a `tracing` event only when the given [`Logger`] is enabled.
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        if $logger.is_enabled() {
            ::tracing::debug!($($arg)+);
        }
    };
}

macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        if $logger.is_enabled() {
            ::tracing::info!($($arg)+);
        }
    };
}

macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        if $logger.is_enabled() {
            ::tracing::warn!($($arg)+);
        }
    };
}

macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        if $logger.is_enabled() {
            ::tracing::error!($($arg)+);
        }
    };
}

/// Shared logging switch for one audio switch instance and all of its components.
///
/// Cloning is cheap; every clone observes the same flag, so toggling
/// [`AudioSwitch::set_logging_enabled`](crate::AudioSwitch::set_logging_enabled)
/// takes effect in the trackers and route controller immediately.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    enabled: Arc<AtomicBool>,
}

impl Logger {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

/// Subscriber configuration for the command line tool
pub struct LoggingConfig {
    pub level: Level,
    pub file_output: bool,
    pub console_output: bool,
    pub log_dir: Option<PathBuf>,
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_output: false,
            console_output: true,
            log_dir: None,
            json_format: false,
        }
    }
}

/// Install the global subscriber: console output plus an optional daily-rotated log file.
///
/// The returned guard must be kept alive for the file writer to flush.
pub fn initialize_logging(config: LoggingConfig) -> Result<(Option<WorkerGuard>, Option<PathBuf>)> {
    let mut layers = Vec::new();
    let mut guard = None;

    let env_filter = EnvFilter::new(format!(
        "audio_route_switch={}",
        config.level.as_str().to_lowercase()
    ));

    if config.console_output {
        let console_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .boxed()
        } else {
            fmt::layer().with_target(true).with_thread_ids(false).boxed()
        };
        layers.push(console_layer);
    }

    let log_dir = if config.file_output {
        let dir = match config.log_dir.clone() {
            Some(dir) => dir,
            None => get_default_log_dir()?,
        };
        std::fs::create_dir_all(&dir)?;

        let file_appender = tracing_appender::rolling::daily(&dir, "audio-route-switch.log");
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_file(true)
                .with_line_number(true)
                .with_writer(non_blocking)
                .boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(non_blocking)
                .boxed()
        };
        layers.push(file_layer);

        Some(dir)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .init();

    Ok((guard, log_dir))
}

/// Get the default log directory path
pub fn get_default_log_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;
    Ok(home_dir.join(".local/share/audio-route-switch/logs"))
}
