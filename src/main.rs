use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{Level, info};

use audio_route_switch::config::ConfigLoader;
use audio_route_switch::logging::{LoggingConfig, initialize_logging};
use audio_route_switch::scenario::Scenario;
use audio_route_switch::{Config, VERSION};

#[derive(Parser)]
#[command(name = "audio-route-switch")]
#[command(about = "Audio route manager with priority-based device selection")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session against the simulated platform
    Simulate {
        /// Scenario file (TOML)
        scenario: PathBuf,
    },
    /// Validate the configuration file
    CheckConfig,
    /// Show the effective device priority order
    ShowOrder,
    /// Print the library version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = ConfigLoader::from_path(cli.config.clone())?;
    let config = loader.load_config()?;

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.log_level()?
    };
    let _guard = initialize_logging(LoggingConfig {
        level,
        json_format: cli.json_logs,
        ..LoggingConfig::default()
    })?;

    match cli.command {
        Commands::Simulate { scenario } => simulate(&config, &scenario, cli.verbose).await,
        Commands::CheckConfig => check_config(&config, loader.config_path()),
        Commands::ShowOrder => show_order(&config),
        Commands::Version => {
            println!("{VERSION}");
            Ok(())
        }
    }
}

async fn simulate(config: &Config, path: &Path, verbose: bool) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    let scenario = Scenario::from_toml(&content)?;

    let mut switch_config = config.switch_config()?;
    // --verbose also turns on the switch's own logs
    switch_config.logging_enabled |= verbose;

    info!(steps = scenario.steps.len(), "Running scenario");
    for output in scenario.run(switch_config).await? {
        println!("{output}");
    }
    Ok(())
}

fn check_config(config: &Config, path: &Path) -> Result<()> {
    info!("Validating configuration");

    println!("Configuration: {}", path.display());
    config.log_level()?;
    let switch_config = config.switch_config()?;
    println!("  ✓ Log level: {}", config.general.log_level);
    println!("  ✓ Preferred order: {}", switch_config.preferred_order);
    println!("  ✓ SCO timeout: {}ms", switch_config.sco_timeout.as_millis());
    println!("  ✓ Manage audio mode: {}", switch_config.manage_audio_mode);
    Ok(())
}

fn show_order(config: &Config) -> Result<()> {
    let order = config.preferred_order()?;
    for (rank, kind) in order.kinds().iter().enumerate() {
        println!("  {}. {}", rank + 1, kind);
    }
    Ok(())
}
