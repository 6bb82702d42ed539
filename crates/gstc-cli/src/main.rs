#![deny(unsafe_code)]

//! gstc: command-line control plane for the GStreamer Daemon.

mod commands;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use gstc_config::AppConfig;
use gstc_core::GstdClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::{BusCommand, DebugCommand, ElementCommand, EventCommand, PipelineCommand, SignalCommand};

/// gstc — control GStreamer pipelines running inside gstd.
#[derive(Parser)]
#[command(name = "gstc", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "gstc.toml")]
    config: PathBuf,

    /// Daemon host, overriding the configuration.
    #[arg(long, global = true)]
    host: Option<String>,

    /// Daemon port, overriding the configuration.
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the daemon is reachable.
    Ping,

    /// Create, control and inspect pipelines.
    #[command(subcommand)]
    Pipeline(PipelineCommand),

    /// Read and write element properties, emit actions.
    #[command(subcommand)]
    Element(ElementCommand),

    /// Wait for element signals.
    #[command(subcommand)]
    Signal(SignalCommand),

    /// Configure and read a pipeline bus.
    #[command(subcommand)]
    Bus(BusCommand),

    /// Send events to a pipeline.
    #[command(subcommand)]
    Event(EventCommand),

    /// Control the daemon's debug output.
    #[command(subcommand)]
    Debug(DebugCommand),

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = read_config(&cli.config).await?;

    let filter = match cli.verbose {
        0 => loaded
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = loaded.unwrap_or_else(|| {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
        AppConfig::default()
    });
    apply_overrides(&mut config, cli.host, cli.port)?;

    let client = GstdClient::from_config(&config)?;

    match cli.command {
        Commands::Ping => commands::ping(&client).await?,
        Commands::Pipeline(cmd) => commands::pipeline(&client, cmd).await?,
        Commands::Element(cmd) => commands::element(&client, cmd).await?,
        Commands::Signal(cmd) => commands::signal(&client, cmd).await?,
        Commands::Bus(cmd) => commands::bus(&client, &config, cmd).await?,
        Commands::Event(cmd) => commands::event(&client, cmd).await?,
        Commands::Debug(cmd) => commands::debug(&client, cmd).await?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
    }

    Ok(())
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        let toml_str =
            toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

/// Load the config file, or `None` when it does not exist.
async fn read_config(path: &Path) -> Result<Option<AppConfig>> {
    if path.exists() {
        Ok(Some(AppConfig::load(path).await?))
    } else {
        Ok(None)
    }
}

fn apply_overrides(config: &mut AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.daemon.host = host;
    }
    if let Some(port) = port {
        config.daemon.port = port;
    }
    config.validate()?;
    Ok(())
}
