//! Tunepoint - discover and control BluOS and Sonos players from the shell.
//!
//! Each invocation discovers players (or connects straight to `--host`),
//! selects one as the active device and runs a single command against it.

mod config;

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tunepoint_core::{
    scan, ControlSession, DeviceFamily, DiscoveredDevice, GroupSpec, HttpConnector,
};

use crate::config::{CliConfig, FlagOverrides};

/// Tunepoint - LAN control for BluOS and Sonos players.
#[derive(Parser, Debug)]
#[command(name = "tunepoint")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE", env = "TUNEPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "warn", env = "TUNEPOINT_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Connect directly to this address instead of scanning.
    #[arg(long, requires = "family")]
    host: Option<Ipv4Addr>,

    /// Device family of `--host` (bluos or sonos).
    #[arg(long)]
    family: Option<DeviceFamily>,

    /// Ordinal of the device to control, as listed by `scan`.
    #[arg(short, long, default_value_t = 1)]
    device: usize,

    #[command(flatten)]
    overrides: FlagOverrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List players on the local network.
    Scan {
        /// Print the device list as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show transport state, track and volume.
    Status,
    /// List presets (radio favorites on Sonos).
    Presets,
    /// Resume playback, or start preset ID.
    Play { id: Option<u32> },
    Pause,
    Stop,
    Next,
    #[command(alias = "previous")]
    Prev,
    /// Set the volume (0-100).
    Volume {
        #[arg(allow_negative_numbers = true)]
        level: i32,
    },
    /// Group two BluOS players, e.g. `group 1+2` (master+slave).
    Group { spec: GroupSpec },
    /// Break up the active BluOS player's group.
    Ungroup,
    /// Self-test the active player's endpoints.
    Debug,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Tunepoint v{}", env!("CARGO_PKG_VERSION"));

    let config = CliConfig::load(args.config.as_deref(), &args.overrides)
        .context("Failed to load configuration")?
        .to_core_config();
    if let Err(e) = config.validate() {
        bail!("Invalid configuration: {}", e);
    }

    if let Command::Scan { json } = args.command {
        let devices = scan(&config).await.context("Discovery failed")?;
        print_devices(&devices, json)?;
        return Ok(());
    }

    let connector =
        Arc::new(HttpConnector::new(config.clone()).context("Failed to build HTTP client")?);

    let mut session = match (args.host, args.family) {
        (Some(address), Some(family)) => {
            let device = DiscoveredDevice {
                address,
                name: address.to_string(),
                brand: family.to_string(),
                model: "manual".to_string(),
                family,
            };
            let mut session = ControlSession::new(connector, vec![device]);
            session.select(1)?;
            session
        }
        _ => {
            let devices = scan(&config).await.context("Discovery failed")?;
            let mut session = ControlSession::new(connector, devices);
            session
                .select(args.device)
                .with_context(|| format!("Cannot select device {}", args.device))?;
            session
        }
    };

    log::info!("Active device: {}", session.active()?.device());
    run(&mut session, args.command).await
}

/// Runs one command against the session's active device.
async fn run(session: &mut ControlSession, command: Command) -> Result<()> {
    match command {
        Command::Scan { json } => print_devices(session.devices(), json)?,
        Command::Status => {
            let status = session.client()?.get_status().await?;
            println!("State:  {}", status.state);
            println!("Title:  {}", status.title);
            println!("Artist: {}", status.artist);
            println!("Album:  {}", status.album);
            println!("Volume: {}", status.volume);
        }
        Command::Presets => {
            let presets = session.client()?.list_presets().await?;
            if presets.is_empty() {
                println!("No presets.");
            }
            for preset in presets {
                if preset.is_info() {
                    println!("     {}", preset.name);
                } else {
                    println!("{:>3}. {}", preset.id, preset.name);
                }
            }
        }
        Command::Play { id: Some(id) } => {
            session.client()?.play_preset(id).await?;
            println!("Playing preset {}", id);
        }
        Command::Play { id: None } => session.client()?.play().await?,
        Command::Pause => session.client()?.pause().await?,
        Command::Stop => session.client()?.stop().await?,
        Command::Next => session.client()?.next().await?,
        Command::Prev => session.client()?.previous().await?,
        Command::Volume { level } => {
            session.client()?.set_volume(level).await?;
            println!("Volume set to {}", level);
        }
        Command::Group { spec } => {
            session.group(spec).await?;
            println!("Grouped {}", spec);
        }
        Command::Ungroup => {
            let report = session.ungroup().await?;
            println!("Ungrouped ({})", report);
        }
        Command::Debug => debug(session).await?,
    }
    Ok(())
}

async fn debug(session: &ControlSession) -> Result<()> {
    let active = session.active()?;
    println!("Device: {}", active.device());
    for check in active.client().diagnostics().await {
        println!("  {}", check);
    }

    if active.device().family.supports_grouping() {
        let combos: Vec<String> = session
            .group_combinations()
            .iter()
            .map(ToString::to_string)
            .collect();
        if combos.is_empty() {
            println!("Grouping: needs at least two BluOS players");
        } else {
            println!("Grouping: {}", combos.join(", "));
        }
    }
    Ok(())
}

fn print_devices(devices: &[DiscoveredDevice], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(devices)?);
        return Ok(());
    }
    for (i, device) in devices.iter().enumerate() {
        println!("{:>3}. {}", i + 1, device);
    }
    Ok(())
}
