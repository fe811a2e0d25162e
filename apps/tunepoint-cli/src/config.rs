//! CLI configuration.
//!
//! Layers, lowest to highest: built-in defaults, an optional YAML file,
//! `TUNEPOINT_*` environment variables, then command-line flags.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tunepoint_core::Config;

/// CLI configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// BluOS HTTP control port.
    /// Override: `TUNEPOINT_BLUOS_PORT`
    pub bluos_port: u16,

    /// Sonos UPnP control port.
    /// Override: `TUNEPOINT_SONOS_PORT`
    pub sonos_port: u16,

    /// Per-probe timeout during a scan, in milliseconds.
    /// Override: `TUNEPOINT_PROBE_TIMEOUT_MS`
    pub probe_timeout_ms: u64,

    /// Timeout for a single control request, in seconds.
    /// Override: `TUNEPOINT_REQUEST_TIMEOUT_SECS`
    pub request_timeout_secs: u64,

    /// Sonos content-directory containers browsed for radio favorites.
    /// Override: `TUNEPOINT_FAVORITES_ROOTS` (comma-separated)
    pub favorites_roots: Vec<String>,

    /// Number of children requested per Browse call.
    pub browse_page_size: u32,
}

/// Command-line overrides, applied after the environment.
#[derive(clap::Args, Debug, Default)]
pub struct FlagOverrides {
    /// BluOS HTTP control port.
    #[arg(long, value_name = "PORT")]
    pub bluos_port: Option<u16>,

    /// Sonos UPnP control port.
    #[arg(long, value_name = "PORT")]
    pub sonos_port: Option<u16>,

    /// Per-probe timeout during a scan, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub probe_timeout_ms: Option<u64>,

    /// Timeout for a single control request, in seconds.
    #[arg(long, value_name = "SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Sonos favorites containers to browse, comma-separated.
    #[arg(long, value_name = "ROOTS", value_delimiter = ',')]
    pub favorites_roots: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        let core = Config::default();
        Self {
            bluos_port: core.bluos_port,
            sonos_port: core.sonos_port,
            probe_timeout_ms: core.probe_timeout_ms,
            request_timeout_secs: core.request_timeout_secs,
            favorites_roots: core.favorites_roots,
            browse_page_size: core.browse_page_size,
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file, then applies environment and
    /// flag overrides.
    pub fn load(path: Option<&Path>, flags: &FlagOverrides) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.apply_flags(flags);
        Ok(config)
    }

    fn apply_flags(&mut self, flags: &FlagOverrides) {
        if let Some(port) = flags.bluos_port {
            self.bluos_port = port;
        }
        if let Some(port) = flags.sonos_port {
            self.sonos_port = port;
        }
        if let Some(ms) = flags.probe_timeout_ms {
            self.probe_timeout_ms = ms;
        }
        if let Some(secs) = flags.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if !flags.favorites_roots.is_empty() {
            self.favorites_roots = flags.favorites_roots.clone();
        }
    }

    /// Applies `TUNEPOINT_*` overrides. Unparseable values are ignored.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = var("TUNEPOINT_BLUOS_PORT").and_then(|v| v.parse().ok()) {
            self.bluos_port = port;
        }

        if let Some(port) = var("TUNEPOINT_SONOS_PORT").and_then(|v| v.parse().ok()) {
            self.sonos_port = port;
        }

        if let Some(ms) = var("TUNEPOINT_PROBE_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.probe_timeout_ms = ms;
        }

        if let Some(secs) = var("TUNEPOINT_REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout_secs = secs;
        }

        if let Some(roots) = var("TUNEPOINT_FAVORITES_ROOTS") {
            let roots: Vec<String> = roots
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from)
                .collect();
            if !roots.is_empty() {
                self.favorites_roots = roots;
            }
        }
    }

    /// Converts to tunepoint-core's Config type.
    pub fn to_core_config(&self) -> Config {
        Config {
            bluos_port: self.bluos_port,
            sonos_port: self.sonos_port,
            probe_timeout_ms: self.probe_timeout_ms,
            request_timeout_secs: self.request_timeout_secs,
            favorites_roots: self.favorites_roots.clone(),
            browse_page_size: self.browse_page_size,
        }
    }
}
