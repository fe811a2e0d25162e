//! Library configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{
    BLUOS_PORT, DEFAULT_BROWSE_PAGE_SIZE, DEFAULT_FAVORITES_ROOTS, PROBE_TIMEOUT_MS,
    REQUEST_TIMEOUT_SECS, SONOS_PORT,
};

/// Configuration for discovery and device control.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    // Ports
    /// BluOS HTTP control port.
    pub bluos_port: u16,

    /// Sonos UPnP control port.
    pub sonos_port: u16,

    // Timeouts
    /// Per-probe timeout during a scan (milliseconds).
    pub probe_timeout_ms: u64,

    /// Timeout for a single control request (seconds).
    pub request_timeout_secs: u64,

    // Favorites
    /// Content-directory containers browsed for radio favorites, in order.
    pub favorites_roots: Vec<String>,

    /// Number of children requested per Browse call.
    pub browse_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bluos_port: BLUOS_PORT,
            sonos_port: SONOS_PORT,
            probe_timeout_ms: PROBE_TIMEOUT_MS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            favorites_roots: DEFAULT_FAVORITES_ROOTS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            browse_page_size: DEFAULT_BROWSE_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Validates configuration values.
    ///
    /// Returns an error message if any value is out of range.
    pub fn validate(&self) -> Result<(), String> {
        if self.bluos_port == 0 || self.sonos_port == 0 {
            return Err("device ports must be non-zero".to_string());
        }
        if self.probe_timeout_ms == 0 {
            return Err("probe_timeout_ms must be >= 1".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be >= 1".to_string());
        }
        if self.favorites_roots.is_empty() {
            return Err("favorites_roots must name at least one container".to_string());
        }
        if self.browse_page_size == 0 {
            return Err("browse_page_size must be >= 1".to_string());
        }
        Ok(())
    }

    /// Probe timeout as a [`Duration`].
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Control request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
