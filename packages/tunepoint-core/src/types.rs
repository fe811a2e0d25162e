//! Shared domain types used across discovery, device clients and the
//! control session.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeviceError;
use crate::protocol_constants::INFO_PRESET_MARKER;

/// The two supported device protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    /// BluOS players: REST/XML polling API.
    #[serde(rename = "bluos")]
    BluOs,
    /// Sonos players: SOAP/UPnP control point.
    Sonos,
}

impl DeviceFamily {
    /// Both families, in probe order.
    pub const ALL: [DeviceFamily; 2] = [DeviceFamily::BluOs, DeviceFamily::Sonos];

    /// Returns true for the family that supports master/slave grouping.
    #[must_use]
    pub fn supports_grouping(self) -> bool {
        matches!(self, Self::BluOs)
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BluOs => f.write_str("BluOS"),
            Self::Sonos => f.write_str("Sonos"),
        }
    }
}

impl FromStr for DeviceFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bluos" | "bluesound" => Ok(Self::BluOs),
            "sonos" => Ok(Self::Sonos),
            other => Err(format!("unknown device family: {other}")),
        }
    }
}

/// A player found by a successful probe.
///
/// Two devices are equal when they share an address, whatever the other
/// fields say.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub address: Ipv4Addr,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub family: DeviceFamily,
}

impl PartialEq for DiscoveredDevice {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for DiscoveredDevice {}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {}) - {} [{}]",
            self.name, self.brand, self.model, self.address, self.family
        )
    }
}

/// Snapshot of what a player is doing right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub state: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// 0..=100.
    pub volume: u8,
}

impl PlaybackStatus {
    /// Status reported when the transport state cannot be read.
    #[must_use]
    pub fn stopped() -> Self {
        Self {
            state: "stopped".to_string(),
            ..Self::default()
        }
    }
}

/// A user-selectable playable reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetEntry {
    /// 1-based ordinal, stable only within one load.
    pub id: u32,
    pub name: String,
    pub uri: String,
}

impl PresetEntry {
    /// True for synthesized placeholder entries that cannot be played.
    #[must_use]
    pub fn is_info(&self) -> bool {
        self.name.starts_with(INFO_PRESET_MARKER)
    }
}

/// Result of a single diagnostic probe against a device endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointCheck {
    pub name: String,
    pub ok: bool,
}

impl EndpointCheck {
    pub fn new(name: impl Into<String>, ok: bool) -> Self {
        Self {
            name: name.into(),
            ok,
        }
    }
}

impl fmt::Display for EndpointCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, if self.ok { "ok" } else { "FAILED" })
    }
}

/// A `<master>+<slave>` pair of 1-based ordinals into the last discovery
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpec {
    pub master: usize,
    pub slave: usize,
}

impl FromStr for GroupSpec {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DeviceError::InvalidGroupSpec(s.to_string());

        let (master, slave) = s.trim().split_once('+').ok_or_else(invalid)?;
        let master: usize = master.trim().parse().map_err(|_| invalid())?;
        let slave: usize = slave.trim().parse().map_err(|_| invalid())?;

        if master == 0 || slave == 0 {
            return Err(invalid());
        }
        if master == slave {
            return Err(DeviceError::SelfGrouping(master));
        }

        Ok(Self { master, slave })
    }
}

impl fmt::Display for GroupSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.master, self.slave)
    }
}
