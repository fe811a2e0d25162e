//! Tunepoint Core - LAN discovery and control of BluOS and Sonos players.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`discovery`]: Subnet enumeration and the concurrent per-host probe scan
//! - [`device`]: The [`AudioDevice`] contract with its BluOS (REST/XML) and
//!   Sonos (SOAP/UPnP) clients
//! - [`session`]: The explicit control session handed to command handlers
//! - [`grouping`]: BluOS multi-room grouping and ungrouping
//! - [`config`]: Ports, timeouts and favorites settings
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`DeviceProber`](discovery::DeviceProber): Identifying a player at an address
//! - [`DeviceConnector`](device::DeviceConnector): Opening a client for a player
//!
//! Both have HTTP implementations; tests substitute recording doubles.

#![warn(clippy::all)]

pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
pub mod grouping;
pub mod protocol_constants;
pub mod session;
pub mod types;
pub mod xml;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export commonly used types at the crate root
pub use config::Config;
pub use device::{
    connect, AudioDevice, BluOsClient, DeviceConnector, DeviceSession, HttpConnector, SonosClient,
};
pub use discovery::{
    scan, scan_subnets, DeviceProber, DiscoveryError, HttpProber, LocalInterface, SubnetCandidate,
};
pub use error::{DeviceError, DeviceResult, DiscoveryResult, ErrorCode, SoapResult};
pub use grouping::UngroupReport;
pub use session::ControlSession;
pub use types::{
    DeviceFamily, DiscoveredDevice, EndpointCheck, GroupSpec, PlaybackStatus, PresetEntry,
};
