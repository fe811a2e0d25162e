//! Player discovery by subnet sweep.
//!
//! Neither device family is found through a registry here: every host of
//! every local /24 is probed for both families' signature endpoints and
//! the answers are merged by address.
//!
//! - [`interfaces`]: local subnet enumeration and ranking
//! - [`probe`]: per-address, per-family identity probes
//! - [`scanner`]: the concurrent sweep that ties them together

pub mod interfaces;
pub mod probe;
pub mod scanner;

use std::net::Ipv4Addr;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{DeviceFamily, DiscoveredDevice};

pub use interfaces::{enumerate_subnets, select_subnets, LocalInterface, SubnetCandidate};
pub use probe::HttpProber;
pub use scanner::{scan, scan_subnets};

/// Errors that end a discovery run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The OS could not list network interfaces.
    #[error("failed to enumerate network interfaces: {0}")]
    InterfaceEnumeration(String),

    /// The HTTP client used for probing could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// No usable IPv4 subnet to scan.
    #[error("no usable network interfaces found")]
    NoInterfaces,

    /// A full scan completed without finding any player.
    #[error("no players found on the network")]
    NoDevices,
}

/// Convenient Result alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Probes a single address for a single device family.
///
/// Implementations never fail: timeouts, refused connections, wrong status
/// codes and unrecognised documents all mean "not found".
#[async_trait]
pub trait DeviceProber: Send + Sync {
    async fn probe(&self, address: Ipv4Addr, family: DeviceFamily) -> Option<DiscoveredDevice>;
}
