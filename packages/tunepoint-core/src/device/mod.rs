//! The device client contract and its two implementations.
//!
//! [`AudioDevice`] is the uniform capability set every player exposes.
//! [`bluos::BluOsClient`] implements it over BluOS's REST/XML API,
//! [`sonos::SonosClient`] over Sonos's SOAP/UPnP control point. Callers only
//! ever see `Box<dyn AudioDevice>`; the family is fixed when the client is
//! created and never re-detected.

pub mod bluos;
pub mod sonos;

use std::net::Ipv4Addr;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;
use crate::error::{DeviceError, DeviceResult};
use crate::types::{DeviceFamily, DiscoveredDevice, EndpointCheck, PlaybackStatus, PresetEntry};

pub use bluos::BluOsClient;
pub use sonos::SonosClient;

/// Transport, volume, preset and grouping control for one player.
///
/// Every call is a single in-flight request sequence; nothing is queued or
/// retried. Grouping calls on a family without grouping fail with
/// [`DeviceError::Unsupported`].
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Protocol family this client speaks.
    fn family(&self) -> DeviceFamily;

    /// Address of the player.
    fn address(&self) -> Ipv4Addr;

    /// Lists presets in ordinal order.
    async fn list_presets(&self) -> DeviceResult<Vec<PresetEntry>>;

    /// Reads the current transport state, track and volume.
    async fn get_status(&self) -> DeviceResult<PlaybackStatus>;

    /// Starts playback of preset `id` (as returned by [`list_presets`](Self::list_presets)).
    async fn play_preset(&self, id: u32) -> DeviceResult<()>;

    async fn play(&self) -> DeviceResult<()>;
    async fn pause(&self) -> DeviceResult<()>;
    async fn stop(&self) -> DeviceResult<()>;

    /// Sets the volume.
    ///
    /// # Errors
    /// [`DeviceError::InvalidVolume`] if `level` is outside 0..=100, without
    /// contacting the player.
    async fn set_volume(&self, level: i32) -> DeviceResult<()>;

    async fn next(&self) -> DeviceResult<()>;
    async fn previous(&self) -> DeviceResult<()>;

    /// Adds `slave` to this player's group, making this player the master.
    async fn add_slave(&self, slave: Ipv4Addr) -> DeviceResult<()>;

    /// Removes `slave` from this player's group.
    async fn remove_slave(&self, slave: Ipv4Addr) -> DeviceResult<()>;

    async fn remove_all_slaves(&self) -> DeviceResult<()>;
    async fn leave_group(&self) -> DeviceResult<()>;

    /// Tries the player's alternate reset endpoints; first success wins.
    async fn reset_standalone(&self) -> DeviceResult<()>;

    /// Runs a self-test against the player's control endpoints.
    async fn diagnostics(&self) -> Vec<EndpointCheck>;

    /// Drops any cached preset list so the next call reloads it.
    fn invalidate_presets(&self) {}
}

/// Checks a requested volume before any request is built.
pub fn validate_volume(level: i32) -> DeviceResult<u8> {
    u8::try_from(level)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or(DeviceError::InvalidVolume(level))
}

/// An open client bound to one discovered player.
pub struct DeviceSession {
    device: DiscoveredDevice,
    client: Box<dyn AudioDevice>,
}

impl DeviceSession {
    pub fn new(device: DiscoveredDevice, client: Box<dyn AudioDevice>) -> Self {
        Self { device, client }
    }

    /// The player this session controls.
    pub fn device(&self) -> &DiscoveredDevice {
        &self.device
    }

    /// The protocol client.
    pub fn client(&self) -> &dyn AudioDevice {
        self.client.as_ref()
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

/// Opens protocol clients for discovered players.
///
/// The control session goes through this seam so tests can substitute
/// recording clients.
pub trait DeviceConnector: Send + Sync {
    fn connect(&self, device: &DiscoveredDevice) -> Box<dyn AudioDevice>;
}

/// Opens real HTTP clients, sharing one connection pool.
#[derive(Clone)]
pub struct HttpConnector {
    client: Client,
    config: Config,
}

impl HttpConnector {
    /// Builds the shared HTTP client with the configured request timeout.
    pub fn new(config: Config) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self { client, config })
    }
}

impl DeviceConnector for HttpConnector {
    fn connect(&self, device: &DiscoveredDevice) -> Box<dyn AudioDevice> {
        match device.family {
            DeviceFamily::BluOs => Box::new(BluOsClient::new(
                self.client.clone(),
                device.address,
                self.config.bluos_port,
            )),
            DeviceFamily::Sonos => Box::new(SonosClient::new(
                self.client.clone(),
                device.address,
                &self.config,
            )),
        }
    }
}

/// Opens a session for `device` with `connector`.
pub fn connect(connector: &dyn DeviceConnector, device: DiscoveredDevice) -> DeviceSession {
    log::info!(
        "[Discovery] Connected to {} at {} [{}]",
        device.name,
        device.address,
        device.family
    );
    let client = connector.connect(&device);
    DeviceSession::new(device, client)
}
