//! The control session: discovered devices plus the one being controlled.
//!
//! Everything a command handler needs is owned here and passed around
//! explicitly, so two sessions never observe each other.

use std::sync::Arc;

use crate::device::{connect, AudioDevice, DeviceConnector, DeviceSession};
use crate::error::{DeviceError, DeviceResult};
use crate::types::DiscoveredDevice;

pub struct ControlSession {
    connector: Arc<dyn DeviceConnector>,
    devices: Vec<DiscoveredDevice>,
    active: Option<DeviceSession>,
}

impl ControlSession {
    /// Creates a session over a discovery result. No device is active yet.
    pub fn new(connector: Arc<dyn DeviceConnector>, devices: Vec<DiscoveredDevice>) -> Self {
        Self {
            connector,
            devices,
            active: None,
        }
    }

    /// Devices from the most recent discovery, in ordinal order.
    pub fn devices(&self) -> &[DiscoveredDevice] {
        &self.devices
    }

    /// Replaces the device list after a rescan.
    ///
    /// The active session is kept only if its device is still present.
    pub fn set_devices(&mut self, devices: Vec<DiscoveredDevice>) {
        if let Some(active) = &self.active {
            if !devices.contains(active.device()) {
                log::info!(
                    "[Session] {} disappeared from discovery, dropping session",
                    active.device()
                );
                self.active = None;
            }
        }
        self.devices = devices;
    }

    /// Looks up a device by 1-based ordinal.
    pub fn device_at(&self, ordinal: usize) -> DeviceResult<&DiscoveredDevice> {
        ordinal
            .checked_sub(1)
            .and_then(|i| self.devices.get(i))
            .ok_or(DeviceError::DeviceIndexOutOfRange {
                ordinal,
                count: self.devices.len(),
            })
    }

    /// Makes the device at `ordinal` the active one, opening a fresh client.
    pub fn select(&mut self, ordinal: usize) -> DeviceResult<&DeviceSession> {
        let device = self.device_at(ordinal)?.clone();
        Ok(self.activate(device))
    }

    /// Makes `device` the active one without requiring it to be in the
    /// discovery list (direct `--host` connections).
    pub fn activate(&mut self, device: DiscoveredDevice) -> &DeviceSession {
        let session = connect(self.connector.as_ref(), device);
        self.active.insert(session)
    }

    /// The active session.
    pub fn active(&self) -> DeviceResult<&DeviceSession> {
        self.active.as_ref().ok_or(DeviceError::NoActiveDevice)
    }

    /// The active protocol client.
    pub fn client(&self) -> DeviceResult<&dyn AudioDevice> {
        self.active().map(DeviceSession::client)
    }

    /// Opens a client for a device other than the active one.
    pub(crate) fn open(&self, device: &DiscoveredDevice) -> Box<dyn AudioDevice> {
        self.connector.connect(device)
    }
}

impl std::fmt::Debug for ControlSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSession")
            .field("devices", &self.devices)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
