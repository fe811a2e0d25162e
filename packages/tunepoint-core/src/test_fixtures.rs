//! Shared test doubles for the control session and grouping tests.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::device::{validate_volume, AudioDevice, DeviceConnector};
use crate::error::{DeviceError, DeviceResult};
use crate::types::{DeviceFamily, DiscoveredDevice, EndpointCheck, PlaybackStatus, PresetEntry};

/// Builds a discovered device on 192.168.1.0/24.
pub fn device(last_octet: u8, family: DeviceFamily) -> DiscoveredDevice {
    DiscoveredDevice {
        address: Ipv4Addr::new(192, 168, 1, last_octet),
        name: format!("Player {}", last_octet),
        brand: family.to_string(),
        model: "Test".to_string(),
        family,
    }
}

/// Shared log of `"<address> <call>"` lines across all recording devices.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Records every contract call and fails the ones listed in `failing`.
pub struct RecordingDevice {
    address: Ipv4Addr,
    family: DeviceFamily,
    log: CallLog,
    failing: Arc<HashSet<String>>,
}

impl RecordingDevice {
    fn call(&self, name: impl Into<String>) -> DeviceResult<()> {
        let name = name.into();
        self.log.lock().push(format!("{} {}", self.address, name));
        if self.failing.contains(&name) {
            Err(DeviceError::HttpStatus(500))
        } else {
            Ok(())
        }
    }

    fn grouping_call(&self, name: &'static str, arg: Option<Ipv4Addr>) -> DeviceResult<()> {
        if !self.family.supports_grouping() {
            return Err(DeviceError::unsupported(name, self.family));
        }
        match arg {
            Some(peer) => self.call(format!("{} {}", name, peer)),
            None => self.call(name),
        }
    }
}

#[async_trait]
impl AudioDevice for RecordingDevice {
    fn family(&self) -> DeviceFamily {
        self.family
    }

    fn address(&self) -> Ipv4Addr {
        self.address
    }

    async fn list_presets(&self) -> DeviceResult<Vec<PresetEntry>> {
        self.call("listPresets")?;
        Ok(Vec::new())
    }

    async fn get_status(&self) -> DeviceResult<PlaybackStatus> {
        self.call("getStatus")?;
        Ok(PlaybackStatus::stopped())
    }

    async fn play_preset(&self, id: u32) -> DeviceResult<()> {
        self.call(format!("playPreset {}", id))
    }

    async fn play(&self) -> DeviceResult<()> {
        self.call("play")
    }

    async fn pause(&self) -> DeviceResult<()> {
        self.call("pause")
    }

    async fn stop(&self) -> DeviceResult<()> {
        self.call("stop")
    }

    async fn set_volume(&self, level: i32) -> DeviceResult<()> {
        let level = validate_volume(level)?;
        self.call(format!("setVolume {}", level))
    }

    async fn next(&self) -> DeviceResult<()> {
        self.call("next")
    }

    async fn previous(&self) -> DeviceResult<()> {
        self.call("previous")
    }

    async fn add_slave(&self, slave: Ipv4Addr) -> DeviceResult<()> {
        self.grouping_call("addSlave", Some(slave))
    }

    async fn remove_slave(&self, slave: Ipv4Addr) -> DeviceResult<()> {
        self.grouping_call("removeSlave", Some(slave))
    }

    async fn remove_all_slaves(&self) -> DeviceResult<()> {
        self.grouping_call("removeAllSlaves", None)
    }

    async fn leave_group(&self) -> DeviceResult<()> {
        self.grouping_call("leaveGroup", None)
    }

    async fn reset_standalone(&self) -> DeviceResult<()> {
        self.grouping_call("resetStandalone", None)
    }

    async fn diagnostics(&self) -> Vec<EndpointCheck> {
        vec![EndpointCheck::new("mock", true)]
    }
}

/// Hands out [`RecordingDevice`]s that share one call log.
#[derive(Default)]
pub struct MockConnector {
    pub log: CallLog,
    failing: Arc<HashSet<String>>,
}

impl MockConnector {
    /// A connector whose devices fail every call named in `failing`
    /// (e.g. `"removeSlave 192.168.1.3"`).
    pub fn failing(failing: &[&str]) -> Self {
        Self {
            log: CallLog::default(),
            failing: Arc::new(failing.iter().map(|s| (*s).to_string()).collect()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

impl DeviceConnector for MockConnector {
    fn connect(&self, device: &DiscoveredDevice) -> Box<dyn AudioDevice> {
        Box::new(RecordingDevice {
            address: device.address,
            family: device.family,
            log: Arc::clone(&self.log),
            failing: Arc::clone(&self.failing),
        })
    }
}
