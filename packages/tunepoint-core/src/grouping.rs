//! Multi-room grouping for BluOS players.
//!
//! Responsibilities:
//! - Resolving `<master>+<slave>` ordinals against the discovery result
//! - Master-adds-slave grouping
//! - Best-effort ungrouping across every known BluOS player
//!
//! BluOS gives no way to confirm that a player really is standalone, so
//! ungrouping counts as successful when any single call was accepted.

use std::fmt;
use std::net::Ipv4Addr;

use crate::error::{DeviceError, DeviceResult};
use crate::session::ControlSession;
use crate::types::{DeviceFamily, DiscoveredDevice, GroupSpec};

/// Outcome of an ungroup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UngroupReport {
    /// Calls issued.
    pub attempted: usize,
    /// Calls the players accepted.
    pub succeeded: usize,
}

impl fmt::Display for UngroupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ungroup calls succeeded", self.succeeded, self.attempted)
    }
}

impl UngroupReport {
    fn record(&mut self, what: &str, result: DeviceResult<()>, last_error: &mut Option<DeviceError>) {
        self.attempted += 1;
        match result {
            Ok(()) => {
                log::debug!("[GroupSync] {} ok", what);
                self.succeeded += 1;
            }
            Err(e) => {
                log::debug!("[GroupSync] {} failed: {}", what, e);
                *last_error = Some(e);
            }
        }
    }
}

fn is_bluos(device: &DiscoveredDevice) -> bool {
    device.family == DeviceFamily::BluOs
}

impl ControlSession {
    // ─────────────────────────────────────────────────────────────────────────────
    // Grouping
    // ─────────────────────────────────────────────────────────────────────────────

    /// Groups the `slave` ordinal under the `master` ordinal.
    ///
    /// Both must be BluOS players from the current discovery result. On
    /// success the master becomes the active device.
    pub async fn group(&mut self, spec: GroupSpec) -> DeviceResult<()> {
        if spec.master == spec.slave {
            return Err(DeviceError::SelfGrouping(spec.master));
        }
        let master = self.device_at(spec.master)?.clone();
        let slave = self.device_at(spec.slave)?.clone();
        if !is_bluos(&master) || !is_bluos(&slave) {
            return Err(DeviceError::GroupingRequiresRest);
        }

        log::info!("[GroupSync] Grouping {} (master) with {} (slave)", master, slave);

        let session = self.select(spec.master)?;
        session.client().add_slave(slave.address).await
    }

    /// Every `(master, slave)` ordinal pair [`group`](Self::group) would accept.
    pub fn group_combinations(&self) -> Vec<GroupSpec> {
        let bluos: Vec<usize> = self
            .devices()
            .iter()
            .enumerate()
            .filter(|(_, d)| is_bluos(d))
            .map(|(i, _)| i + 1)
            .collect();

        bluos
            .iter()
            .flat_map(|&master| {
                bluos
                    .iter()
                    .filter(move |&&slave| slave != master)
                    .map(move |&slave| GroupSpec { master, slave })
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Ungrouping
    // ─────────────────────────────────────────────────────────────────────────────

    /// Breaks up any group the active BluOS player takes part in.
    ///
    /// For every other known BluOS player, the active player drops it as a
    /// slave and it drops the active player. Then every BluOS player,
    /// active one included, is reset through its alternate endpoints.
    ///
    /// # Errors
    /// [`DeviceError::GroupingRequiresRest`] if the active player is not
    /// BluOS; otherwise the last call's error if no call succeeded.
    pub async fn ungroup(&self) -> DeviceResult<UngroupReport> {
        let active = self.active()?;
        if !is_bluos(active.device()) {
            return Err(DeviceError::GroupingRequiresRest);
        }
        let current = active.client();
        let current_addr: Ipv4Addr = active.device().address;

        let peers: Vec<&DiscoveredDevice> = self
            .devices()
            .iter()
            .filter(|d| is_bluos(d) && d.address != current_addr)
            .collect();

        let mut report = UngroupReport::default();
        let mut last_error = None;

        for peer in &peers {
            let result = current.remove_slave(peer.address).await;
            report.record(
                &format!("{} removeSlave {}", current_addr, peer.address),
                result,
                &mut last_error,
            );

            let peer_client = self.open(peer);
            let result = peer_client.remove_slave(current_addr).await;
            report.record(
                &format!("{} removeSlave {}", peer.address, current_addr),
                result,
                &mut last_error,
            );
        }

        let result = current.reset_standalone().await;
        report.record(&format!("{} reset", current_addr), result, &mut last_error);
        for peer in &peers {
            let result = self.open(peer).reset_standalone().await;
            report.record(&format!("{} reset", peer.address), result, &mut last_error);
        }

        log::info!("[GroupSync] Ungroup from {}: {}", current_addr, report);

        match last_error {
            Some(e) if report.succeeded == 0 => Err(e),
            _ => Ok(report),
        }
    }
}
