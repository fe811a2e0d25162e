//! Concurrent subnet sweep.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::task::JoinSet;

use super::interfaces::{enumerate_subnets, SubnetCandidate};
use super::{DeviceProber, DiscoveryError, DiscoveryResult, HttpProber};
use crate::config::Config;
use crate::types::{DeviceFamily, DiscoveredDevice};

/// Enumerates local subnets and sweeps them with an [`HttpProber`].
///
/// # Errors
/// - [`DiscoveryError::InterfaceEnumeration`] if interfaces cannot be listed
/// - [`DiscoveryError::Client`] if the probing HTTP client cannot be built
/// - [`DiscoveryError::NoInterfaces`] if no IPv4 subnet is available
/// - [`DiscoveryError::NoDevices`] if the sweep finds nothing
pub async fn scan(config: &Config) -> DiscoveryResult<Vec<DiscoveredDevice>> {
    let subnets = enumerate_subnets()?;
    let prober = HttpProber::new(config)?;
    scan_subnets(Arc::new(prober), &subnets).await
}

/// Probes hosts 1..=254 of every subnet for both families.
///
/// Every probe runs as its own task, so wall-clock time is bounded by the
/// prober's timeout rather than by host count. Results only become visible
/// once all tasks have finished. An address found more than once (two
/// interfaces on one subnet, or both families answering) is kept once, first
/// answer wins. The returned list is sorted by address.
pub async fn scan_subnets(
    prober: Arc<dyn DeviceProber>,
    subnets: &[SubnetCandidate],
) -> DiscoveryResult<Vec<DiscoveredDevice>> {
    if subnets.is_empty() {
        return Err(DiscoveryError::NoInterfaces);
    }

    let start = Instant::now();
    log::info!("[Discovery] Scanning {} interface(s)", subnets.len());

    let found: Arc<Mutex<Vec<DiscoveredDevice>>> = Arc::new(Mutex::new(Vec::new()));
    let mut tasks = JoinSet::new();

    for subnet in subnets {
        log::info!("[Discovery] Scanning {}", subnet);
        for address in subnet.hosts() {
            for family in DeviceFamily::ALL {
                let prober = Arc::clone(&prober);
                let found = Arc::clone(&found);
                tasks.spawn(async move {
                    let Some(device) = prober.probe(address, family).await else {
                        return;
                    };
                    let mut found = found.lock();
                    if found.iter().any(|d| d.address == device.address) {
                        return;
                    }
                    log::info!(
                        "[Discovery] Found {} ({} {}) at {}",
                        device.name,
                        device.brand,
                        device.model,
                        device.address
                    );
                    found.push(device);
                });
            }
        }
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            log::warn!("[Discovery] Probe task failed: {}", e);
        }
    }

    let mut devices = std::mem::take(&mut *found.lock());
    devices.sort_by_key(|d| d.address);

    log::info!(
        "[Discovery] Completed scan in {:?}: {} player(s)",
        start.elapsed(),
        devices.len()
    );

    if devices.is_empty() {
        return Err(DiscoveryError::NoDevices);
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers for a fixed set of `(last octet, family)` pairs on any subnet.
    struct MockProber {
        answers: Vec<(u8, DeviceFamily)>,
        calls: AtomicUsize,
    }

    impl MockProber {
        fn new(answers: Vec<(u8, DeviceFamily)>) -> Self {
            Self {
                answers,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DeviceProber for MockProber {
        async fn probe(&self, address: Ipv4Addr, family: DeviceFamily) -> Option<DiscoveredDevice> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let octet = address.octets()[3];
            self.answers
                .iter()
                .any(|&(o, f)| o == octet && f == family)
                .then(|| DiscoveredDevice {
                    address,
                    name: format!("Player {octet}"),
                    brand: family.to_string(),
                    model: "Test".to_string(),
                    family,
                })
        }
    }

    fn subnet(name: &str, c: u8, d: u8) -> SubnetCandidate {
        SubnetCandidate::new(name, Ipv4Addr::new(192, 168, c, d))
    }

    #[tokio::test]
    async fn no_subnets_is_no_interfaces() {
        let prober = Arc::new(MockProber::new(vec![]));
        let err = scan_subnets(prober, &[]).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::NoInterfaces));
    }

    #[tokio::test]
    async fn empty_sweep_is_no_devices() {
        let prober = Arc::new(MockProber::new(vec![]));
        let err = scan_subnets(prober.clone(), &[subnet("en0", 1, 5)])
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::NoDevices));
        assert_eq!(prober.calls.load(Ordering::SeqCst), 254 * 2);
    }

    #[tokio::test]
    async fn same_address_on_two_interfaces_is_kept_once() {
        let prober = Arc::new(MockProber::new(vec![(100, DeviceFamily::BluOs)]));
        let subnets = [subnet("en0", 1, 5), subnet("en1", 1, 6)];
        let devices = scan_subnets(prober, &subnets).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].address, Ipv4Addr::new(192, 168, 1, 100));
    }

    #[tokio::test]
    async fn results_are_sorted_by_address() {
        let prober = Arc::new(MockProber::new(vec![
            (200, DeviceFamily::Sonos),
            (3, DeviceFamily::BluOs),
            (50, DeviceFamily::Sonos),
        ]));
        let devices = scan_subnets(prober, &[subnet("en0", 4, 1)]).await.unwrap();
        let octets: Vec<u8> = devices.iter().map(|d| d.address.octets()[3]).collect();
        assert_eq!(octets, vec![3, 50, 200]);
    }
}
