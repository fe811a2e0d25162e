//! Local IPv4 subnet enumeration.
//!
//! Produces the /24 subnets worth sweeping, preferring the private ranges
//! consumer LANs live on and dropping virtualization NAT and container
//! bridges unless nothing else is left. Interfaces that are down are never
//! swept; on non-unix targets every listed interface is treated as up.

use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use local_ip_address::list_afinet_netifas;

use super::{DiscoveryError, DiscoveryResult};

/// Bridge and container interface prefixes to filter out during discovery.
///
/// VPN tunnels (`tun`, `tap`, `utun`) are kept: a player can sit behind one.
pub const VIRTUAL_INTERFACE_PREFIXES: &[&str] =
    &["docker", "veth", "br-", "virbr", "vmnet", "vbox"];

/// An address as reported by the OS, with its interface's up flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInterface {
    pub name: String,
    pub address: IpAddr,
    pub up: bool,
}

/// A local interface and the /24 subnet it sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetCandidate {
    /// Interface name (e.g., "en0", "eth0").
    pub interface: String,
    /// IPv4 address bound to this interface.
    pub address: Ipv4Addr,
}

impl SubnetCandidate {
    pub fn new(interface: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            interface: interface.into(),
            address,
        }
    }

    /// First three octets of the address.
    #[must_use]
    pub fn prefix(&self) -> [u8; 3] {
        let [a, b, c, _] = self.address.octets();
        [a, b, c]
    }

    /// Address of host `n` (1..=254) on this subnet.
    #[must_use]
    pub fn host(&self, n: u8) -> Ipv4Addr {
        let [a, b, c] = self.prefix();
        Ipv4Addr::new(a, b, c, n)
    }

    /// Every host address on the subnet, `.1` through `.254`.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        (1..=254).map(move |n| self.host(n))
    }
}

impl fmt::Display for SubnetCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.prefix();
        write!(f, "{} ({}.{}.{}.0/24)", self.interface, a, b, c)
    }
}

/// Checks if an interface name belongs to a virtual/container interface.
pub fn is_virtual_interface(name: &str) -> bool {
    let name_lower = name.to_lowercase();
    VIRTUAL_INTERFACE_PREFIXES
        .iter()
        .any(|prefix| name_lower.starts_with(prefix))
}

/// VirtualBox NAT (10.0.2.0/24) and the default container bridge
/// (172.17.0.0/16).
fn is_virtualization_range(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    matches!((a, b, c), (10, 0, 2) | (172, 17, _))
}

/// Private ranges home and office networks normally use.
fn is_preferred_range(ip: Ipv4Addr) -> bool {
    let [a, b, _, _] = ip.octets();
    matches!((a, b), (192, 168) | (10, _) | (172, 16))
}

/// Lists the subnets worth scanning on this host.
///
/// # Errors
/// Returns [`DiscoveryError::InterfaceEnumeration`] if the OS cannot list
/// interfaces at all. An empty result is not an error here; the scanner
/// decides what to do with it.
pub fn enumerate_subnets() -> DiscoveryResult<Vec<SubnetCandidate>> {
    let raw = list_afinet_netifas()
        .map_err(|e| DiscoveryError::InterfaceEnumeration(e.to_string()))?;
    let up = up_interfaces();

    let interfaces = raw
        .into_iter()
        .map(|(name, address)| LocalInterface {
            up: up.as_ref().map_or(true, |up| up.contains(&name)),
            name,
            address,
        })
        .collect();
    Ok(select_subnets(interfaces))
}

/// Names of interfaces carrying `IFF_UP`, or `None` if flags are unavailable.
#[cfg(unix)]
fn up_interfaces() -> Option<HashSet<String>> {
    use nix::ifaddrs::getifaddrs;
    use nix::net::if_::InterfaceFlags;

    match getifaddrs() {
        Ok(addrs) => Some(
            addrs
                .filter(|ifa| ifa.flags.contains(InterfaceFlags::IFF_UP))
                .map(|ifa| ifa.interface_name)
                .collect(),
        ),
        Err(e) => {
            log::warn!("[Discovery] Cannot read interface flags: {}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn up_interfaces() -> Option<HashSet<String>> {
    None
}

/// Filters and ranks raw interface addresses.
///
/// Keeps non-loopback IPv4 addresses on interfaces that are up. Bridge and
/// container interfaces (see [`VIRTUAL_INTERFACE_PREFIXES`]) and
/// virtualization ranges are dropped unless that would leave nothing, in
/// which case every up IPv4 candidate is returned. Down interfaces are never
/// part of that fallback. Preferred private ranges sort first; the sort is
/// stable so OS order is kept within each rank.
pub fn select_subnets(raw: Vec<LocalInterface>) -> Vec<SubnetCandidate> {
    let all: Vec<SubnetCandidate> = raw
        .into_iter()
        .filter_map(|iface| match iface.address {
            IpAddr::V4(ipv4) if !ipv4.is_loopback() && !ipv4.is_unspecified() => {
                if !iface.up {
                    log::debug!("[Discovery] Skipping down interface: {}", iface.name);
                    return None;
                }
                Some(SubnetCandidate::new(iface.name, ipv4))
            }
            _ => None,
        })
        .collect();

    let mut useful: Vec<SubnetCandidate> = all
        .iter()
        .filter(|c| {
            if is_virtual_interface(&c.interface) {
                log::debug!("[Discovery] Skipping virtual interface: {}", c.interface);
                return false;
            }
            if is_virtualization_range(c.address) {
                log::debug!(
                    "[Discovery] Skipping virtualization range on {}: {}",
                    c.interface,
                    c.address
                );
                return false;
            }
            true
        })
        .cloned()
        .collect();

    if useful.is_empty() && !all.is_empty() {
        log::warn!(
            "[Discovery] Only virtual networks found, scanning all {} interface(s)",
            all.len()
        );
        useful = all;
    }

    useful.sort_by_key(|c| !is_preferred_range(c.address));

    for candidate in &useful {
        log::debug!("[Discovery] Using interface {}", candidate);
    }

    useful
}
