//! Identity probes for both device families.
//!
//! A BluOS player answers `GET /SyncStatus` on its control port with an XML
//! element carrying `name`, `brand` and `model` attributes. A Sonos player
//! serves a UPnP device description on its own port; we only check it for a
//! signature token and pull a usable display name out of it.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use super::DeviceProber;
use crate::config::Config;
use crate::protocol_constants::{
    BLUOS_SYNC_STATUS_PATH, MAX_FRIENDLY_NAME_LEN, SONOS_DEVICE_DESCRIPTION_PATH,
    SONOS_SIGNATURE_TOKENS,
};
use crate::types::{DeviceFamily, DiscoveredDevice};
use crate::xml::inner_xml;

/// Probes addresses over plain HTTP with a short per-request timeout.
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
    bluos_port: u16,
    sonos_port: u16,
}

impl HttpProber {
    /// Builds a prober whose HTTP client times out after the configured
    /// probe timeout.
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(config.probe_timeout()).build()?;
        Ok(Self::with_client(client, config.bluos_port, config.sonos_port))
    }

    /// Uses an existing client and explicit ports.
    #[must_use]
    pub fn with_client(client: Client, bluos_port: u16, sonos_port: u16) -> Self {
        Self {
            client,
            bluos_port,
            sonos_port,
        }
    }

    /// Fetches `path` and returns the body only on HTTP 200.
    async fn fetch(&self, address: Ipv4Addr, port: u16, path: &str) -> Option<String> {
        let url = format!("http://{}:{}{}", address, port, path);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                log::trace!("[Probe] {} unreachable: {}", url, e);
                return None;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            log::debug!("[Probe] {} returned {}", url, response.status());
            return None;
        }

        response.text().await.ok()
    }

    /// Probes for a BluOS player.
    pub async fn probe_bluos(&self, address: Ipv4Addr) -> Option<DiscoveredDevice> {
        let body = self
            .fetch(address, self.bluos_port, BLUOS_SYNC_STATUS_PATH)
            .await?;
        let device = parse_sync_status(address, &body);
        if device.is_none() {
            log::debug!("[Probe] {} answered /SyncStatus with an unrecognised body", address);
        }
        device
    }

    /// Probes for a Sonos player.
    pub async fn probe_sonos(&self, address: Ipv4Addr) -> Option<DiscoveredDevice> {
        let body = self
            .fetch(address, self.sonos_port, SONOS_DEVICE_DESCRIPTION_PATH)
            .await?;
        parse_sonos_description(address, &body)
    }
}

#[async_trait]
impl DeviceProber for HttpProber {
    async fn probe(&self, address: Ipv4Addr, family: DeviceFamily) -> Option<DiscoveredDevice> {
        match family {
            DeviceFamily::BluOs => self.probe_bluos(address).await,
            DeviceFamily::Sonos => self.probe_sonos(address).await,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BluOS identity
// ─────────────────────────────────────────────────────────────────────────────

/// The attributes of `<SyncStatus>` we care about.
#[derive(Debug, Deserialize)]
struct SyncStatus {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@brand", default)]
    brand: String,
    #[serde(rename = "@model", default)]
    model: String,
}

/// Parses a `/SyncStatus` document into a BluOS device.
pub fn parse_sync_status(address: Ipv4Addr, body: &str) -> Option<DiscoveredDevice> {
    if !body.contains("<SyncStatus") {
        return None;
    }
    let status: SyncStatus = quick_xml::de::from_str(body).ok()?;

    Some(DiscoveredDevice {
        address,
        name: status.name,
        brand: status.brand,
        model: status.model,
        family: DeviceFamily::BluOs,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Sonos identity
// ─────────────────────────────────────────────────────────────────────────────

/// Parses a Sonos device description into a device.
///
/// Returns `None` when the body carries no Sonos signature token.
pub fn parse_sonos_description(address: Ipv4Addr, body: &str) -> Option<DiscoveredDevice> {
    if !SONOS_SIGNATURE_TOKENS.iter().any(|t| body.contains(t)) {
        return None;
    }

    let (friendly_name, model_name) = read_description_names(body);
    let model = model_name
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Sonos".to_string());

    let mut name = friendly_name.as_deref().map(clean_friendly_name).unwrap_or_default();
    if name.len() > MAX_FRIENDLY_NAME_LEN || name.contains('.') || name.is_empty() {
        name = if model != "Sonos" {
            model.clone()
        } else {
            format!("Sonos-{}", address.octets()[3])
        };
    }

    Some(DiscoveredDevice {
        address,
        name,
        brand: "Sonos".to_string(),
        model,
        family: DeviceFamily::Sonos,
    })
}

/// Pulls the first `friendlyName` and `modelName` out of a description.
fn read_description_names(xml: &str) -> (Option<String>, Option<String>) {
    let mut reader = Reader::from_str(xml);
    let mut friendly_name = None;
    let mut model_name = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"friendlyName" if friendly_name.is_none() => {
                    friendly_name = inner_xml(&mut reader, xml, &e)
                        .map(|t| html_escape::decode_html_entities(t).into_owned());
                }
                b"modelName" if model_name.is_none() => {
                    model_name = inner_xml(&mut reader, xml, &e)
                        .map(|t| html_escape::decode_html_entities(t).into_owned());
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::trace!("[Probe] Error parsing device description: {:?}", e);
                break;
            }
            _ => {}
        }
    }

    (friendly_name, model_name)
}

/// An `a.b.c.d` literal with the whitespace and single dash that follow it.
static IPV4_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.\d+\.\d+\.\d+\s*-?\s*").expect("IPv4 literal pattern is valid")
});

/// Strips the ` - RINCON_...` suffix and any IPv4 literals from a friendly
/// name.
///
/// Sonos formats these as `"192.168.1.42 - Living Room - RINCON_..."`.
pub fn clean_friendly_name(raw: &str) -> String {
    let mut name = raw.trim();
    if let Some(idx) = name.find(" - RINCON") {
        name = name[..idx].trim();
    }
    IPV4_LITERAL.replace_all(name, "").trim().to_string()
}
