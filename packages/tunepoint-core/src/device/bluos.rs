//! BluOS REST/XML client.
//!
//! Every operation is one `GET` against the player's control port. The two
//! read operations return small XML documents that we deserialize with
//! `quick_xml::de`.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{validate_volume, AudioDevice};
use crate::error::{DeviceError, DeviceResult};
use crate::protocol_constants::{BLUOS_DIAGNOSTIC_PATHS, BLUOS_RESET_PATHS};
use crate::types::{DeviceFamily, EndpointCheck, PlaybackStatus, PresetEntry};

/// Client for a single BluOS player.
pub struct BluOsClient {
    client: Client,
    address: Ipv4Addr,
    base_url: String,
}

impl BluOsClient {
    #[must_use]
    pub fn new(client: Client, address: Ipv4Addr, port: u16) -> Self {
        Self {
            client,
            address,
            base_url: format!("http://{}:{}", address, port),
        }
    }

    /// Issues `GET {path}` and returns the body of a 200 response.
    async fn request(&self, path: &str) -> DeviceResult<String> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("[BluOS] GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            log::warn!("[BluOS] {} returned {}", path, status);
            return Err(DeviceError::HttpStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    /// Issues a command whose response body is irrelevant.
    async fn command(&self, path: &str) -> DeviceResult<()> {
        self.request(path).await.map(|_| ())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response documents
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PresetsDoc {
    #[serde(rename = "preset", default)]
    presets: Vec<PresetXml>,
}

#[derive(Debug, Deserialize)]
struct PresetXml {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@url", default)]
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusDoc {
    state: String,
    song: String,
    artist: String,
    album: String,
    volume: Option<i32>,
}

/// Parses a `/Presets` document, keeping the device's order and ids.
pub fn parse_presets(xml: &str) -> DeviceResult<Vec<PresetEntry>> {
    let doc: PresetsDoc =
        quick_xml::de::from_str(xml).map_err(|e| DeviceError::parse("presets", e))?;

    Ok(doc
        .presets
        .into_iter()
        .map(|p| PresetEntry {
            id: p.id,
            name: p.name,
            uri: p.url,
        })
        .collect())
}

/// Parses a `/Status` document. The state string is passed through as sent.
pub fn parse_status(xml: &str) -> DeviceResult<PlaybackStatus> {
    let doc: StatusDoc =
        quick_xml::de::from_str(xml).map_err(|e| DeviceError::parse("status", e))?;

    Ok(PlaybackStatus {
        state: doc.state,
        title: doc.song,
        artist: doc.artist,
        album: doc.album,
        volume: doc.volume.unwrap_or(0).clamp(0, 100) as u8,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl AudioDevice for BluOsClient {
    fn family(&self) -> DeviceFamily {
        DeviceFamily::BluOs
    }

    fn address(&self) -> Ipv4Addr {
        self.address
    }

    async fn list_presets(&self) -> DeviceResult<Vec<PresetEntry>> {
        let body = self.request("/Presets").await?;
        let presets = parse_presets(&body)?;
        log::info!("[BluOS] {} preset(s) on {}", presets.len(), self.address);
        Ok(presets)
    }

    async fn get_status(&self) -> DeviceResult<PlaybackStatus> {
        let body = self.request("/Status").await?;
        parse_status(&body)
    }

    async fn play_preset(&self, id: u32) -> DeviceResult<()> {
        log::info!("[BluOS] Playing preset {} on {}", id, self.address);
        self.command(&format!("/Preset?id={}", id)).await
    }

    async fn play(&self) -> DeviceResult<()> {
        self.command("/Play").await
    }

    async fn pause(&self) -> DeviceResult<()> {
        self.command("/Pause").await
    }

    async fn stop(&self) -> DeviceResult<()> {
        self.command("/Stop").await
    }

    async fn set_volume(&self, level: i32) -> DeviceResult<()> {
        let level = validate_volume(level)?;
        self.command(&format!("/Volume?level={}", level)).await
    }

    async fn next(&self) -> DeviceResult<()> {
        self.command("/Skip").await
    }

    async fn previous(&self) -> DeviceResult<()> {
        self.command("/Back").await
    }

    async fn add_slave(&self, slave: Ipv4Addr) -> DeviceResult<()> {
        log::info!("[Group] {} adding slave {}", self.address, slave);
        self.command(&format!("/AddSlave?slave={}", slave)).await
    }

    async fn remove_slave(&self, slave: Ipv4Addr) -> DeviceResult<()> {
        log::info!("[Group] {} removing slave {}", self.address, slave);
        self.command(&format!("/RemoveSlave?slave={}", slave)).await
    }

    async fn remove_all_slaves(&self) -> DeviceResult<()> {
        self.command("/RemoveAllSlaves").await
    }

    async fn leave_group(&self) -> DeviceResult<()> {
        self.command("/LeaveGroup").await
    }

    async fn reset_standalone(&self) -> DeviceResult<()> {
        let mut last_err = None;
        for path in BLUOS_RESET_PATHS {
            match self.command(path).await {
                Ok(()) => {
                    log::info!("[Group] {} reset via {}", self.address, path);
                    return Ok(());
                }
                Err(e) => {
                    log::debug!("[Group] {} {} failed: {}", self.address, path, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(DeviceError::HttpStatus(404)))
    }

    async fn diagnostics(&self) -> Vec<EndpointCheck> {
        let mut checks = Vec::with_capacity(BLUOS_DIAGNOSTIC_PATHS.len());
        for path in BLUOS_DIAGNOSTIC_PATHS {
            let ok = self.request(path).await.is_ok();
            checks.push(EndpointCheck::new(*path, ok));
        }
        checks
    }
}
