//! Sonos SOAP/UPnP client.
//!
//! Transport and volume map onto single AVTransport/RenderingControl
//! actions. Presets are synthesized from ContentDirectory favorites (see
//! [`favorites`]) and cached for the life of the client; playing one may
//! take a multi-step queue fallback (see [`playback`]). Sonos grouping is
//! not offered: every grouping call fails with a capability error.

pub mod didl;
pub mod favorites;
pub mod playback;
pub mod services;
pub mod soap;

use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use self::didl::parse_items;
use self::favorites::{collect_radio_favorites, placeholder_favorites, Favorite, FavoritesCache};
use self::services::SonosService;
use self::soap::{response_value, SoapRequestBuilder, SoapResult};
use super::{validate_volume, AudioDevice};
use crate::config::Config;
use crate::error::{DeviceError, DeviceResult};
use crate::protocol_constants::SONOS_DEVICE_DESCRIPTION_PATH;
use crate::types::{DeviceFamily, EndpointCheck, PlaybackStatus, PresetEntry};

/// Client for a single Sonos player.
pub struct SonosClient {
    client: Client,
    address: Ipv4Addr,
    base_url: String,
    favorites_roots: Vec<String>,
    browse_page_size: u32,
    favorites: FavoritesCache,
}

impl SonosClient {
    pub fn new(client: Client, address: Ipv4Addr, config: &Config) -> Self {
        Self {
            client,
            address,
            base_url: format!("http://{}:{}", address, config.sonos_port),
            favorites_roots: config.favorites_roots.clone(),
            browse_page_size: config.browse_page_size,
            favorites: FavoritesCache::default(),
        }
    }

    /// Starts a SOAP request against this player.
    fn soap(&self, service: SonosService, action: &'static str) -> SoapRequestBuilder<'_> {
        SoapRequestBuilder::new(&self.client, &self.base_url)
            .service(service)
            .action(action)
    }

    /// Issues an AVTransport action that takes only `InstanceID`.
    async fn transport(&self, action: &'static str) -> SoapResult<String> {
        self.soap(SonosService::AVTransport, action)
            .instance_id()
            .send()
            .await
    }

    /// Browses the direct children of `object_id` and returns the decoded
    /// DIDL-Lite result.
    async fn browse(&self, object_id: &str) -> SoapResult<String> {
        let response = self
            .soap(SonosService::ContentDirectory, "Browse")
            .arg("ObjectID", object_id)
            .arg("BrowseFlag", "BrowseDirectChildren")
            .arg("Filter", "*")
            .arg("StartingIndex", "0")
            .arg("RequestedCount", self.browse_page_size.to_string())
            .arg("SortCriteria", "")
            .send()
            .await?;
        response_value(&response, "Result")
    }

    /// Returns the cached favorites, browsing for them on first use.
    ///
    /// Never fails: containers that error are skipped, and an empty result
    /// becomes the informational placeholders.
    pub async fn favorites(&self) -> Arc<Vec<Favorite>> {
        if let Some(cached) = self.favorites.get() {
            return cached;
        }

        let mut containers = Vec::with_capacity(self.favorites_roots.len());
        for root in &self.favorites_roots {
            match self.browse(root).await {
                Ok(didl) => {
                    let items = parse_items(&didl);
                    log::debug!("[Favorites] {} item(s) in {}", items.len(), root);
                    containers.push(items);
                }
                Err(e) => log::warn!("[Favorites] Browse of {} failed: {}", root, e),
            }
        }

        let mut favorites = collect_radio_favorites(containers);
        if favorites.is_empty() {
            log::warn!("[Favorites] No radio favorites on {}", self.address);
            favorites = placeholder_favorites();
        } else {
            log::info!(
                "[Favorites] {} radio favorite(s) on {}",
                favorites.len(),
                self.address
            );
        }

        self.favorites.set(favorites)
    }

    /// Quick reachability checks used by [`AudioDevice::diagnostics`].
    async fn check_description(&self) -> bool {
        let url = format!("{}{}", self.base_url, SONOS_DEVICE_DESCRIPTION_PATH);
        matches!(self.client.get(&url).send().await, Ok(r) if r.status().is_success())
    }

    async fn check_content_directory(&self) -> bool {
        self.soap(SonosService::ContentDirectory, "Browse")
            .arg("ObjectID", "0")
            .arg("BrowseFlag", "BrowseMetadata")
            .arg("Filter", "*")
            .arg("StartingIndex", "0")
            .arg("RequestedCount", "1")
            .arg("SortCriteria", "")
            .send()
            .await
            .is_ok()
    }

    #[cfg(test)]
    pub(crate) fn seed_favorites(&self, favorites: Vec<Favorite>) {
        self.favorites.set(favorites);
    }
}

#[async_trait]
impl AudioDevice for SonosClient {
    fn family(&self) -> DeviceFamily {
        DeviceFamily::Sonos
    }

    fn address(&self) -> Ipv4Addr {
        self.address
    }

    async fn list_presets(&self) -> DeviceResult<Vec<PresetEntry>> {
        Ok(self.favorites().await.iter().map(Favorite::to_preset).collect())
    }

    async fn get_status(&self) -> DeviceResult<PlaybackStatus> {
        Ok(self.read_status().await)
    }

    async fn play_preset(&self, id: u32) -> DeviceResult<()> {
        let favorites = self.favorites().await;
        let favorite = favorites
            .iter()
            .find(|f| f.id == id)
            .ok_or(DeviceError::PresetNotFound(id))?;
        self.play_favorite(favorite).await
    }

    async fn play(&self) -> DeviceResult<()> {
        self.soap(SonosService::AVTransport, "Play")
            .instance_id()
            .arg("Speed", "1")
            .send()
            .await?;
        Ok(())
    }

    async fn pause(&self) -> DeviceResult<()> {
        self.transport("Pause").await?;
        Ok(())
    }

    async fn stop(&self) -> DeviceResult<()> {
        self.transport("Stop").await?;
        Ok(())
    }

    async fn set_volume(&self, level: i32) -> DeviceResult<()> {
        let level = validate_volume(level)?;
        self.soap(SonosService::RenderingControl, "SetVolume")
            .instance_id()
            .arg("Channel", "Master")
            .arg("DesiredVolume", level.to_string())
            .send()
            .await?;
        Ok(())
    }

    async fn next(&self) -> DeviceResult<()> {
        self.transport("Next").await?;
        Ok(())
    }

    async fn previous(&self) -> DeviceResult<()> {
        self.transport("Previous").await?;
        Ok(())
    }

    async fn add_slave(&self, _slave: Ipv4Addr) -> DeviceResult<()> {
        Err(DeviceError::unsupported("addSlave", DeviceFamily::Sonos))
    }

    async fn remove_slave(&self, _slave: Ipv4Addr) -> DeviceResult<()> {
        Err(DeviceError::unsupported("removeSlave", DeviceFamily::Sonos))
    }

    async fn remove_all_slaves(&self) -> DeviceResult<()> {
        Err(DeviceError::unsupported("removeAllSlaves", DeviceFamily::Sonos))
    }

    async fn leave_group(&self) -> DeviceResult<()> {
        Err(DeviceError::unsupported("leaveGroup", DeviceFamily::Sonos))
    }

    async fn reset_standalone(&self) -> DeviceResult<()> {
        Err(DeviceError::unsupported("resetStandalone", DeviceFamily::Sonos))
    }

    async fn diagnostics(&self) -> Vec<EndpointCheck> {
        let mut checks = vec![EndpointCheck::new(
            "Device description",
            self.check_description().await,
        )];

        let av_ok = self.transport("GetTransportInfo").await.is_ok();
        checks.push(EndpointCheck::new(SonosService::AVTransport.name(), av_ok));

        let rc_ok = self.read_volume().await.is_ok();
        checks.push(EndpointCheck::new(SonosService::RenderingControl.name(), rc_ok));

        checks.push(EndpointCheck::new(
            SonosService::ContentDirectory.name(),
            self.check_content_directory().await,
        ));

        self.invalidate_presets();
        let found = self.favorites().await.iter().filter(|f| !f.is_info()).count();
        checks.push(EndpointCheck::new(
            format!("Radio favorites ({} found)", found),
            found > 0,
        ));

        checks
    }

    fn invalidate_presets(&self) {
        log::debug!("[Favorites] Cache cleared for {}", self.address);
        self.favorites.clear();
    }
}
