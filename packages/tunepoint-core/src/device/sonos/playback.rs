//! Status queries and preset playback for Sonos.
//!
//! Playing a favorite first tries `SetAVTransportURI` directly. Some
//! firmware rejects that for streaming sources and only accepts them from
//! the play queue, so a rejected stream URI is retried through an ordered
//! list of queue steps before `Play` is issued.

use super::didl::{broadcast_metadata, favorite_metadata, parse_track_metadata};
use super::favorites::{is_streaming_uri, Favorite};
use super::services::SonosService;
use super::soap::{response_value, SoapResult};
use super::SonosClient;
use crate::device::AudioDevice;
use crate::error::{DeviceError, DeviceResult};
use crate::types::PlaybackStatus;

/// One action of the queue fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStep {
    pub action: &'static str,
    pub args: Vec<(&'static str, String)>,
    /// A failing required step aborts the fallback; others are skipped over.
    pub required: bool,
}

impl QueueStep {
    fn optional(action: &'static str, args: Vec<(&'static str, String)>) -> Self {
        Self {
            action,
            args,
            required: false,
        }
    }

    fn required(action: &'static str, args: Vec<(&'static str, String)>) -> Self {
        Self {
            action,
            args,
            required: true,
        }
    }
}

/// The steps that put `favorite` at the head of an otherwise empty queue.
///
/// Clear the queue, switch to normal play mode, enqueue the URI with
/// broadcast metadata, then seek to track 1. Only the enqueue is required.
pub fn queue_fallback_steps(favorite: &Favorite) -> Vec<QueueStep> {
    vec![
        QueueStep::optional("RemoveAllTracksFromQueue", vec![]),
        QueueStep::optional("SetPlayMode", vec![("NewPlayMode", "NORMAL".to_string())]),
        QueueStep::required(
            "AddURIToQueue",
            vec![
                ("EnqueuedURI", favorite.uri.clone()),
                ("EnqueuedURIMetaData", broadcast_metadata(&favorite.name)),
                ("DesiredFirstTrackNumberEnqueued", "1".to_string()),
                ("EnqueueAsNext", "0".to_string()),
            ],
        ),
        QueueStep::optional(
            "Seek",
            vec![("Unit", "TRACK_NR".to_string()), ("Target", "1".to_string())],
        ),
    ]
}

/// `CurrentURIMetaData` for a favorite: its browse content if we have it,
/// otherwise minimal broadcast metadata built from the name.
pub fn favorite_uri_metadata(favorite: &Favorite) -> String {
    if favorite.meta.is_empty() {
        broadcast_metadata(&favorite.name)
    } else {
        favorite_metadata(&favorite.meta)
    }
}

impl SonosClient {
    /// Transport state, current track and volume, degrading instead of
    /// failing.
    ///
    /// If the transport state cannot be read the player is reported as
    /// stopped. If the track cannot be read only the state is returned. A
    /// volume failure leaves the volume at 0.
    pub(super) async fn read_status(&self) -> PlaybackStatus {
        let state = match self
            .transport("GetTransportInfo")
            .await
            .and_then(|xml| response_value(&xml, "CurrentTransportState"))
        {
            Ok(state) => state.to_lowercase(),
            Err(e) => {
                log::warn!("[Sonos] Transport state unavailable on {}: {}", self.address, e);
                return PlaybackStatus::stopped();
            }
        };

        let mut status = PlaybackStatus {
            state,
            ..PlaybackStatus::default()
        };

        let track = match self
            .transport("GetPositionInfo")
            .await
            .and_then(|xml| response_value(&xml, "TrackMetaData"))
        {
            Ok(meta) => parse_track_metadata(&meta),
            Err(e) => {
                log::warn!("[Sonos] Position info unavailable on {}: {}", self.address, e);
                return status;
            }
        };
        status.title = track.title;
        status.artist = track.creator;
        status.album = track.album;

        match self.read_volume().await {
            Ok(volume) => status.volume = volume,
            Err(e) => log::warn!("[Sonos] Volume unavailable on {}: {}", self.address, e),
        }

        status
    }

    /// Master volume, 0..=100.
    pub(super) async fn read_volume(&self) -> SoapResult<u8> {
        let xml = self
            .soap(SonosService::RenderingControl, "GetVolume")
            .instance_id()
            .arg("Channel", "Master")
            .send()
            .await?;
        let volume = response_value(&xml, "CurrentVolume")?;
        Ok(volume.trim().parse::<u8>().unwrap_or(0).min(100))
    }

    /// Plays a resolved favorite.
    ///
    /// Placeholders and URI-less entries are rejected before any request.
    pub(super) async fn play_favorite(&self, favorite: &Favorite) -> DeviceResult<()> {
        if favorite.is_info() {
            return Err(DeviceError::PresetNotPlayable {
                id: favorite.id,
                reason: "informational entry",
            });
        }
        if favorite.uri.is_empty() {
            return Err(DeviceError::PresetNotPlayable {
                id: favorite.id,
                reason: "no URI available",
            });
        }

        log::info!("[Sonos] Playing {:?} ({}) on {}", favorite.name, favorite.uri, self.address);

        let set_uri = self
            .soap(SonosService::AVTransport, "SetAVTransportURI")
            .instance_id()
            .arg("CurrentURI", favorite.uri.as_str())
            .arg("CurrentURIMetaData", favorite_uri_metadata(favorite))
            .send()
            .await;

        match set_uri {
            Ok(_) => {}
            Err(e) if e.is_rejection() && is_streaming_uri(&favorite.uri) => {
                log::warn!("[Sonos] SetAVTransportURI rejected ({}), falling back to queue", e);
                self.run_queue_fallback(favorite).await?;
            }
            Err(e) => return Err(e.into()),
        }

        self.play().await
    }

    /// Runs [`queue_fallback_steps`] in order.
    async fn run_queue_fallback(&self, favorite: &Favorite) -> DeviceResult<()> {
        for step in queue_fallback_steps(favorite) {
            let result = self
                .soap(SonosService::AVTransport, step.action)
                .instance_id()
                .args(step.args)
                .send()
                .await;

            match result {
                Ok(_) => log::debug!("[Sonos] Queue step {} ok", step.action),
                Err(e) if step.required => {
                    log::warn!("[Sonos] Queue step {} failed: {}", step.action, e);
                    return Err(e.into());
                }
                Err(e) => log::debug!("[Sonos] Queue step {} failed, continuing: {}", step.action, e),
            }
        }
        Ok(())
    }
}
