//! Radio favorites resolution.
//!
//! Sonos has no preset list of its own. We browse a handful of content
//! containers that commonly hold radio stations, keep the items that look
//! like radio, collapse duplicates and number what is left. When nothing
//! survives, two informational entries explain why the list is empty.

use std::sync::Arc;

use parking_lot::Mutex;

use super::didl::DidlItem;
use crate::protocol_constants::INFO_PRESET_MARKER;
use crate::types::PresetEntry;

/// URI prefixes of stream and broadcast sources.
const RADIO_URI_PREFIXES: &[&str] = &[
    "x-sonosapi-stream:",
    "x-sonosapi-radio:",
    "x-rincon-mp3radio:",
    "http://",
    "https://",
    "mms://",
    "rtsp://",
    "x-sonos-http:",
];

/// Metadata class markers of broadcast items.
const RADIO_CLASS_MARKERS: &[&str] = &[
    "object.item.audioItem.audioBroadcast",
    "object.item.audioItem.radio",
    "radioBroadcast",
];

/// Lower-case name fragments that suggest a station.
const RADIO_NAME_KEYWORDS: &[&str] = &["radio", "fm", "am", "stream", "live"];

/// URI prefixes the queue fallback is attempted for.
const STREAMING_URI_PREFIXES: &[&str] = &["x-sonosapi-", "x-rincon-mp3radio:", "mms://", "rtsp://"];

/// A playable radio favorite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favorite {
    /// 1-based ordinal within the current load.
    pub id: u32,
    pub name: String,
    pub uri: String,
    /// Raw item content from the browse response; empty for placeholders.
    pub meta: String,
}

impl Favorite {
    /// True for synthesized placeholder entries.
    #[must_use]
    pub fn is_info(&self) -> bool {
        self.name.starts_with(INFO_PRESET_MARKER)
    }

    /// The preset view of this favorite.
    #[must_use]
    pub fn to_preset(&self) -> PresetEntry {
        PresetEntry {
            id: self.id,
            name: self.name.clone(),
            uri: self.uri.clone(),
        }
    }
}

/// Classifies a browse item as a radio station.
///
/// An item is radio if its URI has a stream/broadcast scheme, its metadata
/// carries a broadcast class, or its name contains a radio keyword
/// (case-insensitive).
pub fn is_radio_station(item: &DidlItem) -> bool {
    if RADIO_URI_PREFIXES.iter().any(|p| item.uri.starts_with(p)) {
        return true;
    }
    if RADIO_CLASS_MARKERS.iter().any(|m| item.content.contains(m)) {
        return true;
    }
    let name = item.title.to_lowercase();
    RADIO_NAME_KEYWORDS.iter().any(|k| name.contains(k))
}

/// True if a rejected direct-URI assignment should be retried through the
/// play queue.
pub fn is_streaming_uri(uri: &str) -> bool {
    STREAMING_URI_PREFIXES.iter().any(|p| uri.starts_with(p)) || uri.contains("radio")
}

/// Merges browse results from several containers into numbered favorites.
///
/// Keeps radio items only, drops later items whose `(name, URI)` pair has
/// already been seen, and numbers survivors 1..N in encounter order.
pub fn collect_radio_favorites<I>(containers: I) -> Vec<Favorite>
where
    I: IntoIterator<Item = Vec<DidlItem>>,
{
    let mut favorites: Vec<Favorite> = Vec::new();

    for item in containers.into_iter().flatten() {
        if !is_radio_station(&item) {
            log::debug!("[Favorites] Skipping non-radio item {:?} ({})", item.title, item.uri);
            continue;
        }
        if favorites
            .iter()
            .any(|f| f.name == item.title && f.uri == item.uri)
        {
            continue;
        }
        favorites.push(Favorite {
            id: 0,
            name: item.title,
            uri: item.uri,
            meta: item.content,
        });
    }

    for (i, favorite) in favorites.iter_mut().enumerate() {
        favorite.id = i as u32 + 1;
    }
    favorites
}

/// Non-playable entries shown when no radio favorite was found.
pub fn placeholder_favorites() -> Vec<Favorite> {
    [
        "No Sonos Radio favorites found",
        "Add radio stations in the Sonos app",
    ]
    .iter()
    .enumerate()
    .map(|(i, text)| Favorite {
        id: i as u32 + 1,
        name: format!("{} {}", INFO_PRESET_MARKER, text),
        uri: String::new(),
        meta: String::new(),
    })
    .collect()
}

/// Session-lifetime favorites cache.
///
/// The lock is never held across a browse; two concurrent loads may both
/// browse and the last one to finish wins.
#[derive(Debug, Default)]
pub struct FavoritesCache {
    inner: Mutex<Option<Arc<Vec<Favorite>>>>,
}

impl FavoritesCache {
    pub fn get(&self) -> Option<Arc<Vec<Favorite>>> {
        self.inner.lock().clone()
    }

    pub fn set(&self, favorites: Vec<Favorite>) -> Arc<Vec<Favorite>> {
        let favorites = Arc::new(favorites);
        *self.inner.lock() = Some(Arc::clone(&favorites));
        favorites
    }

    pub fn clear(&self) {
        *self.inner.lock() = None;
    }
}
