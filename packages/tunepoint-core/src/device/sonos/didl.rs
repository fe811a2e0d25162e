//! DIDL-Lite metadata: building it for playback and reading it out of
//! browse and position responses.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::xml::{escape_xml, extract_xml_text, get_xml_attr, inner_xml};

/// Opening tag of every DIDL-Lite document we send.
pub const DIDL_HEADER: &str = r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/">"#;

const DIDL_FOOTER: &str = "</DIDL-Lite>";

/// UPnP class for internet radio.
pub const BROADCAST_CLASS: &str = "object.item.audioItem.audioBroadcast";

/// Wraps item content captured from a browse response so it can be sent
/// back as `CurrentURIMetaData`.
pub fn favorite_metadata(item_content: &str) -> String {
    format!(
        r#"{}<item id="FAVORITE">{}</item>{}"#,
        DIDL_HEADER, item_content, DIDL_FOOTER
    )
}

/// Minimal broadcast-class metadata for a station known only by name.
pub fn broadcast_metadata(title: &str) -> String {
    format!(
        r#"{}<item id="R:0/0"><dc:title>{}</dc:title><upnp:class>{}</upnp:class></item>{}"#,
        DIDL_HEADER,
        escape_xml(title),
        BROADCAST_CLASS,
        DIDL_FOOTER
    )
}

/// One `<item>` of a browse result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidlItem {
    pub id: String,
    pub title: String,
    pub uri: String,
    /// The item's raw inner XML, kept for playback metadata.
    pub content: String,
}

/// Reads every `<item>` with a non-empty title out of a DIDL-Lite document.
///
/// Containers are ignored. Titles are trimmed; items without a `<res>` get
/// an empty URI.
pub fn parse_items(didl: &str) -> Vec<DidlItem> {
    let mut items = Vec::new();
    let mut reader = Reader::from_str(didl);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"item" => {
                let id = get_xml_attr(&e, b"id").unwrap_or_default();
                let Some(content) = inner_xml(&mut reader, didl, &e) else {
                    break;
                };

                let title = extract_xml_text(content, "title")
                    .map(|t| t.trim().to_string())
                    .unwrap_or_default();
                if title.is_empty() {
                    continue;
                }

                items.push(DidlItem {
                    id,
                    title,
                    uri: extract_xml_text(content, "res").unwrap_or_default(),
                    content: content.to_string(),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!("[Favorites] Stopped parsing DIDL-Lite: {:?}", e);
                break;
            }
            _ => {}
        }
    }

    items
}

/// Track fields of a `TrackMetaData` document. Missing fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub creator: String,
    pub album: String,
}

/// Parses the DIDL-Lite carried in `GetPositionInfo`'s `TrackMetaData`.
///
/// `NOT_IMPLEMENTED` and empty documents yield empty fields.
pub fn parse_track_metadata(didl: &str) -> TrackMetadata {
    let field = |name: &str| extract_xml_text(didl, name).unwrap_or_default();
    TrackMetadata {
        title: field("title"),
        creator: field("creator"),
        album: field("album"),
    }
}
