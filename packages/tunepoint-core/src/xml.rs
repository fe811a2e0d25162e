//! XML helpers shared by the Sonos client, the prober and the DIDL-Lite
//! parser.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Extracts text content from the first occurrence of an XML element.
///
/// Searches for an element by its local name (ignoring namespace prefixes)
/// and returns its content with HTML entities decoded. Any markup inside the
/// element is returned verbatim.
///
/// # Example
/// ```ignore
/// let xml = r#"<u:CurrentVolume>42</u:CurrentVolume>"#;
/// assert_eq!(extract_xml_text(xml, "CurrentVolume"), Some("42".to_string()));
/// ```
pub fn extract_xml_text(xml: &str, element_name: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let target_bytes = element_name.as_bytes();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == target_bytes => {
                let raw = inner_xml(&mut reader, xml, &e)?;
                return Some(html_escape::decode_html_entities(raw).into_owned());
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == target_bytes => {
                return Some(String::new());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Returns the raw source text between `start` and its matching end tag.
///
/// The reader must have just produced `start`; on return it is positioned
/// after the end tag.
pub(crate) fn inner_xml<'a>(
    reader: &mut Reader<&'a [u8]>,
    source: &'a str,
    start: &BytesStart<'_>,
) -> Option<&'a str> {
    let span = reader.read_to_end(start.name()).ok()?;
    source.get(span.start as usize..span.end as usize)
}

/// Gets an attribute value from an XML element.
///
/// # Arguments
/// * `elem` - The XML element to search
/// * `attr_name` - The attribute name as bytes (e.g., `b"id"`)
pub fn get_xml_attr(elem: &BytesStart, attr_name: &[u8]) -> Option<String> {
    elem.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == attr_name)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Escapes XML special characters for embedding in XML content.
///
/// This escapes all five XML special characters as required by the XML spec:
/// - `&` → `&amp;`
/// - `<` → `&lt;`
/// - `>` → `&gt;`
/// - `"` → `&quot;`
/// - `'` → `&apos;`
///
/// Used for SOAP arguments and DIDL-Lite metadata values.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_ignores_namespace_prefix() {
        let xml = r#"<s:Body><u:GetVolumeResponse><CurrentVolume>42</CurrentVolume></u:GetVolumeResponse></s:Body>"#;
        assert_eq!(extract_xml_text(xml, "CurrentVolume"), Some("42".to_string()));
    }

    #[test]
    fn extract_decodes_entities() {
        let xml = "<Result>&lt;DIDL-Lite&gt;&lt;item id=&quot;1&quot;/&gt;&lt;/DIDL-Lite&gt;</Result>";
        assert_eq!(
            extract_xml_text(xml, "Result").as_deref(),
            Some(r#"<DIDL-Lite><item id="1"/></DIDL-Lite>"#)
        );
    }

    #[test]
    fn extract_keeps_nested_markup() {
        let xml = "<root><friendlyName>Den <b>x</b></friendlyName></root>";
        assert_eq!(
            extract_xml_text(xml, "friendlyName").as_deref(),
            Some("Den <b>x</b>")
        );
    }

    #[test]
    fn extract_missing_element_is_none() {
        assert_eq!(extract_xml_text("<a><b>1</b></a>", "c"), None);
    }

    #[test]
    fn extract_empty_element_is_empty_string() {
        assert_eq!(
            extract_xml_text("<a><TrackMetaData/></a>", "TrackMetaData"),
            Some(String::new())
        );
    }

    #[test]
    fn escape_covers_all_special_characters() {
        assert_eq!(escape_xml("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(escape_xml("<a href=\"x\">'"), "&lt;a href=&quot;x&quot;&gt;&apos;");
    }
}
