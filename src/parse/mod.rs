// src/parse/mod.rs
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use std::path::Path;
use tracing::{debug, warn};

/// One record element of the feed: its tag, attributes and child fields in
/// document order. Immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    tag: String,
    attributes: Vec<(String, String)>,
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Builder pattern: add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Builder pattern: add a child field
    pub fn with_field(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.push((name.into(), text.into()));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text of the first child field called `name`, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Read and parse the feed stored at `path`.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let xml = std::fs::read_to_string(path.as_ref())?;
    parse_records(&xml)
}

/// Parse a feed document.
///
/// Every child element of the root is a record; every child element of a
/// record is a field whose text (CDATA included) becomes the field value,
/// trimmed as a whole.
/// Deeper nesting contributes its text to the enclosing field.
#[tracing::instrument(level = "info", skip(xml), fields(bytes = xml.len()))]
pub fn parse_records(xml: &str) -> Result<Vec<RawRecord>> {
    let mut reader = Reader::from_str(xml);

    let mut records = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<RawRecord> = None;
    let mut field: Option<(String, String)> = None;

    loop {
        let event = reader.read_event().map_err(|e| xml_error(&reader, e))?;
        match event {
            XmlEvent::Start(start) => {
                depth += 1;
                match depth {
                    2 => current = Some(start_record(&reader, &start)?),
                    3 => field = Some((element_name(&start), String::new())),
                    _ => {}
                }
            }
            XmlEvent::Empty(start) => match depth + 1 {
                2 => records.push(start_record(&reader, &start)?),
                3 => {
                    if let Some(record) = current.as_mut() {
                        record.fields.push((element_name(&start), String::new()));
                    }
                }
                _ => {}
            },
            XmlEvent::Text(text) => {
                if let Some((_, value)) = field.as_mut() {
                    let text = text.unescape().map_err(|e| xml_error(&reader, e))?;
                    value.push_str(&text);
                }
            }
            XmlEvent::CData(data) => {
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            XmlEvent::End(_) => {
                match depth {
                    2 => records.extend(current.take()),
                    3 => {
                        if let (Some(record), Some((name, value))) = (current.as_mut(), field.take())
                        {
                            record.fields.push((name, value.trim().to_string()));
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    if records.is_empty() {
        warn!("feed contains no records; nothing will be printed");
    } else {
        debug!(count = records.len(), "parsed records");
    }
    Ok(records)
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn start_record(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<RawRecord> {
    let mut record = RawRecord::new(element_name(start));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(reader, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| xml_error(reader, e))?;
        record.attributes.push((key, value.into_owned()));
    }
    Ok(record)
}

fn xml_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> Error {
    Error::Xml {
        position: reader.buffer_position(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Kursdaten>
  <Kurs id="17" typ="regulär">
    <Kategorie>Halle, Klettern</Kategorie>
    <Bezeichnung>Klettertreff &amp; Technik</Bezeichnung>
    <Ort>Magic Mountain</Ort>
    <Zielgruppe/>
    <Terminbeschreibung><![CDATA[Toprope <b>und</b> Vorstieg]]></Terminbeschreibung>
  </Kurs>
  <Kurs id="18">
    <Kategorie>Wandern</Kategorie>
  </Kurs>
</Kursdaten>"#;

    #[test]
    fn parses_records_fields_and_attributes() {
        let records = parse_records(FEED).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.tag(), "Kurs");
        assert_eq!(first.attribute("id"), Some("17"));
        assert_eq!(first.attribute("typ"), Some("regulär"));
        assert_eq!(first.field("Kategorie"), Some("Halle, Klettern"));
        assert_eq!(first.field("Bezeichnung"), Some("Klettertreff & Technik"));
        assert_eq!(first.field("Zielgruppe"), Some(""));
        assert_eq!(
            first.field("Terminbeschreibung"),
            Some("Toprope <b>und</b> Vorstieg")
        );
        assert_eq!(first.field("Leiter"), None);

        let names: Vec<_> = first.fields().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            ["Kategorie", "Bezeichnung", "Ort", "Zielgruppe", "Terminbeschreibung"]
        );
        assert_eq!(records[1].field("Kategorie"), Some("Wandern"));
    }

    #[test]
    fn keeps_spaces_between_text_and_cdata() {
        let xml = "<Kursdaten><Kurs>\n  <Terminbeschreibung>\n    Toprope <![CDATA[<b>und</b>]]> Vorstieg\n  </Terminbeschreibung>\n</Kurs></Kursdaten>";
        let records = parse_records(xml).unwrap();
        assert_eq!(
            records[0].field("Terminbeschreibung"),
            Some("Toprope <b>und</b> Vorstieg")
        );
    }

    #[test]
    fn empty_feed_yields_no_records() {
        let records = parse_records("<Kursdaten></Kursdaten>").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_feed_is_an_error() {
        let err = parse_records("<Kursdaten><Kurs></Kursdaten>").unwrap_err();
        assert!(matches!(err, Error::Xml { .. }), "got {err:?}");
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.xml");
        std::fs::write(&path, FEED).unwrap();
        assert_eq!(load_records(&path).unwrap().len(), 2);
    }
}
