//! Decodes `labels.xml.gz` into [`RawLabel`] records (spec §4.1).

use std::path::Path;

use quick_xml::events::Event;
use tokio_util::sync::CancellationToken;

use super::raw::{RawImage, RawLabel};
use super::reader::{find_attr, DumpReader};
use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Name,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    None,
    Images,
    /// `contactinfo` / `data_quality` / `urls` / `sublabels` /
    /// `parentLabel`: none needed, and `sublabels` nests a `<label>`
    /// with its own `id`/`name` that must not collide with the parent.
    Skip,
}

impl Default for Container {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Debug, Default)]
struct LabelParser {
    record: RawLabel,
    container: Container,
    field: Option<Field>,
}

impl LabelParser {
    fn process(&mut self, ev: &Event<'_>) -> Result<()> {
        match ev {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if self.container == Container::None {
                    match name {
                        b"id" => self.field = Some(Field::Id),
                        b"name" => self.field = Some(Field::Name),
                        b"profile" => self.field = Some(Field::Profile),
                        b"images" => self.container = Container::Images,
                        b"contactinfo" | b"data_quality" | b"urls" | b"sublabels" => {
                            self.container = Container::Skip;
                        }
                        _ => {}
                    }
                }
            }
            Event::Empty(e) => {
                if self.container == Container::Images && e.local_name().as_ref() == b"image" {
                    self.record.images.push(parse_raw_image(e));
                }
            }
            Event::Text(t) => {
                if self.container == Container::None {
                    if let Some(field) = self.field {
                        let text = t.unescape()?.into_owned();
                        match field {
                            Field::Id => self.record.id = text.trim().parse().ok(),
                            Field::Name => self.record.name = Some(text),
                            Field::Profile => self.record.profile = Some(text),
                        }
                    }
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                match self.container {
                    Container::None => self.field = None,
                    Container::Images if name == b"images" => self.container = Container::None,
                    Container::Skip
                        if matches!(name, b"contactinfo" | b"data_quality" | b"urls" | b"sublabels") =>
                    {
                        self.container = Container::None;
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn parse_raw_image(e: &quick_xml::events::BytesStart<'_>) -> RawImage {
    RawImage {
        uri: find_attr(e, "uri").unwrap_or_default(),
        uri_150: find_attr(e, "uri150").unwrap_or_default(),
        type_attr: find_attr(e, "type").unwrap_or_default(),
        width: find_attr(e, "width").and_then(|s| s.parse().ok()),
        height: find_attr(e, "height").and_then(|s| s.parse().ok()),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeStats {
    pub records_emitted: u64,
}

/// Streams `path` (gzip-compressed `labels.xml`), invoking `on_record`
/// once per fully-parsed `<label>` element.
pub fn decode_labels(
    path: &Path,
    cancel: &CancellationToken,
    mut on_record: impl FnMut(RawLabel) -> Result<()>,
) -> Result<DecodeStats> {
    let mut reader = DumpReader::open(path)?;
    let mut parser = LabelParser::default();
    let mut in_label = false;
    let mut emitted = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let ev = reader.read_event()?;
        match &ev {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == b"label" => {
                in_label = true;
                parser = LabelParser::default();
            }
            Event::End(e) if e.local_name().as_ref() == b"label" => {
                in_label = false;
                on_record(std::mem::take(&mut parser.record))?;
                emitted += 1;
            }
            _ if in_label => parser.process(&ev)?,
            _ => {}
        }
    }

    Ok(DecodeStats {
        records_emitted: emitted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_gz(xml: &str) -> tempfile::NamedTempFile {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let file = tempfile::NamedTempFile::new().unwrap();
        let mut enc = GzEncoder::new(file.reopen().unwrap(), Compression::default());
        enc.write_all(xml.as_bytes()).unwrap();
        enc.finish().unwrap();
        file
    }

    #[test]
    fn test_decode_single_label() {
        let xml = r#"<labels><label>
            <id>10</id>
            <name>Warp Records</name>
            <profile>Electronic label</profile>
            <sublabels><label><id>99</id><name>Other</name></label></sublabels>
        </label></labels>"#;
        let file = write_gz(xml);

        let mut records = Vec::new();
        let stats = decode_labels(file.path(), &CancellationToken::new(), |r| {
            records.push(r);
            Ok(())
        })
        .unwrap();

        assert_eq!(stats.records_emitted, 1);
        assert_eq!(records[0].id, Some(10));
        assert_eq!(records[0].name.as_deref(), Some("Warp Records"));
        assert_eq!(records[0].profile.as_deref(), Some("Electronic label"));
    }
}
