//! Decodes `artists.xml.gz` into [`RawArtist`] records (spec §4.1).

use std::path::Path;

use quick_xml::events::Event;
use tokio_util::sync::CancellationToken;

use super::raw::{RawArtist, RawImage};
use super::reader::{find_attr, DumpReader};
use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    None,
    Images,
    /// `urls` / `namevariations` / `aliases` / `members` / `groups`: none
    /// of these are needed by the domain model, so their contents (which
    /// include nested `id`/`name` elements that would otherwise collide
    /// with the top-level fields) are skipped wholesale.
    Skip,
}

#[derive(Debug, Default)]
struct ArtistParser {
    record: RawArtist,
    container: Container,
    field: Option<Field>,
}

impl Default for Container {
    fn default() -> Self {
        Self::None
    }
}

impl ArtistParser {
    fn process(&mut self, ev: &Event<'_>) -> Result<()> {
        match ev {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if self.container == Container::None {
                    match name {
                        b"id" => self.field = Some(Field::Id),
                        b"name" => self.field = Some(Field::Name),
                        b"images" => self.container = Container::Images,
                        b"urls" | b"namevariations" | b"aliases" | b"members" | b"groups" => {
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
                        if matches!(
                            name,
                            b"urls" | b"namevariations" | b"aliases" | b"members" | b"groups"
                        ) =>
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

/// Records emitted by a single decode pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeStats {
    pub records_emitted: u64,
}

/// Streams `path` (gzip-compressed `artists.xml`), invoking `on_record`
/// once per fully-parsed `<artist>` element.
///
/// Blocking/synchronous by design: callers run this inside
/// `tokio::task::spawn_blocking` and use `Sender::blocking_send` from
/// `on_record` (spec §4.1, §5).
pub fn decode_artists(
    path: &Path,
    cancel: &CancellationToken,
    mut on_record: impl FnMut(RawArtist) -> Result<()>,
) -> Result<DecodeStats> {
    let mut reader = DumpReader::open(path)?;
    let mut parser = ArtistParser::default();
    let mut in_artist = false;
    let mut emitted = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let ev = reader.read_event()?;
        match &ev {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == b"artist" => {
                in_artist = true;
                parser = ArtistParser::default();
            }
            Event::End(e) if e.local_name().as_ref() == b"artist" => {
                in_artist = false;
                on_record(std::mem::take(&mut parser.record))?;
                emitted += 1;
            }
            _ if in_artist => parser.process(&ev)?,
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
    fn test_decode_single_artist() {
        let xml = r#"<artists><artist>
            <images><image height="400" width="400" type="primary" uri="http://x/img.jpg" uri150="http://x/img150.jpg"/></images>
            <id>1</id>
            <name>Aphex Twin</name>
            <namevariations><name>AFX</name></namevariations>
        </artist></artists>"#;
        let file = write_gz(xml);

        let mut records = Vec::new();
        let stats = decode_artists(file.path(), &CancellationToken::new(), |r| {
            records.push(r);
            Ok(())
        })
        .unwrap();

        assert_eq!(stats.records_emitted, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some(1));
        assert_eq!(records[0].name.as_deref(), Some("Aphex Twin"));
        assert_eq!(records[0].images.len(), 1);
        assert_eq!(records[0].images[0].uri, "http://x/img.jpg");
    }

    #[test]
    fn test_decode_skips_namevariations_ids() {
        // A namevariations/aliases block with an id-like child must never
        // be mistaken for the artist's own id.
        let xml = r#"<artists><artist>
            <id>2</id>
            <name>Four Tet</name>
            <aliases><name id="999">Kieran Hebden</name></aliases>
        </artist></artists>"#;
        let file = write_gz(xml);

        let mut records = Vec::new();
        decode_artists(file.path(), &CancellationToken::new(), |r| {
            records.push(r);
            Ok(())
        })
        .unwrap();

        assert_eq!(records[0].id, Some(2));
        assert_eq!(records[0].name.as_deref(), Some("Four Tet"));
    }

    #[test]
    fn test_decode_honors_cancellation() {
        let xml = r#"<artists><artist><id>1</id><name>A</name></artist></artists>"#;
        let file = write_gz(xml);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = decode_artists(file.path(), &cancel, |_| Ok(())).unwrap_err();
        assert!(matches!(err, IngestError::Cancelled));
    }
}
