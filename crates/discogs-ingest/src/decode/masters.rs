//! Decodes `masters.xml.gz` into [`RawMaster`] records (spec §4.1).

use std::path::Path;

use quick_xml::events::Event;
use tokio_util::sync::CancellationToken;

use super::raw::{RawImage, RawMaster};
use super::reader::{find_attr, DumpReader};
use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Title,
    Year,
    MainRelease,
    Genres,
    Styles,
    Artists,
    Images,
    /// `data_quality` / `videos`: not needed by the domain model.
    Skip,
}

impl Default for State {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Debug, Default)]
struct MasterParser {
    record: RawMaster,
    state: State,
    /// Set while inside an `<artist>` credit nested in `<artists>`, tracks
    /// whether the next `Text` belongs to that credit's `<id>`.
    in_artist_id: bool,
}

impl MasterParser {
    fn new(id: Option<i64>) -> Self {
        Self {
            record: RawMaster {
                id,
                ..RawMaster::default()
            },
            state: State::None,
            in_artist_id: false,
        }
    }

    fn process(&mut self, ev: &Event<'_>) -> Result<()> {
        match ev {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                match self.state {
                    State::None => match name {
                        b"title" => self.state = State::Title,
                        b"year" => self.state = State::Year,
                        b"main_release" => self.state = State::MainRelease,
                        b"genres" => self.state = State::Genres,
                        b"styles" => self.state = State::Styles,
                        b"artists" => self.state = State::Artists,
                        b"images" => self.state = State::Images,
                        b"data_quality" | b"videos" => self.state = State::Skip,
                        _ => {}
                    },
                    State::Artists => {
                        if name == b"id" {
                            self.in_artist_id = true;
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if self.state == State::Images && e.local_name().as_ref() == b"image" {
                    self.record.images.push(parse_raw_image(e));
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                match self.state {
                    State::Title => self.record.title = Some(text),
                    State::Year => self.record.year = Some(text),
                    State::MainRelease => {
                        self.record.main_release_id = text.trim().parse().ok();
                    }
                    State::Genres => self.record.genres.push(text),
                    State::Styles => self.record.styles.push(text),
                    State::Artists if self.in_artist_id => {
                        if let Ok(id) = text.trim().parse() {
                            self.record.artist_ids.push(id);
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                match self.state {
                    State::Artists if name == b"id" => self.in_artist_id = false,
                    State::Title | State::Year | State::MainRelease | State::Genres | State::Styles
                    | State::Artists | State::Images | State::Skip
                        if matches!(
                            name,
                            b"title"
                                | b"year"
                                | b"main_release"
                                | b"genres"
                                | b"styles"
                                | b"artists"
                                | b"images"
                                | b"data_quality"
                                | b"videos"
                        ) =>
                    {
                        self.state = State::None;
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

/// Streams `path` (gzip-compressed `masters.xml`), invoking `on_record`
/// once per fully-parsed `<master>` element. The master's id is read
/// from the `id` attribute of `<master>` itself, per the Discogs dump
/// schema (unlike artists/labels, where `id` is a child element).
pub fn decode_masters(
    path: &Path,
    cancel: &CancellationToken,
    mut on_record: impl FnMut(RawMaster) -> Result<()>,
) -> Result<DecodeStats> {
    let mut reader = DumpReader::open(path)?;
    let mut parser: Option<MasterParser> = None;
    let mut emitted = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let ev = reader.read_event()?;
        match &ev {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == b"master" => {
                let id = find_attr(e, "id").and_then(|s| s.parse().ok());
                parser = Some(MasterParser::new(id));
            }
            Event::End(e) if e.local_name().as_ref() == b"master" => {
                if let Some(p) = parser.take() {
                    on_record(p.record)?;
                    emitted += 1;
                }
            }
            _ => {
                if let Some(p) = parser.as_mut() {
                    p.process(&ev)?;
                }
            }
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
    fn test_decode_single_master() {
        let xml = r#"<masters><master id="1">
            <main_release>155102</main_release>
            <images><image height="400" width="400" type="primary" uri="http://x/img.jpg" uri150=""/></images>
            <artists><artist><id>72</id><name>Persuader, The</name></artist></artists>
            <genres><genre>Electronic</genre></genres>
            <styles><style>Techno</style></styles>
            <year>1994</year>
            <title>Stockholm</title>
        </master></masters>"#;
        let file = write_gz(xml);

        let mut records = Vec::new();
        let stats = decode_masters(file.path(), &CancellationToken::new(), |r| {
            records.push(r);
            Ok(())
        })
        .unwrap();

        assert_eq!(stats.records_emitted, 1);
        let m = &records[0];
        assert_eq!(m.id, Some(1));
        assert_eq!(m.title.as_deref(), Some("Stockholm"));
        assert_eq!(m.year.as_deref(), Some("1994"));
        assert_eq!(m.main_release_id, Some(155_102));
        assert_eq!(m.artist_ids, vec![72]);
        assert_eq!(m.genres, vec!["Electronic".to_string()]);
        assert_eq!(m.styles, vec!["Techno".to_string()]);
        assert_eq!(m.images.len(), 1);
    }
}
