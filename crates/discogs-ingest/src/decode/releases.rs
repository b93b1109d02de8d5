//! Decodes `releases.xml.gz` into [`RawRelease`] records (spec §4.1).
//!
//! Grounded on `disco-quick`'s `ReleaseParser`/`ReleasesReader`: a flat
//! state enum for the release's direct children, with `Vec::last_mut()`
//! used as the "current nested record" instead of a separate scratch
//! struct for the repeating child elements (`artists`, `tracklist`,
//! `videos`, `formats`) that don't nest any further within themselves.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use tokio_util::sync::CancellationToken;

use super::raw::{RawFormat, RawImage, RawRelease, RawTrack, RawVideo};
use super::reader::{find_attr, DumpReader};
use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Title,
    Country,
    Released,
    Notes,
    MasterId,
    Genres,
    Styles,
    Labels,
    Artists,
    Formats,
    TrackList,
    Videos,
    Images,
    /// `identifiers` / `companies` / `series` / `data_quality`: not
    /// needed by the domain model.
    Skip,
}

impl Default for State {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtistField {
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackField {
    Position,
    Title,
    Duration,
}

#[derive(Debug, Default)]
struct ReleaseParser {
    record: RawRelease,
    state: State,
    artist_field: Option<ArtistField>,
    track_field: Option<TrackField>,
    in_format_descriptions: bool,
    in_video_title: bool,
}

impl ReleaseParser {
    fn new(id: Option<i64>) -> Self {
        Self {
            record: RawRelease {
                id,
                ..RawRelease::default()
            },
            ..Self::default()
        }
    }

    fn process(&mut self, ev: &Event<'_>) -> Result<()> {
        match ev {
            Event::Start(e) => self.on_start(e)?,
            Event::Empty(e) => self.on_empty(e),
            Event::Text(t) => self.on_text(t)?,
            Event::End(e) => self.on_end(e),
            _ => {}
        }
        Ok(())
    }

    fn on_start(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let name = e.local_name();
        let name = name.as_ref();
        match self.state {
            State::None => {
                self.state = match name {
                    b"title" => State::Title,
                    b"country" => State::Country,
                    b"released" => State::Released,
                    b"notes" => State::Notes,
                    b"master_id" => State::MasterId,
                    b"genres" => State::Genres,
                    b"styles" => State::Styles,
                    b"labels" => State::Labels,
                    b"artists" | b"extraartists" => State::Artists,
                    b"formats" => State::Formats,
                    b"tracklist" => State::TrackList,
                    b"videos" => State::Videos,
                    b"images" => State::Images,
                    b"identifiers" | b"companies" | b"series" | b"data_quality" => State::Skip,
                    _ => State::None,
                };
            }
            State::Artists => {
                if name == b"id" {
                    self.artist_field = Some(ArtistField::Id);
                }
            }
            State::TrackList => {
                if name == b"track" {
                    self.record.tracklist.push(RawTrack::default());
                } else {
                    self.track_field = match name {
                        b"position" => Some(TrackField::Position),
                        b"title" => Some(TrackField::Title),
                        b"duration" => Some(TrackField::Duration),
                        _ => None,
                    };
                }
            }
            State::Videos => {
                if name == b"video" {
                    self.record.videos.push(RawVideo {
                        uri: find_attr(e, "src").unwrap_or_default(),
                        title: None,
                        duration_secs: find_attr(e, "duration").and_then(|s| s.parse().ok()),
                    });
                } else if name == b"title" {
                    self.in_video_title = true;
                }
            }
            State::Formats => {
                if name == b"format" {
                    self.record.formats.push(RawFormat {
                        name: find_attr(e, "name").unwrap_or_default(),
                        qty: find_attr(e, "qty"),
                        text: find_attr(e, "text"),
                        descriptions: Vec::new(),
                    });
                } else if name == b"descriptions" {
                    self.in_format_descriptions = true;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_empty(&mut self, e: &BytesStart<'_>) {
        let name = e.local_name();
        let name = name.as_ref();
        match self.state {
            State::Images if name == b"image" => {
                self.record.images.push(RawImage {
                    uri: find_attr(e, "uri").unwrap_or_default(),
                    uri_150: find_attr(e, "uri150").unwrap_or_default(),
                    type_attr: find_attr(e, "type").unwrap_or_default(),
                    width: find_attr(e, "width").and_then(|s| s.parse().ok()),
                    height: find_attr(e, "height").and_then(|s| s.parse().ok()),
                });
            }
            State::Labels if name == b"label" => {
                if let Some(id) = find_attr(e, "id").and_then(|s| s.parse().ok()) {
                    self.record.label_ids.push(id);
                }
            }
            State::Formats if name == b"format" => {
                self.record.formats.push(RawFormat {
                    name: find_attr(e, "name").unwrap_or_default(),
                    qty: find_attr(e, "qty"),
                    text: find_attr(e, "text"),
                    descriptions: Vec::new(),
                });
            }
            State::Videos if name == b"video" => {
                self.record.videos.push(RawVideo {
                    uri: find_attr(e, "src").unwrap_or_default(),
                    title: None,
                    duration_secs: find_attr(e, "duration").and_then(|s| s.parse().ok()),
                });
            }
            _ => {}
        }
    }

    fn on_text(&mut self, t: &quick_xml::events::BytesText<'_>) -> Result<()> {
        let text = t.unescape()?.into_owned();
        match self.state {
            State::Title => self.record.title = Some(text),
            State::Country => self.record.country = Some(text),
            State::Released => self.record.released = Some(text),
            State::Notes => self.record.notes = Some(text),
            State::MasterId => self.record.master_id = text.trim().parse().ok(),
            State::Genres => self.record.genres.push(text),
            State::Styles => self.record.styles.push(text),
            State::Artists if self.artist_field == Some(ArtistField::Id) => {
                if let Ok(id) = text.trim().parse() {
                    self.record.artist_ids.push(id);
                }
            }
            State::TrackList => {
                if let (Some(field), Some(track)) = (self.track_field, self.record.tracklist.last_mut()) {
                    match field {
                        TrackField::Position => track.position = text,
                        TrackField::Title => track.title = text,
                        TrackField::Duration => track.duration = Some(text),
                    }
                }
            }
            State::Videos if self.in_video_title => {
                if let Some(video) = self.record.videos.last_mut() {
                    video.title = Some(text);
                }
            }
            State::Formats if self.in_format_descriptions => {
                if let Some(format) = self.record.formats.last_mut() {
                    format.descriptions.push(text);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_end(&mut self, e: &quick_xml::events::BytesEnd<'_>) {
        let name = e.local_name();
        let name = name.as_ref();
        match self.state {
            State::Artists if name == b"id" => self.artist_field = None,
            State::TrackList if matches!(name, b"position" | b"title" | b"duration") => {
                self.track_field = None;
            }
            State::Videos if name == b"title" => self.in_video_title = false,
            State::Formats if name == b"descriptions" => self.in_format_descriptions = false,
            _ if is_container_close(self.state, name) => self.state = State::None,
            _ => {}
        }
    }
}

fn is_container_close(state: State, name: &[u8]) -> bool {
    matches!(
        (state, name),
        (State::Title, b"title")
            | (State::Country, b"country")
            | (State::Released, b"released")
            | (State::Notes, b"notes")
            | (State::MasterId, b"master_id")
            | (State::Genres, b"genres")
            | (State::Styles, b"styles")
            | (State::Labels, b"labels")
            | (State::Artists, b"artists" | b"extraartists")
            | (State::Formats, b"formats")
            | (State::TrackList, b"tracklist")
            | (State::Videos, b"videos")
            | (State::Images, b"images")
            | (
                State::Skip,
                b"identifiers" | b"companies" | b"series" | b"data_quality",
            )
    )
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeStats {
    pub records_emitted: u64,
}

/// Streams `path` (gzip-compressed `releases.xml`), invoking `on_record`
/// once per fully-parsed `<release>` element. The release's id is read
/// from the `id` attribute of `<release>` itself.
pub fn decode_releases(
    path: &Path,
    cancel: &CancellationToken,
    mut on_record: impl FnMut(RawRelease) -> Result<()>,
) -> Result<DecodeStats> {
    let mut reader = DumpReader::open(path)?;
    let mut parser: Option<ReleaseParser> = None;
    let mut emitted = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let ev = reader.read_event()?;
        match &ev {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == b"release" => {
                let id = find_attr(e, "id").and_then(|s| s.parse().ok());
                parser = Some(ReleaseParser::new(id));
            }
            Event::End(e) if e.local_name().as_ref() == b"release" => {
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
    fn test_decode_single_release_boundary_1() {
        // Boundary scenario #1 from the testable-properties table.
        let xml = r#"<releases><release id="5">
            <title>A</title>
            <released>1987-03</released>
            <formats><format name="Vinyl" qty="1"/></formats>
            <tracklist><track><position>A1</position><title>T</title><duration>3:20</duration></track></tracklist>
        </release></releases>"#;
        let file = write_gz(xml);

        let mut records = Vec::new();
        let stats = decode_releases(file.path(), &CancellationToken::new(), |r| {
            records.push(r);
            Ok(())
        })
        .unwrap();

        assert_eq!(stats.records_emitted, 1);
        let r = &records[0];
        assert_eq!(r.id, Some(5));
        assert_eq!(r.title.as_deref(), Some("A"));
        assert_eq!(r.released.as_deref(), Some("1987-03"));
        assert_eq!(r.formats.len(), 1);
        assert_eq!(r.formats[0].name, "Vinyl");
        assert_eq!(r.formats[0].qty.as_deref(), Some("1"));
        assert_eq!(r.tracklist.len(), 1);
        assert_eq!(r.tracklist[0].position, "A1");
        assert_eq!(r.tracklist[0].duration.as_deref(), Some("3:20"));
    }

    #[test]
    fn test_decode_release_with_artists_labels_genres() {
        let xml = r#"<releases><release id="9">
            <title>B</title>
            <artists><artist><id>1</id><name>X</name></artist></artists>
            <labels><label id="10" name="Warp" catno="WAP1"/></labels>
            <genres><genre>Electronic</genre></genres>
            <styles><style>Techno</style></styles>
            <master_id>3</master_id>
        </release></releases>"#;
        let file = write_gz(xml);

        let mut records = Vec::new();
        decode_releases(file.path(), &CancellationToken::new(), |r| {
            records.push(r);
            Ok(())
        })
        .unwrap();

        let r = &records[0];
        assert_eq!(r.artist_ids, vec![1]);
        assert_eq!(r.label_ids, vec![10]);
        assert_eq!(r.genres, vec!["Electronic".to_string()]);
        assert_eq!(r.styles, vec!["Techno".to_string()]);
        assert_eq!(r.master_id, Some(3));
    }

    #[test]
    fn test_decode_video_with_nested_title() {
        let xml = r#"<releases><release id="1">
            <title>C</title>
            <videos><video duration="180" src="http://example.com/v"><title>Clip</title></video></videos>
        </release></releases>"#;
        let file = write_gz(xml);

        let mut records = Vec::new();
        decode_releases(file.path(), &CancellationToken::new(), |r| {
            records.push(r);
            Ok(())
        })
        .unwrap();

        let video = &records[0].videos[0];
        assert_eq!(video.uri, "http://example.com/v");
        assert_eq!(video.duration_secs, Some(180));
        assert_eq!(video.title.as_deref(), Some("Clip"));
    }
}
