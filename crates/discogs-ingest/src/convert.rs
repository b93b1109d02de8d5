//! Pure `discogs_X -> model_X | drop(reason)` functions (spec §4.2).
//!
//! Grounded on `tessitura_core::model::item::AudioFormat::from_extension`'s
//! shape: a small classifying function with no I/O, easy to unit test in
//! isolation from the decoder that feeds it.

use discogs_core::model::{
    Artist, Format, FormatDetail, Genre, Image, ImageType, ImageableType, Label, Master, Release,
    Track, Video,
};
use discogs_core::model::ids::{ArtistId, LabelId, MasterId, ReleaseId};

use crate::decode::{RawArtist, RawFormat, RawImage, RawLabel, RawMaster, RawRelease, RawTrack, RawVideo};

/// Why a record was dropped, for the `{discogs_id, field, reason}` warn
/// log line (spec §4.2, §7 `RecordDrop`).
#[derive(Debug, Clone)]
pub struct DropReason {
    pub discogs_id: Option<i64>,
    pub field: &'static str,
    pub reason: &'static str,
}

impl DropReason {
    fn new(discogs_id: Option<i64>, field: &'static str, reason: &'static str) -> Self {
        Self {
            discogs_id,
            field,
            reason,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First 4 characters of a `released`/`year` string, accepted iff the
/// parsed value falls in `(1800, 3000)` (spec §4.2).
fn parse_year(raw: &str) -> Option<i32> {
    let digits: String = raw.chars().take(4).collect();
    let year: i32 = digits.parse().ok()?;
    if year > 1800 && year < 3000 {
        Some(year)
    } else {
        None
    }
}

/// Accepts `"SS"`, `"MM:SS"`, `"HH:MM:SS"`; rejects non-numeric segments,
/// minutes/seconds > 59, hours > 99, or a total exceeding 7200s (spec
/// §4.2, invariant 5).
fn parse_duration_secs(raw: &str) -> Option<i64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    let segments: Vec<i64> = parts.iter().map(|p| p.parse::<i64>().ok()).collect::<Option<_>>()?;

    let total = match segments.as_slice() {
        [s] => *s,
        [m, s] => {
            if *s > 59 {
                return None;
            }
            m * 60 + s
        }
        [h, m, s] => {
            if *s > 59 || *m > 59 || *h > 99 {
                return None;
            }
            h * 3600 + m * 60 + s
        }
        _ => return None,
    };

    if total < 0 || total > 7200 {
        None
    } else {
        Some(total)
    }
}

fn convert_image(raw: &RawImage, imageable_type: ImageableType, imageable_id: i64) -> Option<Image> {
    if raw.uri.trim().is_empty() {
        return None;
    }
    Some(Image {
        url: raw.uri.clone(),
        image_type: ImageType::classify(&raw.type_attr),
        imageable_id,
        imageable_type,
        width: raw.width,
        height: raw.height,
        discogs_uri: raw.uri.clone(),
        discogs_uri_150: non_empty(&raw.uri_150),
        discogs_type: non_empty(&raw.type_attr),
    })
}

pub fn convert_artist(raw: RawArtist) -> Result<(Artist, Vec<Image>), DropReason> {
    let id = raw.id.filter(|&id| id != 0).ok_or_else(|| {
        DropReason::new(raw.id, "discogs_id", "missing or zero artist id")
    })?;
    let name = raw
        .name
        .as_deref()
        .and_then(non_empty)
        .ok_or_else(|| DropReason::new(Some(id), "name", "empty artist name"))?;

    let images = raw
        .images
        .iter()
        .filter_map(|img| convert_image(img, ImageableType::Artist, id))
        .collect();

    Ok((Artist::new(ArtistId::new(id), name), images))
}

pub fn convert_label(raw: RawLabel) -> Result<(Label, Vec<Image>), DropReason> {
    let id = raw.id.filter(|&id| id != 0).ok_or_else(|| {
        DropReason::new(raw.id, "discogs_id", "missing or zero label id")
    })?;
    let name = raw
        .name
        .as_deref()
        .and_then(non_empty)
        .ok_or_else(|| DropReason::new(Some(id), "name", "empty label name"))?;

    let mut label = Label::new(
        LabelId::new(id),
        name,
        raw.resource_url.unwrap_or_default(),
        raw.uri.unwrap_or_default(),
    );
    label.profile = raw.profile.and_then(|p| non_empty(&p));

    let images = raw
        .images
        .iter()
        .filter_map(|img| convert_image(img, ImageableType::Label, id))
        .collect();

    Ok((label, images))
}

pub fn convert_master(raw: RawMaster) -> Result<(Master, Vec<Image>), DropReason> {
    let id = raw.id.filter(|&id| id != 0).ok_or_else(|| {
        DropReason::new(raw.id, "discogs_id", "missing or zero master id")
    })?;
    let title = raw
        .title
        .as_deref()
        .and_then(non_empty)
        .ok_or_else(|| DropReason::new(Some(id), "title", "empty master title"))?;

    let mut master = Master::new(
        MasterId::new(id),
        title,
        raw.uri.unwrap_or_default(),
        raw.resource_url.unwrap_or_default(),
    );
    master.year = raw.year.as_deref().and_then(parse_year);
    master.main_release_id = raw.main_release_id.map(ReleaseId::new);
    master.main_release_resource_url = raw.main_release_resource_url;

    let images = raw
        .images
        .iter()
        .filter_map(|img| convert_image(img, ImageableType::Master, id))
        .collect();

    Ok((master, images))
}

fn convert_track(raw: &RawTrack) -> Track {
    Track {
        position: raw.position.clone(),
        title: raw.title.clone(),
        duration_secs: raw.duration.as_deref().and_then(parse_duration_secs),
    }
}

fn convert_video(raw: &RawVideo) -> Video {
    Video {
        uri: raw.uri.clone(),
        title: raw.title.clone(),
        duration_secs: raw.duration_secs,
    }
}

fn convert_format_detail(raw: &RawFormat) -> FormatDetail {
    FormatDetail {
        name: raw.name.clone(),
        qty: raw.qty.as_deref().and_then(|s| s.parse().ok()),
        text: raw.text.clone(),
        descriptions: raw.descriptions.clone(),
    }
}

/// Sum of parseable track durations, or `format_qty * 2400` when no
/// track has a parseable duration, or `None` when neither is available
/// (invariant 5).
fn total_duration_secs(tracks: &[Track], formats: &[FormatDetail]) -> Option<i64> {
    let durations: Vec<i64> = tracks.iter().filter_map(|t| t.duration_secs).collect();
    if !durations.is_empty() {
        return Some(durations.iter().sum());
    }
    formats
        .first()
        .and_then(|f| f.qty)
        .map(|qty| i64::from(qty) * 2400)
}

pub fn convert_release(raw: RawRelease) -> Result<(Release, Vec<Image>), DropReason> {
    let id = raw.id.filter(|&id| id != 0).ok_or_else(|| {
        DropReason::new(raw.id, "discogs_id", "missing or zero release id")
    })?;
    let title = raw
        .title
        .as_deref()
        .and_then(non_empty)
        .ok_or_else(|| DropReason::new(Some(id), "title", "empty release title"))?;

    let format = raw
        .formats
        .first()
        .map_or(Format::Other, |f| Format::classify(&f.name));

    let mut release = Release::new(ReleaseId::new(id), title, format);
    release.year = raw.released.as_deref().and_then(parse_year);
    release.country = raw.country.and_then(|c| non_empty(&c));
    release.notes = raw.notes.and_then(|n| non_empty(&n));
    release.master_id = raw.master_id.map(MasterId::new);
    release.label_id = raw.label_ids.first().copied().map(LabelId::new);
    release.tracks = raw.tracklist.iter().map(convert_track).collect();
    release.videos = raw.videos.iter().map(convert_video).collect();
    release.format_details = raw.formats.iter().map(convert_format_detail).collect();
    release.total_duration_secs = total_duration_secs(&release.tracks, &release.format_details);

    let images = raw
        .images
        .iter()
        .filter_map(|img| convert_image(img, ImageableType::Release, id))
        .collect();

    Ok((release, images))
}

/// Merges a `<genres>` and `<styles>` list into the single flat namespace
/// described in invariant 3: genre and style names share one identity.
pub fn merge_genre_names(genres: &[String], styles: &[String]) -> Vec<Genre> {
    genres
        .iter()
        .chain(styles.iter())
        .map(|n| Genre::new(n.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year_accepts_in_range() {
        assert_eq!(parse_year("1987-03"), Some(1987));
        assert_eq!(parse_year("2020"), Some(2020));
    }

    #[test]
    fn test_parse_year_rejects_out_of_range() {
        assert_eq!(parse_year("1800"), None);
        assert_eq!(parse_year("3000"), None);
        assert_eq!(parse_year("abcd"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_parse_duration_ss() {
        assert_eq!(parse_duration_secs("45"), Some(45));
    }

    #[test]
    fn test_parse_duration_mm_ss() {
        assert_eq!(parse_duration_secs("3:20"), Some(200));
    }

    #[test]
    fn test_parse_duration_hh_mm_ss() {
        assert_eq!(parse_duration_secs("1:02:03"), Some(3723));
    }

    #[test]
    fn test_parse_duration_rejects_invalid_segments() {
        assert_eq!(parse_duration_secs("3:99"), None);
        assert_eq!(parse_duration_secs("abc"), None);
        assert_eq!(parse_duration_secs("100:00:00"), None);
    }

    #[test]
    fn test_parse_duration_rejects_over_7200() {
        assert_eq!(parse_duration_secs("3:00:01"), None);
    }

    #[test]
    fn test_convert_artist_drops_zero_id() {
        let raw = RawArtist {
            id: Some(0),
            name: Some("X".to_string()),
            images: vec![],
        };
        assert!(convert_artist(raw).is_err());
    }

    #[test]
    fn test_convert_artist_drops_empty_name() {
        let raw = RawArtist {
            id: Some(1),
            name: Some("   ".to_string()),
            images: vec![],
        };
        assert!(convert_artist(raw).is_err());
    }

    #[test]
    fn test_convert_artist_success() {
        let raw = RawArtist {
            id: Some(1),
            name: Some("Aphex Twin".to_string()),
            images: vec![RawImage {
                uri: "http://x/img.jpg".to_string(),
                uri_150: String::new(),
                type_attr: "primary".to_string(),
                width: Some(400),
                height: Some(400),
            }],
        };
        let (artist, images) = convert_artist(raw).unwrap();
        assert_eq!(artist.id.get(), 1);
        assert_eq!(artist.name, "Aphex Twin");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].image_type, ImageType::Primary);
    }

    #[test]
    fn test_convert_image_drops_empty_uri() {
        let raw = RawImage {
            uri: String::new(),
            uri_150: String::new(),
            type_attr: "primary".to_string(),
            width: None,
            height: None,
        };
        assert!(convert_image(&raw, ImageableType::Artist, 1).is_none());
    }

    #[test]
    fn test_convert_release_boundary_1() {
        let raw = RawRelease {
            id: Some(5),
            title: Some("A".to_string()),
            released: Some("1987-03".to_string()),
            formats: vec![RawFormat {
                name: "Vinyl".to_string(),
                qty: Some("1".to_string()),
                text: None,
                descriptions: vec![],
            }],
            tracklist: vec![RawTrack {
                position: "A1".to_string(),
                title: "T".to_string(),
                duration: Some("3:20".to_string()),
            }],
            ..RawRelease::default()
        };
        let (release, _) = convert_release(raw).unwrap();
        assert_eq!(release.id.get(), 5);
        assert_eq!(release.title, "A");
        assert_eq!(release.year, Some(1987));
        assert_eq!(release.format, Format::Vinyl);
        assert_eq!(release.total_duration_secs, Some(200));
    }

    #[test]
    fn test_convert_release_boundary_2_falls_back_to_format_qty() {
        let raw = RawRelease {
            id: Some(5),
            title: Some("A".to_string()),
            formats: vec![RawFormat {
                name: "Vinyl".to_string(),
                qty: Some("2".to_string()),
                text: None,
                descriptions: vec![],
            }],
            tracklist: vec![RawTrack {
                position: "A1".to_string(),
                title: "T".to_string(),
                duration: None,
            }],
            ..RawRelease::default()
        };
        let (release, _) = convert_release(raw).unwrap();
        assert_eq!(release.total_duration_secs, Some(4800));
    }

    #[test]
    fn test_convert_release_keeps_first_label_only() {
        let raw = RawRelease {
            id: Some(1),
            title: Some("A".to_string()),
            label_ids: vec![10, 20],
            ..RawRelease::default()
        };
        let (release, _) = convert_release(raw).unwrap();
        assert_eq!(release.label_id.map(|l| l.get()), Some(10));
    }

    #[test]
    fn test_merge_genre_names_shares_namespace() {
        let genres = vec!["Electronic".to_string()];
        let styles = vec!["Techno".to_string()];
        let merged = merge_genre_names(&genres, &styles);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "Electronic");
        assert_eq!(merged[1].name, "Techno");
    }
}
