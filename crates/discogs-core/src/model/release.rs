use serde::{Deserialize, Serialize};

use crate::model::ids::{LabelId, MasterId, ReleaseId};

/// The normalized physical/digital format of a release.
///
/// Classified from the first `<format name>` string of the release by
/// lowercase substring match, first match wins (invariant 4): vinyl,
/// then cd, then cassette, then digital, else other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Vinyl,
    Cd,
    Cassette,
    Digital,
    Other,
}

impl Format {
    /// Classify a release by its first listed format name.
    ///
    /// Case-insensitive substring match, checked in the fixed order
    /// required by invariant 4: a format name containing both "vinyl" and
    /// "cd" substrings (which cannot happen for real Discogs data, but
    /// the rule is defined regardless) would classify as vinyl.
    #[must_use]
    pub fn classify(first_format_name: &str) -> Self {
        let lower = first_format_name.to_lowercase();
        if lower.contains("vinyl") || lower.contains("lp") || lower.contains("12\"") || lower.contains("7\"") {
            Self::Vinyl
        } else if lower.contains("cd") {
            Self::Cd
        } else if lower.contains("cassette") || lower.contains("tape") {
            Self::Cassette
        } else if lower.contains("digital") {
            Self::Digital
        } else {
            Self::Other
        }
    }
}

/// One track of a release's tracklist, as stored in `Release::tracks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub position: String,
    pub title: String,
    /// Parsed track duration in seconds; `None` if absent or unparseable
    /// (see spec §4.2 duration parsing rules).
    pub duration_secs: Option<i64>,
}

/// One `<video>` element of a release, stored denormalized in
/// `Release::videos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub uri: String,
    pub title: Option<String>,
    pub duration_secs: Option<i64>,
}

/// One `<format>` element of a release, stored denormalized in
/// `Release::format_details` (the full list, as opposed to `format`
/// which is the single classified enum value of the first one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDetail {
    pub name: String,
    pub qty: Option<u32>,
    pub text: Option<String>,
    pub descriptions: Vec<String>,
}

/// A specific physical or digital edition of a [`crate::model::Master`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub title: String,
    pub year: Option<i32>,
    pub country: Option<String>,
    pub format: Format,
    pub notes: Option<String>,
    pub master_id: Option<MasterId>,
    /// The first label referenced by the release, if any. A release may
    /// list several labels in the dump, but per spec §3 only the first
    /// is retained (both here and in the `ReleaseLabel` association).
    pub label_id: Option<LabelId>,
    pub tracks: Vec<Track>,
    pub videos: Vec<Video>,
    pub format_details: Vec<FormatDetail>,
    /// Sum of parseable track durations in seconds, or
    /// `format_qty * 2400` when no track has a parseable duration, or
    /// `None` when neither is available (invariant 5).
    pub total_duration_secs: Option<i64>,
}

impl Release {
    #[must_use]
    pub fn new(id: ReleaseId, title: String, format: Format) -> Self {
        Self {
            id,
            title,
            year: None,
            country: None,
            format,
            notes: None,
            master_id: None,
            label_id: None,
            tracks: Vec::new(),
            videos: Vec::new(),
            format_details: Vec::new(),
            total_duration_secs: None,
        }
    }
}
