//! Intermediate "discogs_X" records a decoder produces, before the
//! Record Converter (spec §4.2) turns them into domain model types or
//! drops them.
//!
//! Fields are kept as raw strings where the source format requires
//! parsing/validation (`year`, `duration`, `qty`) so that the converter —
//! not the decoder — owns every drop/parse rule.

#[derive(Debug, Clone, Default)]
pub struct RawImage {
    pub uri: String,
    pub uri_150: String,
    pub type_attr: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct RawArtist {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub images: Vec<RawImage>,
}

#[derive(Debug, Clone, Default)]
pub struct RawLabel {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub profile: Option<String>,
    pub resource_url: Option<String>,
    pub uri: Option<String>,
    pub images: Vec<RawImage>,
}

#[derive(Debug, Clone, Default)]
pub struct RawMaster {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub main_release_id: Option<i64>,
    pub main_release_resource_url: Option<String>,
    pub uri: Option<String>,
    pub resource_url: Option<String>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub artist_ids: Vec<i64>,
    pub images: Vec<RawImage>,
}

#[derive(Debug, Clone, Default)]
pub struct RawTrack {
    pub position: String,
    pub title: String,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawVideo {
    pub uri: String,
    pub title: Option<String>,
    pub duration_secs: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct RawFormat {
    pub name: String,
    pub qty: Option<String>,
    pub text: Option<String>,
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawRelease {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub released: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
    pub master_id: Option<i64>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub artist_ids: Vec<i64>,
    pub label_ids: Vec<i64>,
    pub formats: Vec<RawFormat>,
    pub tracklist: Vec<RawTrack>,
    pub videos: Vec<RawVideo>,
    pub images: Vec<RawImage>,
}
