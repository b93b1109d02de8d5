use serde::{Deserialize, Serialize};

/// Which of the four dump entities an [`Image`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageableType {
    Artist,
    Label,
    Master,
    Release,
}

impl ImageableType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Label => "label",
            Self::Master => "master",
            Self::Release => "release",
        }
    }
}

/// Discogs' own classification of an image's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    Primary,
    Secondary,
    Gallery,
}

impl ImageType {
    /// Classify from the raw `type` attribute of a `<image>` element:
    /// `"primary"` -> primary, `"secondary"` -> secondary, anything else
    /// (including absent) -> gallery.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        match raw {
            "primary" => Self::Primary,
            "secondary" => Self::Secondary,
            _ => Self::Gallery,
        }
    }
}

/// An image attached to an artist, label, master, or release.
///
/// Polymorphic: `imageable_type`/`imageable_id` together identify the
/// owning row. Deduplicated by `(imageable_type, imageable_id, url)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub image_type: ImageType,
    pub imageable_id: i64,
    pub imageable_type: ImageableType,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub discogs_uri: String,
    pub discogs_uri_150: Option<String>,
    pub discogs_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_type_classify() {
        assert_eq!(ImageType::classify("primary"), ImageType::Primary);
        assert_eq!(ImageType::classify("secondary"), ImageType::Secondary);
        assert_eq!(ImageType::classify(""), ImageType::Gallery);
        assert_eq!(ImageType::classify("weird"), ImageType::Gallery);
    }
}
