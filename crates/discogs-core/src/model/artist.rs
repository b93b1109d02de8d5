use serde::{Deserialize, Serialize};

use crate::model::ids::ArtistId;

/// A Discogs artist.
///
/// Created when first seen in any of the four dump files; on later
/// sightings only `name` is refreshed. Never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    pub is_active: bool,
}

impl Artist {
    #[must_use]
    pub fn new(id: ArtistId, name: String) -> Self {
        Self {
            id,
            name,
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_new_is_active() {
        let artist = Artist::new(ArtistId::new(1), "Aphex Twin".to_string());
        assert!(artist.is_active);
        assert_eq!(artist.name, "Aphex Twin");
    }
}
