use serde::{Deserialize, Serialize};

use crate::model::ids::LabelId;

/// A Discogs label (record imprint).
///
/// Same creation/update lifecycle as [`crate::model::Artist`]: created on
/// first sighting, `name`/`profile` refreshed on later sightings, never
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    pub profile: Option<String>,
    pub resource_url: String,
    pub uri: String,
}

impl Label {
    #[must_use]
    pub fn new(id: LabelId, name: String, resource_url: String, uri: String) -> Self {
        Self {
            id,
            name,
            profile: None,
            resource_url,
            uri,
        }
    }
}
