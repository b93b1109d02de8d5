use serde::{Deserialize, Serialize};

use crate::model::ids::{MasterId, ReleaseId};

/// A Discogs master — the abstract "album identity" that groups many
/// pressings/reissues (`Release`s).
///
/// `main_release_id` is a soft link: it may point at a release that has
/// not been upserted yet (see DESIGN.md, "cyclic master/release
/// references"), so it is never enforced as a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Master {
    pub id: MasterId,
    pub title: String,
    pub year: Option<i32>,
    pub main_release_id: Option<ReleaseId>,
    pub main_release_resource_url: Option<String>,
    pub uri: String,
    pub resource_url: String,
}

impl Master {
    #[must_use]
    pub fn new(id: MasterId, title: String, uri: String, resource_url: String) -> Self {
        Self {
            id,
            title,
            year: None,
            main_release_id: None,
            main_release_resource_url: None,
            uri,
            resource_url,
        }
    }
}
