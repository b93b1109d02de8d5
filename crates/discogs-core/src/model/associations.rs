use serde::{Deserialize, Serialize};

use crate::model::ids::{ArtistId, LabelId, MasterId, ReleaseId};

/// A master↔artist join row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MasterArtist {
    pub master_id: MasterId,
    pub artist_id: ArtistId,
}

/// A master↔genre join row. Genres are referenced by name (invariant 3:
/// the name set is the single source of identity), not by surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MasterGenre {
    pub master_id: MasterId,
    pub genre_name: String,
}

/// A release↔artist join row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseArtist {
    pub release_id: ReleaseId,
    pub artist_id: ArtistId,
}

/// A release↔label join row (first label only, per spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseLabel {
    pub release_id: ReleaseId,
    pub label_id: LabelId,
}

/// A release↔genre join row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseGenre {
    pub release_id: ReleaseId,
    pub genre_name: String,
}
