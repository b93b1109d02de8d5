use serde::{Deserialize, Serialize};

/// A genre or style name. Discogs' "genres" and "styles" taxonomies share
/// one namespace here (invariant 3): a style that collides with a genre
/// name is the same `Genre` row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
}

impl Genre {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
