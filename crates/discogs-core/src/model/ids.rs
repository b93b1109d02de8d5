use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines a newtype wrapping a Discogs natural-key integer, distinct per
/// entity so artist/label/master/release/genre ids can't be mixed up at
/// the type level even though they're all plain `i64`s on the wire.
macro_rules! define_discogs_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_discogs_id!(ArtistId, "The Discogs id of an artist.");
define_discogs_id!(LabelId, "The Discogs id of a label.");
define_discogs_id!(MasterId, "The Discogs id of a master.");
define_discogs_id!(ReleaseId, "The Discogs id of a release.");

/// The surrogate row id of a `Genre`. Genres have no natural key of their
/// own (their identity is the name, per invariant 3); this id exists only
/// so the Genre/Style Manager can memoize "already upserted" without
/// restating the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenreId(i64);

impl GenreId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for GenreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_roundtrip() {
        let id = ArtistId::new(42);
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn test_id_types_are_distinct() {
        let artist = ArtistId::new(1);
        let label = LabelId::new(1);
        // Different types even though the underlying id is the same value.
        assert_eq!(artist.get(), label.get());
    }
}
