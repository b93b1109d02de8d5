//! Streaming decoders for the four Discogs dump XML files (spec §4.1).

pub mod artists;
pub mod labels;
pub mod masters;
pub mod raw;
pub mod reader;
pub mod releases;

pub use artists::decode_artists;
pub use labels::decode_labels;
pub use masters::decode_masters;
pub use raw::{RawArtist, RawFormat, RawImage, RawLabel, RawMaster, RawRelease, RawTrack, RawVideo};
pub use releases::decode_releases;
