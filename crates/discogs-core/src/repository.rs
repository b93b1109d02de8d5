//! The narrow database surface the ingestion pipeline touches (spec §6).
//!
//! Everything else about the schema — indices, query paths for consumers
//! of the catalog, migrations — lives behind this trait so the pipeline
//! crate depends on an interface rather than a concrete database.

use std::collections::HashMap;

use crate::model::{
    Artist, GenreId, Image, Label, Master, MasterArtist, MasterGenre, ProcessingRun, Release,
    ReleaseArtist, ReleaseGenre, ReleaseLabel,
};
use crate::Result;

/// The result of an upsert-batch call: how many rows were newly inserted
/// versus how many already existed and were updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub inserted: u64,
    pub updated: u64,
}

impl UpsertOutcome {
    #[must_use]
    pub const fn new(inserted: u64, updated: u64) -> Self {
        Self { inserted, updated }
    }
}

/// The repository contract described in spec §6. Implementations must
/// make every `upsert_*`/`create_*` call idempotent on natural key
/// (invariant 2): re-running a step against rows already present must be
/// a no-op other than the update it performs.
///
/// Methods are synchronous because the reference implementation
/// ([`crate::schema::db::SqliteRepository`]) is a local embedded SQLite
/// database with no network round-trip to await; callers on the async
/// side (the Batch Coordinator) invoke these without crossing an await
/// point, matching how the teacher workspace calls its own `Database`
/// from inside async `Stage::execute` bodies.
pub trait Repository: Send + Sync {
    fn upsert_labels(&self, records: &[Label]) -> Result<UpsertOutcome>;
    fn upsert_artists(&self, records: &[Artist]) -> Result<UpsertOutcome>;
    fn upsert_masters(&self, records: &[Master]) -> Result<UpsertOutcome>;
    fn upsert_releases(&self, records: &[Release]) -> Result<UpsertOutcome>;
    /// Upsert by `name` (invariant 3: name is the sole identity). Returns
    /// one `inserted`/`updated` count across the whole batch.
    fn upsert_genres(&self, names: &[String]) -> Result<UpsertOutcome>;
    /// Upsert by the composite `(imageable_type, imageable_id, url)`.
    fn upsert_images(&self, records: &[Image]) -> Result<UpsertOutcome>;

    fn create_master_artist_associations(&self, pairs: &[MasterArtist]) -> Result<()>;
    fn create_master_genre_associations(&self, pairs: &[MasterGenre]) -> Result<()>;
    fn create_release_artist_associations(&self, pairs: &[ReleaseArtist]) -> Result<()>;
    fn create_release_label_associations(&self, pairs: &[ReleaseLabel]) -> Result<()>;
    fn create_release_genre_associations(&self, pairs: &[ReleaseGenre]) -> Result<()>;

    /// Resolve genre names to their surrogate row ids, for the Genre/Style
    /// Manager's memoization cache (spec §4.5). Names not present in the
    /// database are simply absent from the returned map.
    fn genre_ids_by_names(&self, names: &[String]) -> Result<HashMap<String, GenreId>>;

    fn get_run(&self, year_month: &str) -> Result<Option<ProcessingRun>>;
    fn get_latest_run(&self) -> Result<Option<ProcessingRun>>;
    fn upsert_run(&self, run: &ProcessingRun) -> Result<()>;

    fn count_artists(&self) -> Result<i64>;
    fn count_labels(&self) -> Result<i64>;
    fn count_masters(&self) -> Result<i64>;
    fn count_releases(&self) -> Result<i64>;
}
