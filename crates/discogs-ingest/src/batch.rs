//! Batch Coordinator: keyed, deduplicating accumulators that flush to the
//! repository in FK-safe order (spec §4.4).
//!
//! Each entity map is `natural_key -> record`, so a later record for the
//! same key received before a flush simply overwrites the earlier one —
//! the intra-batch deduplication the spec calls out. Association lists
//! have no such key (the pair itself is already unique) and are kept as
//! plain `Vec`s.

use std::collections::HashMap;
use std::sync::Mutex;

use discogs_core::model::{
    Artist, Image, ImageableType, Label, Master, MasterArtist, MasterGenre, Release, ReleaseArtist,
    ReleaseGenre, ReleaseLabel,
};
use discogs_core::{Repository, UpsertOutcome};

use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct FlushThresholds {
    pub entities: usize,
    pub releases: usize,
}

/// Keyed, mutex-guarded accumulators for every entity/association family
/// the pipeline upserts, plus the size thresholds that trigger a
/// size-triggered (as opposed to step-boundary) flush.
pub struct BatchCoordinator {
    thresholds: FlushThresholds,

    labels: Mutex<HashMap<i64, Label>>,
    artists: Mutex<HashMap<i64, Artist>>,
    masters: Mutex<HashMap<i64, Master>>,
    releases: Mutex<HashMap<i64, Release>>,
    images: Mutex<HashMap<(ImageableType, i64, String), Image>>,

    master_artists: Mutex<Vec<MasterArtist>>,
    master_genres: Mutex<Vec<MasterGenre>>,
    release_artists: Mutex<Vec<ReleaseArtist>>,
    release_labels: Mutex<Vec<ReleaseLabel>>,
    release_genres: Mutex<Vec<ReleaseGenre>>,
}

impl BatchCoordinator {
    #[must_use]
    pub fn new(thresholds: FlushThresholds) -> Self {
        Self {
            thresholds,
            labels: Mutex::new(HashMap::new()),
            artists: Mutex::new(HashMap::new()),
            masters: Mutex::new(HashMap::new()),
            releases: Mutex::new(HashMap::new()),
            images: Mutex::new(HashMap::new()),
            master_artists: Mutex::new(Vec::new()),
            master_genres: Mutex::new(Vec::new()),
            release_artists: Mutex::new(Vec::new()),
            release_labels: Mutex::new(Vec::new()),
            release_genres: Mutex::new(Vec::new()),
        }
    }

    pub fn add_label(&self, repo: &dyn Repository, record: Label) -> Result<()> {
        let len = {
            let mut map = self.labels.lock().expect("labels mutex poisoned");
            map.insert(record.id.get(), record);
            map.len()
        };
        if len >= self.thresholds.entities {
            self.flush_labels(repo)?;
        }
        Ok(())
    }

    pub fn add_artist(&self, repo: &dyn Repository, record: Artist) -> Result<()> {
        let len = {
            let mut map = self.artists.lock().expect("artists mutex poisoned");
            map.insert(record.id.get(), record);
            map.len()
        };
        if len >= self.thresholds.entities {
            self.flush_artists(repo)?;
        }
        Ok(())
    }

    pub fn add_master(&self, repo: &dyn Repository, record: Master) -> Result<()> {
        let len = {
            let mut map = self.masters.lock().expect("masters mutex poisoned");
            map.insert(record.id.get(), record);
            map.len()
        };
        if len >= self.thresholds.entities {
            self.flush_masters(repo)?;
        }
        Ok(())
    }

    pub fn add_release(&self, repo: &dyn Repository, record: Release) -> Result<()> {
        let len = {
            let mut map = self.releases.lock().expect("releases mutex poisoned");
            map.insert(record.id.get(), record);
            map.len()
        };
        if len >= self.thresholds.releases {
            self.flush_releases(repo)?;
        }
        Ok(())
    }

    pub fn add_image(&self, repo: &dyn Repository, record: Image) -> Result<()> {
        let len = {
            let mut map = self.images.lock().expect("images mutex poisoned");
            let key = (record.imageable_type, record.imageable_id, record.url.clone());
            map.insert(key, record);
            map.len()
        };
        if len >= self.thresholds.entities {
            self.flush_images(repo)?;
        }
        Ok(())
    }

    pub fn add_master_artist(&self, pair: MasterArtist) {
        self.master_artists
            .lock()
            .expect("master_artists mutex poisoned")
            .push(pair);
    }

    pub fn add_master_genre(&self, pair: MasterGenre) {
        self.master_genres
            .lock()
            .expect("master_genres mutex poisoned")
            .push(pair);
    }

    pub fn add_release_artist(&self, pair: ReleaseArtist) {
        self.release_artists
            .lock()
            .expect("release_artists mutex poisoned")
            .push(pair);
    }

    pub fn add_release_label(&self, pair: ReleaseLabel) {
        self.release_labels
            .lock()
            .expect("release_labels mutex poisoned")
            .push(pair);
    }

    pub fn add_release_genre(&self, pair: ReleaseGenre) {
        self.release_genres
            .lock()
            .expect("release_genres mutex poisoned")
            .push(pair);
    }

    pub fn flush_labels(&self, repo: &dyn Repository) -> Result<UpsertOutcome> {
        let records = drain_map(&self.labels);
        Ok(repo.upsert_labels(&records)?)
    }

    pub fn flush_artists(&self, repo: &dyn Repository) -> Result<UpsertOutcome> {
        let records = drain_map(&self.artists);
        Ok(repo.upsert_artists(&records)?)
    }

    pub fn flush_masters(&self, repo: &dyn Repository) -> Result<UpsertOutcome> {
        let records = drain_map(&self.masters);
        Ok(repo.upsert_masters(&records)?)
    }

    pub fn flush_releases(&self, repo: &dyn Repository) -> Result<UpsertOutcome> {
        let records = drain_map(&self.releases);
        Ok(repo.upsert_releases(&records)?)
    }

    pub fn flush_images(&self, repo: &dyn Repository) -> Result<UpsertOutcome> {
        let records = drain_map(&self.images);
        Ok(repo.upsert_images(&records)?)
    }

    pub fn flush_master_artists(&self, repo: &dyn Repository) -> Result<()> {
        let pairs = drain_vec(&self.master_artists);
        Ok(repo.create_master_artist_associations(&pairs)?)
    }

    pub fn flush_master_genres(&self, repo: &dyn Repository) -> Result<()> {
        let pairs = drain_vec(&self.master_genres);
        Ok(repo.create_master_genre_associations(&pairs)?)
    }

    pub fn flush_release_artists(&self, repo: &dyn Repository) -> Result<()> {
        let pairs = drain_vec(&self.release_artists);
        Ok(repo.create_release_artist_associations(&pairs)?)
    }

    pub fn flush_release_labels(&self, repo: &dyn Repository) -> Result<()> {
        let pairs = drain_vec(&self.release_labels);
        Ok(repo.create_release_label_associations(&pairs)?)
    }

    pub fn flush_release_genres(&self, repo: &dyn Repository) -> Result<()> {
        let pairs = drain_vec(&self.release_genres);
        Ok(repo.create_release_genre_associations(&pairs)?)
    }

    /// Flushes every accumulator in the strict FK-safe order from spec
    /// §4.4. Callers that need the masters-flush/master-association
    /// consistency delay should not use this at a step boundary that
    /// spans both; the orchestrator instead calls the individual
    /// `flush_*` methods with a delay in between.
    pub fn flush_all(&self, repo: &dyn Repository) -> Result<()> {
        self.flush_labels(repo)?;
        self.flush_artists(repo)?;
        self.flush_masters(repo)?;
        self.flush_master_artists(repo)?;
        self.flush_master_genres(repo)?;
        self.flush_releases(repo)?;
        self.flush_release_labels(repo)?;
        self.flush_release_artists(repo)?;
        self.flush_release_genres(repo)?;
        self.flush_images(repo)?;
        Ok(())
    }
}

fn drain_map<K: Eq + std::hash::Hash, V: Clone>(mutex: &Mutex<HashMap<K, V>>) -> Vec<V> {
    let mut map = mutex.lock().expect("batch map mutex poisoned");
    let records: Vec<V> = map.values().cloned().collect();
    map.clear();
    records
}

fn drain_vec<T>(mutex: &Mutex<Vec<T>>) -> Vec<T> {
    let mut vec = mutex.lock().expect("batch vec mutex poisoned");
    std::mem::take(&mut *vec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use discogs_core::model::ids::{ArtistId, LabelId};
    use discogs_core::schema::db::SqliteRepository;

    fn test_repo() -> SqliteRepository {
        SqliteRepository::open_in_memory().expect("open in-memory db")
    }

    #[test]
    fn test_add_label_dedupes_same_key() {
        let coordinator = BatchCoordinator::new(FlushThresholds {
            entities: 100,
            releases: 100,
        });
        let repo = test_repo();
        coordinator
            .add_label(&repo, Label::new(LabelId::new(1), "A".to_string(), String::new(), String::new()))
            .unwrap();
        coordinator
            .add_label(&repo, Label::new(LabelId::new(1), "B".to_string(), String::new(), String::new()))
            .unwrap();

        let map = coordinator.labels.lock().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1).unwrap().name, "B");
    }

    #[test]
    fn test_add_label_flushes_at_threshold() {
        let coordinator = BatchCoordinator::new(FlushThresholds {
            entities: 2,
            releases: 100,
        });
        let repo = test_repo();
        coordinator
            .add_label(&repo, Label::new(LabelId::new(1), "A".to_string(), String::new(), String::new()))
            .unwrap();
        coordinator
            .add_label(&repo, Label::new(LabelId::new(2), "B".to_string(), String::new(), String::new()))
            .unwrap();

        assert!(coordinator.labels.lock().unwrap().is_empty());
        assert_eq!(repo.count_labels().unwrap(), 2);
    }

    #[test]
    fn test_flush_all_respects_fk_order() {
        let coordinator = BatchCoordinator::new(FlushThresholds {
            entities: 100,
            releases: 100,
        });
        let repo = test_repo();
        coordinator
            .add_artist(&repo, Artist::new(ArtistId::new(1), "X".to_string()))
            .unwrap();
        coordinator.add_master_artist(MasterArtist {
            master_id: discogs_core::model::ids::MasterId::new(1),
            artist_id: ArtistId::new(1),
        });

        coordinator.flush_all(&repo).unwrap();
        assert_eq!(repo.count_artists().unwrap(), 1);
    }
}
