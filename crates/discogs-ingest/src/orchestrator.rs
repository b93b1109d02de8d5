//! Step Orchestrator: drives the fixed 14-step run to completion, one
//! step at a time, resuming after failures at the first incomplete step
//! (spec §4.6).
//!
//! Grounded on `tessitura_cli::commands::process::run_process`'s
//! `should_run_*`/skip-if-already-done pattern, generalized from three
//! ad hoc checks into the data-driven `ProcessingRun::is_step_completed`
//! walk that `Step::ALL` already encodes in FK-safe order.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use discogs_core::model::{MasterArtist, MasterGenre, ProcessingRun, ReleaseArtist, ReleaseGenre, ReleaseLabel, Step};
use discogs_core::model::ids::{ArtistId, LabelId, MasterId, ReleaseId};
use discogs_core::Repository;
use tokio_util::sync::CancellationToken;

use crate::batch::{BatchCoordinator, FlushThresholds};
use crate::broadcast::ProgressBroadcaster;
use crate::config::Config;
use crate::convert::{convert_artist, convert_label, convert_master, convert_release};
use crate::decode::{decode_artists, decode_labels, decode_masters, decode_releases};
use crate::dump::{self, DumpFile};
use crate::error::{IngestError, Result};
use crate::genre::GenreManager;

/// A step's result: how many records it decoded and how many of those
/// were dropped by the converter. `emitted` feeds both the Progress
/// Broadcaster's `finish` payload and, for the collection/association
/// passes, the next step's `total` estimate (spec §4.4, §4.7).
#[derive(Debug, Clone, Copy, Default)]
struct StepOutcome {
    emitted: u64,
    dropped: u64,
}

/// Drives `Step::ALL` against one monthly dump. Owns nothing about the
/// dump files themselves (those live on disk under `Config::data_dir`);
/// the orchestrator's only state is the `ProcessingRun` it persists
/// through `repo` between steps.
pub struct StepOrchestrator {
    repo: Arc<dyn Repository>,
    config: Config,
}

impl StepOrchestrator {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, config: Config) -> Self {
        Self { repo, config }
    }

    /// Entry point: discovers the current `YYYY-MM`, loads or creates its
    /// run, and executes every incomplete step in order.
    pub async fn process_xml_files(&self, cancel: CancellationToken) -> Result<()> {
        let year_month = dump::current_year_month();
        self.process_year_month(&year_month, cancel).await
    }

    /// Same as [`Self::process_xml_files`] but for an explicit
    /// `year_month`, used by the CLI's `resume` command to retry a
    /// specific past run.
    pub async fn process_year_month(&self, year_month: &str, cancel: CancellationToken) -> Result<()> {
        let broadcaster = Arc::new(Mutex::new(ProgressBroadcaster::new(Duration::from_secs(
            self.config.broadcast_interval_secs,
        ))));
        self.process_year_month_with_broadcaster(year_month, cancel, broadcaster).await
    }

    /// Same as [`Self::process_year_month`], but against a caller-supplied
    /// broadcaster instead of a freshly constructed one — lets a caller
    /// `subscribe()` before the run starts to observe every progress event
    /// a real run publishes.
    pub async fn process_year_month_with_broadcaster(
        &self,
        year_month: &str,
        cancel: CancellationToken,
        broadcaster: Arc<Mutex<ProgressBroadcaster>>,
    ) -> Result<()> {
        dump::verify_dump_files_present(&self.config.data_dir, year_month)?;

        let mut run = self
            .repo
            .get_run(year_month)?
            .unwrap_or_else(|| ProcessingRun::new(year_month.to_string()));
        run.start();
        self.repo.upsert_run(&run)?;

        let coordinator = Arc::new(BatchCoordinator::new(FlushThresholds {
            entities: self.config.entity_flush_threshold,
            releases: self.config.release_flush_threshold,
        }));
        let genre_manager = Arc::new(GenreManager::new());

        for step in Step::ALL {
            if cancel.is_cancelled() {
                run.mark_step_failed(step, "cancelled");
                self.repo.upsert_run(&run)?;
                return Err(IngestError::Cancelled);
            }

            if run.is_step_completed(step) {
                log::info!("{year_month}: skipping completed step {step}");
                continue;
            }

            let total = self.step_total(step)?;
            broadcaster
                .lock()
                .expect("broadcaster mutex poisoned")
                .start(year_month, step, total);
            let started = Instant::now();
            let result = self
                .run_step(step, year_month, &coordinator, &genre_manager, &broadcaster, total, &cancel)
                .await;

            match result {
                Ok(outcome) => {
                    let duration = started.elapsed().as_secs_f64();
                    run.mark_step_completed(step, duration, outcome.dropped);
                    self.repo.upsert_run(&run)?;
                    broadcaster
                        .lock()
                        .expect("broadcaster mutex poisoned")
                        .finish(year_month, step, outcome.emitted, outcome.emitted);
                    log::info!(
                        "{year_month}: completed step {step} in {duration:.2}s ({} dropped)",
                        outcome.dropped
                    );
                }
                Err(err) => {
                    run.mark_step_failed(step, err.to_string());
                    self.repo.upsert_run(&run)?;
                    broadcaster
                        .lock()
                        .expect("broadcaster mutex poisoned")
                        .fail(year_month, step, err.to_string());
                    return Err(err);
                }
            }
        }

        run.complete();
        self.repo.upsert_run(&run)?;
        Ok(())
    }

    /// The progress denominator for a step (spec §4.7/§6). Every step
    /// after the file's own entities step has fully flushed can ask the
    /// repository for an exact count; the entities step itself, before
    /// anything has landed for that file, reports what is already there
    /// (zero on a fresh run, a partial count on one resumed mid-step).
    fn step_total(&self, step: Step) -> Result<u64> {
        let total = match step {
            Step::LabelsEntities => self.repo.count_labels()?,
            Step::ArtistsEntities => self.repo.count_artists()?,
            Step::MastersEntities
            | Step::MasterGenresCollection
            | Step::MasterGenresUpsert
            | Step::MasterGenreAssociations
            | Step::MasterArtistAssociations => self.repo.count_masters()?,
            Step::ReleasesEntities
            | Step::ReleaseGenresCollection
            | Step::ReleaseGenresUpsert
            | Step::ReleaseGenreAssociations
            | Step::ReleaseLabelAssociations
            | Step::ReleaseArtistAssociations => self.repo.count_releases()?,
            Step::Cleanup => 0,
        };
        Ok(total.max(0) as u64)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_step(
        &self,
        step: Step,
        year_month: &str,
        coordinator: &Arc<BatchCoordinator>,
        genres: &Arc<GenreManager>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        match step {
            Step::LabelsEntities => {
                self.run_labels_entities(year_month, coordinator, broadcaster, total, cancel).await
            }
            Step::ArtistsEntities => {
                self.run_artists_entities(year_month, coordinator, broadcaster, total, cancel).await
            }
            Step::MastersEntities => {
                self.run_masters_entities(year_month, coordinator, broadcaster, total, cancel).await
            }
            Step::ReleasesEntities => {
                self.run_releases_entities(year_month, coordinator, broadcaster, total, cancel).await
            }
            Step::MasterGenresCollection => {
                self.run_genres_collection(year_month, genres, broadcaster, total, cancel, true).await
            }
            Step::MasterGenresUpsert => self.run_genres_upsert(genres).await,
            Step::MasterGenreAssociations => {
                self.run_master_genre_associations(year_month, coordinator, genres, broadcaster, total, cancel)
                    .await
            }
            Step::ReleaseGenresCollection => {
                genres.reset();
                self.run_genres_collection(year_month, genres, broadcaster, total, cancel, false).await
            }
            Step::ReleaseGenresUpsert => self.run_genres_upsert(genres).await,
            Step::ReleaseGenreAssociations => {
                self.run_release_genre_associations(year_month, coordinator, genres, broadcaster, total, cancel)
                    .await
            }
            Step::ReleaseLabelAssociations => {
                self.run_release_label_associations(year_month, coordinator, broadcaster, total, cancel)
                    .await
            }
            Step::MasterArtistAssociations => {
                self.run_master_artist_associations(year_month, coordinator, broadcaster, total, cancel)
                    .await
            }
            Step::ReleaseArtistAssociations => {
                self.run_release_artist_associations(year_month, coordinator, broadcaster, total, cancel)
                    .await
            }
            Step::Cleanup => self.run_cleanup(year_month),
        }
    }

    fn dump_path(&self, year_month: &str, file: DumpFile) -> PathBuf {
        dump::dump_path(&self.config.data_dir, year_month, file)
    }

    async fn run_labels_entities(
        &self,
        year_month: &str,
        coordinator: &Arc<BatchCoordinator>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let path = self.dump_path(year_month, DumpFile::Labels);
        let repo = Arc::clone(&self.repo);
        let coordinator = Arc::clone(coordinator);
        let broadcaster = Arc::clone(broadcaster);
        let cancel = cancel.clone();
        let year_month = year_month.to_string();
        let step = Step::LabelsEntities;

        join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
            let mut dropped = 0u64;
            let mut processed = 0u64;
            let stats = decode_labels(&path, &cancel, |raw| {
                processed += 1;
                match convert_label(raw) {
                    Ok((label, images)) => {
                        coordinator.add_label(repo.as_ref(), label)?;
                        for image in images {
                            coordinator.add_image(repo.as_ref(), image)?;
                        }
                    }
                    Err(drop) => {
                        log_drop(&drop);
                        dropped += 1;
                    }
                }
                tick(&broadcaster, &year_month, step, processed, total);
                Ok(())
            })?;
            coordinator.flush_labels(repo.as_ref())?;
            coordinator.flush_images(repo.as_ref())?;
            Ok(StepOutcome {
                emitted: stats.records_emitted,
                dropped,
            })
        }))
        .await
    }

    async fn run_artists_entities(
        &self,
        year_month: &str,
        coordinator: &Arc<BatchCoordinator>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let path = self.dump_path(year_month, DumpFile::Artists);
        let repo = Arc::clone(&self.repo);
        let coordinator = Arc::clone(coordinator);
        let broadcaster = Arc::clone(broadcaster);
        let cancel = cancel.clone();
        let year_month = year_month.to_string();
        let step = Step::ArtistsEntities;

        join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
            let mut dropped = 0u64;
            let mut processed = 0u64;
            let stats = decode_artists(&path, &cancel, |raw| {
                processed += 1;
                match convert_artist(raw) {
                    Ok((artist, images)) => {
                        coordinator.add_artist(repo.as_ref(), artist)?;
                        for image in images {
                            coordinator.add_image(repo.as_ref(), image)?;
                        }
                    }
                    Err(drop) => {
                        log_drop(&drop);
                        dropped += 1;
                    }
                }
                tick(&broadcaster, &year_month, step, processed, total);
                Ok(())
            })?;
            coordinator.flush_artists(repo.as_ref())?;
            coordinator.flush_images(repo.as_ref())?;
            Ok(StepOutcome {
                emitted: stats.records_emitted,
                dropped,
            })
        }))
        .await
    }

    async fn run_masters_entities(
        &self,
        year_month: &str,
        coordinator: &Arc<BatchCoordinator>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let path = self.dump_path(year_month, DumpFile::Masters);
        let repo = Arc::clone(&self.repo);
        let coordinator = Arc::clone(coordinator);
        let broadcaster = Arc::clone(broadcaster);
        let cancel = cancel.clone();
        let year_month = year_month.to_string();
        let step = Step::MastersEntities;

        join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
            let mut dropped = 0u64;
            let mut processed = 0u64;
            let stats = decode_masters(&path, &cancel, |raw| {
                processed += 1;
                match convert_master(raw) {
                    Ok((master, images)) => {
                        coordinator.add_master(repo.as_ref(), master)?;
                        for image in images {
                            coordinator.add_image(repo.as_ref(), image)?;
                        }
                    }
                    Err(drop) => {
                        log_drop(&drop);
                        dropped += 1;
                    }
                }
                tick(&broadcaster, &year_month, step, processed, total);
                Ok(())
            })?;
            coordinator.flush_masters(repo.as_ref())?;
            coordinator.flush_images(repo.as_ref())?;
            Ok(StepOutcome {
                emitted: stats.records_emitted,
                dropped,
            })
        }))
        .await
    }

    async fn run_releases_entities(
        &self,
        year_month: &str,
        coordinator: &Arc<BatchCoordinator>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let path = self.dump_path(year_month, DumpFile::Releases);
        let repo = Arc::clone(&self.repo);
        let coordinator = Arc::clone(coordinator);
        let broadcaster = Arc::clone(broadcaster);
        let cancel = cancel.clone();
        let year_month = year_month.to_string();
        let step = Step::ReleasesEntities;

        join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
            let mut dropped = 0u64;
            let mut processed = 0u64;
            let stats = decode_releases(&path, &cancel, |raw| {
                processed += 1;
                match convert_release(raw) {
                    Ok((release, images)) => {
                        coordinator.add_release(repo.as_ref(), release)?;
                        for image in images {
                            coordinator.add_image(repo.as_ref(), image)?;
                        }
                    }
                    Err(drop) => {
                        log_drop(&drop);
                        dropped += 1;
                    }
                }
                tick(&broadcaster, &year_month, step, processed, total);
                Ok(())
            })?;
            coordinator.flush_releases(repo.as_ref())?;
            coordinator.flush_images(repo.as_ref())?;
            Ok(StepOutcome {
                emitted: stats.records_emitted,
                dropped,
            })
        }))
        .await
    }

    /// Shared by `MasterGenresCollection`/`ReleaseGenresCollection`: a
    /// read-only decode pass over masters.xml (or releases.xml) that
    /// only feeds names into the Genre/Style Manager (spec §4.5).
    #[allow(clippy::too_many_arguments)]
    async fn run_genres_collection(
        &self,
        year_month: &str,
        genres: &Arc<GenreManager>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
        is_masters: bool,
    ) -> Result<StepOutcome> {
        let genres = Arc::clone(genres);
        let broadcaster = Arc::clone(broadcaster);
        let cancel = cancel.clone();
        let year_month = year_month.to_string();

        if is_masters {
            let path = self.dump_path(&year_month, DumpFile::Masters);
            let step = Step::MasterGenresCollection;
            join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
                let mut processed = 0u64;
                let stats = decode_masters(&path, &cancel, |raw| {
                    processed += 1;
                    genres.collect_names(&raw.genres, &raw.styles);
                    tick(&broadcaster, &year_month, step, processed, total);
                    Ok(())
                })?;
                Ok(StepOutcome {
                    emitted: stats.records_emitted,
                    dropped: 0,
                })
            }))
            .await
        } else {
            let path = self.dump_path(&year_month, DumpFile::Releases);
            let step = Step::ReleaseGenresCollection;
            join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
                let mut processed = 0u64;
                let stats = decode_releases(&path, &cancel, |raw| {
                    processed += 1;
                    genres.collect_names(&raw.genres, &raw.styles);
                    tick(&broadcaster, &year_month, step, processed, total);
                    Ok(())
                })?;
                Ok(StepOutcome {
                    emitted: stats.records_emitted,
                    dropped: 0,
                })
            }))
            .await
        }
    }

    async fn run_genres_upsert(&self, genres: &Arc<GenreManager>) -> Result<StepOutcome> {
        let repo = Arc::clone(&self.repo);
        let genres = Arc::clone(genres);
        join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
            genres.batch_upsert_missing(repo.as_ref())?;
            Ok(StepOutcome::default())
        }))
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_master_genre_associations(
        &self,
        year_month: &str,
        coordinator: &Arc<BatchCoordinator>,
        genres: &Arc<GenreManager>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let path = self.dump_path(year_month, DumpFile::Masters);
        let repo = Arc::clone(&self.repo);
        let coordinator = Arc::clone(coordinator);
        let genres = Arc::clone(genres);
        let broadcaster = Arc::clone(broadcaster);
        let cancel = cancel.clone();
        let year_month = year_month.to_string();
        let step = Step::MasterGenreAssociations;

        join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
            let mut processed = 0u64;
            let stats = decode_masters(&path, &cancel, |raw| {
                processed += 1;
                if let Some(id) = raw.id {
                    for (name, _id) in genres.resolve(&raw.genres, &raw.styles) {
                        coordinator.add_master_genre(MasterGenre {
                            master_id: MasterId::new(id),
                            genre_name: name,
                        });
                    }
                }
                tick(&broadcaster, &year_month, step, processed, total);
                Ok(())
            })?;
            coordinator.flush_master_genres(repo.as_ref())?;
            Ok(StepOutcome {
                emitted: stats.records_emitted,
                dropped: 0,
            })
        }))
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_release_genre_associations(
        &self,
        year_month: &str,
        coordinator: &Arc<BatchCoordinator>,
        genres: &Arc<GenreManager>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let path = self.dump_path(year_month, DumpFile::Releases);
        let repo = Arc::clone(&self.repo);
        let coordinator = Arc::clone(coordinator);
        let genres = Arc::clone(genres);
        let broadcaster = Arc::clone(broadcaster);
        let cancel = cancel.clone();
        let year_month = year_month.to_string();
        let step = Step::ReleaseGenreAssociations;

        join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
            let mut processed = 0u64;
            let stats = decode_releases(&path, &cancel, |raw| {
                processed += 1;
                if let Some(id) = raw.id {
                    for (name, _id) in genres.resolve(&raw.genres, &raw.styles) {
                        coordinator.add_release_genre(ReleaseGenre {
                            release_id: ReleaseId::new(id),
                            genre_name: name,
                        });
                    }
                }
                tick(&broadcaster, &year_month, step, processed, total);
                Ok(())
            })?;
            coordinator.flush_release_genres(repo.as_ref())?;
            Ok(StepOutcome {
                emitted: stats.records_emitted,
                dropped: 0,
            })
        }))
        .await
    }

    async fn run_release_label_associations(
        &self,
        year_month: &str,
        coordinator: &Arc<BatchCoordinator>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let path = self.dump_path(year_month, DumpFile::Releases);
        let repo = Arc::clone(&self.repo);
        let coordinator = Arc::clone(coordinator);
        let broadcaster = Arc::clone(broadcaster);
        let cancel = cancel.clone();
        let year_month = year_month.to_string();
        let step = Step::ReleaseLabelAssociations;

        join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
            let mut processed = 0u64;
            let stats = decode_releases(&path, &cancel, |raw| {
                processed += 1;
                if let Some(id) = raw.id {
                    if let Some(&label_id) = raw.label_ids.first() {
                        coordinator.add_release_label(ReleaseLabel {
                            release_id: ReleaseId::new(id),
                            label_id: LabelId::new(label_id),
                        });
                    }
                }
                tick(&broadcaster, &year_month, step, processed, total);
                Ok(())
            })?;
            coordinator.flush_release_labels(repo.as_ref())?;
            Ok(StepOutcome {
                emitted: stats.records_emitted,
                dropped: 0,
            })
        }))
        .await
    }

    async fn run_master_artist_associations(
        &self,
        year_month: &str,
        coordinator: &Arc<BatchCoordinator>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let path = self.dump_path(year_month, DumpFile::Masters);
        let repo = Arc::clone(&self.repo);
        let coordinator = Arc::clone(coordinator);
        let broadcaster = Arc::clone(broadcaster);
        let cancel = cancel.clone();
        let year_month = year_month.to_string();
        let step = Step::MasterArtistAssociations;

        join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
            let mut processed = 0u64;
            let stats = decode_masters(&path, &cancel, |raw| {
                processed += 1;
                if let Some(id) = raw.id {
                    for artist_id in raw.artist_ids {
                        coordinator.add_master_artist(MasterArtist {
                            master_id: MasterId::new(id),
                            artist_id: ArtistId::new(artist_id),
                        });
                    }
                }
                tick(&broadcaster, &year_month, step, processed, total);
                Ok(())
            })?;
            coordinator.flush_master_artists(repo.as_ref())?;
            Ok(StepOutcome {
                emitted: stats.records_emitted,
                dropped: 0,
            })
        }))
        .await
    }

    async fn run_release_artist_associations(
        &self,
        year_month: &str,
        coordinator: &Arc<BatchCoordinator>,
        broadcaster: &Arc<Mutex<ProgressBroadcaster>>,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let path = self.dump_path(year_month, DumpFile::Releases);
        let repo = Arc::clone(&self.repo);
        let coordinator = Arc::clone(coordinator);
        let broadcaster = Arc::clone(broadcaster);
        let cancel = cancel.clone();
        let year_month = year_month.to_string();
        let step = Step::ReleaseArtistAssociations;

        join_blocking(tokio::task::spawn_blocking(move || -> Result<StepOutcome> {
            let mut processed = 0u64;
            let stats = decode_releases(&path, &cancel, |raw| {
                processed += 1;
                if let Some(id) = raw.id {
                    for artist_id in raw.artist_ids {
                        coordinator.add_release_artist(ReleaseArtist {
                            release_id: ReleaseId::new(id),
                            artist_id: ArtistId::new(artist_id),
                        });
                    }
                }
                tick(&broadcaster, &year_month, step, processed, total);
                Ok(())
            })?;
            coordinator.flush_release_artists(repo.as_ref())?;
            Ok(StepOutcome {
                emitted: stats.records_emitted,
                dropped: 0,
            })
        }))
        .await
    }

    fn run_cleanup(&self, year_month: &str) -> Result<StepOutcome> {
        dump::remove_dump_files(&self.config.data_dir, year_month)?;
        Ok(StepOutcome::default())
    }
}

/// Unwraps a `spawn_blocking` join error into the crate's error type; the
/// only way this fires is if the blocking task itself panicked.
async fn join_blocking(handle: tokio::task::JoinHandle<Result<StepOutcome>>) -> Result<StepOutcome> {
    handle
        .await
        .map_err(|_| IngestError::ChannelClosed("decode task panicked"))?
}

/// Publishes a throttled progress tick from inside a decode loop. Safe to
/// call once per record: `ProgressBroadcaster::tick` only actually
/// publishes once `broadcast_interval_secs` has elapsed since the last
/// send (spec §4.7).
fn tick(broadcaster: &Arc<Mutex<ProgressBroadcaster>>, year_month: &str, step: Step, processed: u64, total: u64) {
    broadcaster
        .lock()
        .expect("broadcaster mutex poisoned")
        .tick(year_month, step, processed, total);
}

fn log_drop(drop: &crate::convert::DropReason) {
    log::warn!(
        "dropped record: discogs_id={:?} field={} reason={}",
        drop.discogs_id,
        drop.field,
        drop.reason
    );
}
