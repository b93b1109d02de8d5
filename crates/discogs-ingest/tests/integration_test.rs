//! End-to-end test: synthetic two-record dumps through the full step
//! orchestrator against an in-memory repository.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use discogs_core::model::{
    Artist, GenreId, Image, Label, Master, MasterArtist, MasterGenre, ProcessingRun, Release,
    ReleaseArtist, ReleaseGenre, ReleaseLabel,
};
use discogs_core::schema::SqliteRepository;
use discogs_core::{Repository, UpsertOutcome};
use discogs_ingest::dump::DumpFile;
use discogs_ingest::{Config, ProgressBroadcaster, StageTag, StepOrchestrator};
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Wraps a real repository and fails one specific call, delegating
/// everything else. Used to verify that a repository error on upsert
/// surfaces as the step's error instead of being logged and swallowed.
struct FailingRepository {
    inner: SqliteRepository,
}

impl Repository for FailingRepository {
    fn upsert_labels(&self, _records: &[Label]) -> discogs_core::Result<UpsertOutcome> {
        Err(discogs_core::Error::InvalidData("injected failure".to_string()))
    }
    fn upsert_artists(&self, records: &[Artist]) -> discogs_core::Result<UpsertOutcome> {
        self.inner.upsert_artists(records)
    }
    fn upsert_masters(&self, records: &[Master]) -> discogs_core::Result<UpsertOutcome> {
        self.inner.upsert_masters(records)
    }
    fn upsert_releases(&self, records: &[Release]) -> discogs_core::Result<UpsertOutcome> {
        self.inner.upsert_releases(records)
    }
    fn upsert_genres(&self, names: &[String]) -> discogs_core::Result<UpsertOutcome> {
        self.inner.upsert_genres(names)
    }
    fn upsert_images(&self, records: &[Image]) -> discogs_core::Result<UpsertOutcome> {
        self.inner.upsert_images(records)
    }
    fn create_master_artist_associations(&self, pairs: &[MasterArtist]) -> discogs_core::Result<()> {
        self.inner.create_master_artist_associations(pairs)
    }
    fn create_master_genre_associations(&self, pairs: &[MasterGenre]) -> discogs_core::Result<()> {
        self.inner.create_master_genre_associations(pairs)
    }
    fn create_release_artist_associations(&self, pairs: &[ReleaseArtist]) -> discogs_core::Result<()> {
        self.inner.create_release_artist_associations(pairs)
    }
    fn create_release_label_associations(&self, pairs: &[ReleaseLabel]) -> discogs_core::Result<()> {
        self.inner.create_release_label_associations(pairs)
    }
    fn create_release_genre_associations(&self, pairs: &[ReleaseGenre]) -> discogs_core::Result<()> {
        self.inner.create_release_genre_associations(pairs)
    }
    fn genre_ids_by_names(&self, names: &[String]) -> discogs_core::Result<HashMap<String, GenreId>> {
        self.inner.genre_ids_by_names(names)
    }
    fn get_run(&self, year_month: &str) -> discogs_core::Result<Option<ProcessingRun>> {
        self.inner.get_run(year_month)
    }
    fn get_latest_run(&self) -> discogs_core::Result<Option<ProcessingRun>> {
        self.inner.get_latest_run()
    }
    fn upsert_run(&self, run: &ProcessingRun) -> discogs_core::Result<()> {
        self.inner.upsert_run(run)
    }
    fn count_artists(&self) -> discogs_core::Result<i64> {
        self.inner.count_artists()
    }
    fn count_labels(&self) -> discogs_core::Result<i64> {
        self.inner.count_labels()
    }
    fn count_masters(&self) -> discogs_core::Result<i64> {
        self.inner.count_masters()
    }
    fn count_releases(&self) -> discogs_core::Result<i64> {
        self.inner.count_releases()
    }
}

fn write_dump(dir: &std::path::Path, year_month: &str, file: DumpFile, xml: &str) {
    let dir = dir.join(year_month);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.xml.gz", file.file_stem()));
    let out = std::fs::File::create(path).unwrap();
    let mut enc = GzEncoder::new(out, Compression::default());
    enc.write_all(xml.as_bytes()).unwrap();
    enc.finish().unwrap();
}

fn seed_dumps(data_dir: &std::path::Path, year_month: &str) {
    write_dump(
        data_dir,
        year_month,
        DumpFile::Labels,
        r#"<labels>
            <label><id>1</id><name>Warp Records</name></label>
            <label><id>2</id><name>Ninja Tune</name></label>
        </labels>"#,
    );
    write_dump(
        data_dir,
        year_month,
        DumpFile::Artists,
        r#"<artists>
            <artist><id>10</id><name>Aphex Twin</name></artist>
            <artist><id>11</id><name>Squarepusher</name></artist>
        </artists>"#,
    );
    write_dump(
        data_dir,
        year_month,
        DumpFile::Masters,
        r#"<masters>
            <master id="100">
                <title>Selected Ambient Works</title>
                <year>1992</year>
                <genres><genre>Electronic</genre></genres>
                <styles><style>Ambient</style></styles>
                <artists><artist><id>10</id><name>Aphex Twin</name></artist></artists>
            </master>
        </masters>"#,
    );
    write_dump(
        data_dir,
        year_month,
        DumpFile::Releases,
        r#"<releases>
            <release id="1000">
                <title>Selected Ambient Works 85-92</title>
                <released>1992-01</released>
                <master_id>100</master_id>
                <genres><genre>Electronic</genre></genres>
                <styles><style>Ambient</style></styles>
                <labels><label id="1" name="Warp" catno="WARPCD1"/></labels>
                <artists><artist><id>10</id><name>Aphex Twin</name></artist></artists>
                <formats><format name="CD" qty="1"/></formats>
                <tracklist>
                    <track><position>1</position><title>Xtal</title><duration>4:51</duration></track>
                </tracklist>
            </release>
        </releases>"#,
    );
}

#[tokio::test]
async fn test_full_run_upserts_all_entities_and_associations() {
    let temp = TempDir::new().unwrap();
    let year_month = "2024-01";
    seed_dumps(temp.path(), year_month);

    let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::open_in_memory().unwrap());
    let config = Config {
        data_dir: temp.path().to_path_buf(),
        ..Config::default()
    };
    let orchestrator = StepOrchestrator::new(Arc::clone(&repo), config);

    orchestrator
        .process_year_month(year_month, CancellationToken::new())
        .await
        .expect("run should complete");

    assert_eq!(repo.count_labels().unwrap(), 2);
    assert_eq!(repo.count_artists().unwrap(), 2);
    assert_eq!(repo.count_masters().unwrap(), 1);
    assert_eq!(repo.count_releases().unwrap(), 1);

    let run = repo.get_run(year_month).unwrap().expect("run persisted");
    assert_eq!(run.status, discogs_core::model::RunStatus::Completed);

    // The staged files should have been removed by the Cleanup step.
    assert!(!temp.path().join(year_month).join("labels.xml.gz").exists());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let year_month = "2024-02";
    seed_dumps(temp.path(), year_month);

    let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::open_in_memory().unwrap());
    let config = Config {
        data_dir: temp.path().to_path_buf(),
        ..Config::default()
    };
    let orchestrator = StepOrchestrator::new(Arc::clone(&repo), config);

    orchestrator
        .process_year_month(year_month, CancellationToken::new())
        .await
        .unwrap();

    // Staged files were deleted by Cleanup; a second invocation against
    // the same year_month should see every step already completed and
    // skip straight through without erroring (spec invariant 3).
    orchestrator
        .process_year_month(year_month, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(repo.count_labels().unwrap(), 2);
    assert_eq!(repo.count_artists().unwrap(), 2);
}

#[tokio::test]
async fn test_missing_dump_file_fails_fast() {
    let temp = TempDir::new().unwrap();
    let config = Config {
        data_dir: temp.path().to_path_buf(),
        ..Config::default()
    };
    let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::open_in_memory().unwrap());
    let orchestrator = StepOrchestrator::new(repo, config);

    let result = orchestrator
        .process_year_month("2024-03", CancellationToken::new())
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_repository_failure_halts_step_and_skips_downstream_steps() {
    let temp = TempDir::new().unwrap();
    let year_month = "2024-04";
    seed_dumps(temp.path(), year_month);

    let repo: Arc<dyn Repository> = Arc::new(FailingRepository {
        inner: SqliteRepository::open_in_memory().unwrap(),
    });
    let config = Config {
        data_dir: temp.path().to_path_buf(),
        ..Config::default()
    };
    let orchestrator = StepOrchestrator::new(Arc::clone(&repo), config);

    let result = orchestrator
        .process_year_month(year_month, CancellationToken::new())
        .await;

    assert!(result.is_err(), "a repository error on upsert must halt the step");

    // LabelsEntities is the first step and its flush is the one that
    // fails; nothing downstream (artists, masters, releases) should have
    // run.
    assert_eq!(repo.count_labels().unwrap(), 0);
    assert_eq!(repo.count_artists().unwrap(), 0);
    assert_eq!(repo.count_masters().unwrap(), 0);
    assert_eq!(repo.count_releases().unwrap(), 0);

    let run = repo.get_run(year_month).unwrap().expect("run persisted even on failure");
    assert!(!run.is_step_completed(discogs_core::model::Step::LabelsEntities));
    assert!(run
        .step_record(discogs_core::model::Step::LabelsEntities)
        .unwrap()
        .error
        .is_some());
}

#[tokio::test]
async fn test_progress_broadcaster_reports_real_totals_during_a_run() {
    let temp = TempDir::new().unwrap();
    let year_month = "2024-05";
    seed_dumps(temp.path(), year_month);

    let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::open_in_memory().unwrap());
    let config = Config {
        data_dir: temp.path().to_path_buf(),
        broadcast_interval_secs: 0,
        ..Config::default()
    };
    let orchestrator = StepOrchestrator::new(Arc::clone(&repo), config);

    let broadcaster = Arc::new(Mutex::new(ProgressBroadcaster::new(Duration::from_secs(0))));
    let mut events = broadcaster.lock().unwrap().subscribe();

    orchestrator
        .process_year_month_with_broadcaster(year_month, CancellationToken::new(), broadcaster)
        .await
        .expect("run should complete");

    let mut saw_releases_finish = false;
    while let Ok(event) = events.try_recv() {
        if event.step == "ReleasesEntities" && matches!(event.stage, StageTag::Completed) {
            assert_eq!(event.processed, 1);
            assert_eq!(event.total, 1);
            assert!((event.percentage - 100.0).abs() < f64::EPSILON);
            saw_releases_finish = true;
        }
    }
    assert!(saw_releases_finish, "expected a finish event for releases_entities with a non-trivial total");
}
