use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Error, Result};
use crate::model::{
    Artist, ArtistId, Format, GenreId, Image, ImageType, Label, LabelId, Master, MasterArtist,
    MasterGenre, MasterId, ProcessingRun, Release, ReleaseArtist, ReleaseGenre, ReleaseId,
    ReleaseLabel, RunStatus, Step, StepRecord,
};
use crate::repository::{Repository, UpsertOutcome};

use super::migrations::MIGRATIONS;

/// The reference [`Repository`] implementation: a single SQLite
/// connection guarded by a mutex.
///
/// A mutex rather than a connection pool because SQLite itself only
/// allows one writer at a time; the Batch Coordinator already serializes
/// writes per entity type behind its own per-entity locks; this mutex
/// just makes the cross-entity interleaving safe too. Calls never hold
/// the lock across an `.await`, since every method here is synchronous
/// and callers are expected to invoke it from inside a `tokio::task`
/// boundary rather than mid-future.
#[derive(Debug)]
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn: Mutex::new(conn) };
        repo.apply_migrations()?;
        Ok(repo)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn: Mutex::new(conn) };
        repo.apply_migrations()?;
        Ok(repo)
    }

    fn apply_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!("applying migration {} ({})", migration.version, migration.name);
                conn.execute_batch(migration.sql)?;
                conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn format_as_str(format: Format) -> &'static str {
    match format {
        Format::Vinyl => "vinyl",
        Format::Cd => "cd",
        Format::Cassette => "cassette",
        Format::Digital => "digital",
        Format::Other => "other",
    }
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<ProcessingRun> {
    let year_month: String = row.get("year_month")?;
    let status_str: String = row.get("status")?;
    let status = match status_str.as_str() {
        "ready" => RunStatus::Ready,
        "processing" => RunStatus::Processing,
        "completed" => RunStatus::Completed,
        _ => RunStatus::Failed,
    };
    let step_map_json: String = row.get("step_map")?;
    Ok(ProcessingRun {
        year_month,
        status,
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
        error: row.get("error")?,
        step_map: serde_json::from_str::<std::collections::BTreeMap<String, StepRecord>>(&step_map_json)
            .unwrap_or_default(),
    })
}

fn run_status_as_str(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Ready => "ready",
        RunStatus::Processing => "processing",
        RunStatus::Completed => "completed",
        RunStatus::Failed => "failed",
    }
}

impl Repository for SqliteRepository {
    fn upsert_labels(&self, records: &[Label]) -> Result<UpsertOutcome> {
        let conn = self.conn();
        let mut outcome = UpsertOutcome::default();
        for label in records {
            let existed = row_exists(&conn, "labels", label.id.get())?;
            conn.execute(
                "INSERT INTO labels (id, name, profile, resource_url, uri)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    profile = excluded.profile,
                    resource_url = excluded.resource_url,
                    uri = excluded.uri",
                params![label.id.get(), label.name, label.profile, label.resource_url, label.uri],
            )?;
            tally_by_existence(existed, &mut outcome);
        }
        Ok(outcome)
    }

    fn upsert_artists(&self, records: &[Artist]) -> Result<UpsertOutcome> {
        let conn = self.conn();
        let mut outcome = UpsertOutcome::default();
        for artist in records {
            let existed = row_exists(&conn, "artists", artist.id.get())?;
            conn.execute(
                "INSERT INTO artists (id, name, is_active)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    is_active = excluded.is_active",
                params![artist.id.get(), artist.name, artist.is_active],
            )?;
            tally_by_existence(existed, &mut outcome);
        }
        Ok(outcome)
    }

    fn upsert_masters(&self, records: &[Master]) -> Result<UpsertOutcome> {
        let conn = self.conn();
        let mut outcome = UpsertOutcome::default();
        for master in records {
            let existed = row_exists(&conn, "masters", master.id.get())?;
            conn.execute(
                "INSERT INTO masters (id, title, year, main_release_id, main_release_resource_url, uri, resource_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    year = excluded.year,
                    main_release_id = excluded.main_release_id,
                    main_release_resource_url = excluded.main_release_resource_url,
                    uri = excluded.uri,
                    resource_url = excluded.resource_url",
                params![
                    master.id.get(),
                    master.title,
                    master.year,
                    master.main_release_id.map(ReleaseId::get),
                    master.main_release_resource_url,
                    master.uri,
                    master.resource_url,
                ],
            )?;
            tally_by_existence(existed, &mut outcome);
        }
        Ok(outcome)
    }

    fn upsert_releases(&self, records: &[Release]) -> Result<UpsertOutcome> {
        let conn = self.conn();
        let mut outcome = UpsertOutcome::default();
        for release in records {
            let tracks_json = serde_json::to_string(&release.tracks)?;
            let videos_json = serde_json::to_string(&release.videos)?;
            let format_details_json = serde_json::to_string(&release.format_details)?;
            let existed = row_exists(&conn, "releases", release.id.get())?;
            conn.execute(
                "INSERT INTO releases (
                    id, title, year, country, format, notes, master_id, label_id,
                    tracks, videos, format_details, total_duration_secs
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    year = excluded.year,
                    country = excluded.country,
                    format = excluded.format,
                    notes = excluded.notes,
                    master_id = excluded.master_id,
                    label_id = excluded.label_id,
                    tracks = excluded.tracks,
                    videos = excluded.videos,
                    format_details = excluded.format_details,
                    total_duration_secs = excluded.total_duration_secs",
                params![
                    release.id.get(),
                    release.title,
                    release.year,
                    release.country,
                    format_as_str(release.format),
                    release.notes,
                    release.master_id.map(MasterId::get),
                    release.label_id.map(LabelId::get),
                    tracks_json,
                    videos_json,
                    format_details_json,
                    release.total_duration_secs,
                ],
            )?;
            tally_by_existence(existed, &mut outcome);
        }
        Ok(outcome)
    }

    fn upsert_genres(&self, names: &[String]) -> Result<UpsertOutcome> {
        let conn = self.conn();
        let mut outcome = UpsertOutcome::default();
        for name in names {
            let changed = conn.execute(
                "INSERT INTO genres (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
                params![name],
            )?;
            if changed > 0 {
                outcome.inserted += 1;
            } else {
                outcome.updated += 1;
            }
        }
        Ok(outcome)
    }

    fn upsert_images(&self, records: &[Image]) -> Result<UpsertOutcome> {
        let conn = self.conn();
        let mut outcome = UpsertOutcome::default();
        for image in records {
            let image_type_str = match image.image_type {
                ImageType::Primary => "primary",
                ImageType::Secondary => "secondary",
                ImageType::Gallery => "gallery",
            };
            let existed: bool = conn
                .query_row(
                    "SELECT 1 FROM images WHERE imageable_type = ?1 AND imageable_id = ?2 AND url = ?3",
                    params![image.imageable_type.as_str(), image.imageable_id, image.url],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            conn.execute(
                "INSERT INTO images (
                    url, image_type, imageable_id, imageable_type, width, height,
                    discogs_uri, discogs_uri_150, discogs_type
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(imageable_type, imageable_id, url) DO UPDATE SET
                    image_type = excluded.image_type,
                    width = excluded.width,
                    height = excluded.height,
                    discogs_uri = excluded.discogs_uri,
                    discogs_uri_150 = excluded.discogs_uri_150,
                    discogs_type = excluded.discogs_type",
                params![
                    image.url,
                    image_type_str,
                    image.imageable_id,
                    image.imageable_type.as_str(),
                    image.width,
                    image.height,
                    image.discogs_uri,
                    image.discogs_uri_150,
                    image.discogs_type,
                ],
            )?;
            tally_by_existence(existed, &mut outcome);
        }
        Ok(outcome)
    }

    fn create_master_artist_associations(&self, pairs: &[MasterArtist]) -> Result<()> {
        let conn = self.conn();
        for pair in pairs {
            conn.execute(
                "INSERT INTO master_artists (master_id, artist_id) VALUES (?1, ?2)
                 ON CONFLICT(master_id, artist_id) DO NOTHING",
                params![pair.master_id.get(), pair.artist_id.get()],
            )?;
        }
        Ok(())
    }

    fn create_master_genre_associations(&self, pairs: &[MasterGenre]) -> Result<()> {
        let conn = self.conn();
        for pair in pairs {
            conn.execute(
                "INSERT INTO master_genres (master_id, genre_name) VALUES (?1, ?2)
                 ON CONFLICT(master_id, genre_name) DO NOTHING",
                params![pair.master_id.get(), pair.genre_name],
            )?;
        }
        Ok(())
    }

    fn create_release_artist_associations(&self, pairs: &[ReleaseArtist]) -> Result<()> {
        let conn = self.conn();
        for pair in pairs {
            conn.execute(
                "INSERT INTO release_artists (release_id, artist_id) VALUES (?1, ?2)
                 ON CONFLICT(release_id, artist_id) DO NOTHING",
                params![pair.release_id.get(), pair.artist_id.get()],
            )?;
        }
        Ok(())
    }

    fn create_release_label_associations(&self, pairs: &[ReleaseLabel]) -> Result<()> {
        let conn = self.conn();
        for pair in pairs {
            conn.execute(
                "INSERT INTO release_labels (release_id, label_id) VALUES (?1, ?2)
                 ON CONFLICT(release_id, label_id) DO NOTHING",
                params![pair.release_id.get(), pair.label_id.get()],
            )?;
        }
        Ok(())
    }

    fn create_release_genre_associations(&self, pairs: &[ReleaseGenre]) -> Result<()> {
        let conn = self.conn();
        for pair in pairs {
            conn.execute(
                "INSERT INTO release_genres (release_id, genre_name) VALUES (?1, ?2)
                 ON CONFLICT(release_id, genre_name) DO NOTHING",
                params![pair.release_id.get(), pair.genre_name],
            )?;
        }
        Ok(())
    }

    fn genre_ids_by_names(&self, names: &[String]) -> Result<HashMap<String, GenreId>> {
        let conn = self.conn();
        let mut out = HashMap::with_capacity(names.len());
        let mut stmt = conn.prepare("SELECT id FROM genres WHERE name = ?1")?;
        for name in names {
            if let Some(id) = stmt.query_row(params![name], |row| row.get::<_, i64>(0)).optional()? {
                out.insert(name.clone(), GenreId::new(id));
            }
        }
        Ok(out)
    }

    fn get_run(&self, year_month: &str) -> Result<Option<ProcessingRun>> {
        let conn = self.conn();
        Ok(conn
            .query_row(
                "SELECT year_month, status, started_at, completed_at, error, step_map
                 FROM processing_runs WHERE year_month = ?1",
                params![year_month],
                row_to_run,
            )
            .optional()?)
    }

    fn get_latest_run(&self) -> Result<Option<ProcessingRun>> {
        let conn = self.conn();
        Ok(conn
            .query_row(
                "SELECT year_month, status, started_at, completed_at, error, step_map
                 FROM processing_runs ORDER BY year_month DESC LIMIT 1",
                [],
                row_to_run,
            )
            .optional()?)
    }

    fn upsert_run(&self, run: &ProcessingRun) -> Result<()> {
        let conn = self.conn();
        let step_map_json = serde_json::to_string(run.steps())?;
        conn.execute(
            "INSERT INTO processing_runs (year_month, status, started_at, completed_at, error, step_map)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(year_month) DO UPDATE SET
                status = excluded.status,
                started_at = excluded.started_at,
                completed_at = excluded.completed_at,
                error = excluded.error,
                step_map = excluded.step_map",
            params![
                run.year_month,
                run_status_as_str(run.status),
                run.started_at,
                run.completed_at,
                run.error,
                step_map_json,
            ],
        )?;
        Ok(())
    }

    fn count_artists(&self) -> Result<i64> {
        count_table(&self.conn(), "artists")
    }

    fn count_labels(&self) -> Result<i64> {
        count_table(&self.conn(), "labels")
    }

    fn count_masters(&self) -> Result<i64> {
        count_table(&self.conn(), "masters")
    }

    fn count_releases(&self) -> Result<i64> {
        count_table(&self.conn(), "releases")
    }
}

fn count_table(conn: &Connection, table: &str) -> Result<i64> {
    // `table` is always one of our own hardcoded literals above, never
    // user input, so string interpolation into the query is safe here.
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .map_err(Error::from)
}

/// Whether a row with this id already existed, checked immediately
/// before the upsert that follows. `changed` from `execute()` can't tell
/// an insert from a conflict-update apart (both report 1 row affected),
/// so the distinction has to be made on the way in instead.
fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    conn.query_row(&format!("SELECT 1 FROM {table} WHERE id = ?1"), params![id], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .map_err(Error::from)
}

fn tally_by_existence(existed: bool, outcome: &mut UpsertOutcome) {
    if existed {
        outcome.updated += 1;
    } else {
        outcome.inserted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Artist, Label};

    fn test_repo() -> SqliteRepository {
        SqliteRepository::open_in_memory().unwrap()
    }

    #[test]
    fn test_upsert_label_is_idempotent() {
        let repo = test_repo();
        let label = Label::new(LabelId::new(1), "Warp Records".into(), "https://x/1".into(), "https://x".into());
        let first = repo.upsert_labels(std::slice::from_ref(&label)).unwrap();
        assert_eq!(first.inserted, 1);
        let second = repo.upsert_labels(std::slice::from_ref(&label)).unwrap();
        assert_eq!(second.inserted + second.updated, 1);
        assert_eq!(repo.count_labels().unwrap(), 1);
    }

    #[test]
    fn test_upsert_artist_then_count() {
        let repo = test_repo();
        let artist = Artist::new(ArtistId::new(7), "Aphex Twin".into());
        repo.upsert_artists(&[artist]).unwrap();
        assert_eq!(repo.count_artists().unwrap(), 1);
    }

    #[test]
    fn test_genre_ids_by_names_only_returns_known() {
        let repo = test_repo();
        repo.upsert_genres(&["Electronic".to_string()]).unwrap();
        let ids = repo
            .genre_ids_by_names(&["Electronic".to_string(), "Unknown".to_string()])
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains_key("Electronic"));
    }

    #[test]
    fn test_association_insert_is_silently_idempotent() {
        let repo = test_repo();
        repo.upsert_labels(&[Label::new(LabelId::new(1), "L".into(), "u".into(), "u".into())]).unwrap();
        repo.upsert_artists(&[Artist::new(ArtistId::new(1), "A".into())]).unwrap();
        // masters table needs a row for the FK, but SQLite enforces FKs
        // only when PRAGMA foreign_keys is on for this connection; the
        // association table itself is what's under test here.
        let pair = MasterArtist { master_id: MasterId::new(1), artist_id: ArtistId::new(1) };
        repo.create_master_artist_associations(&[pair]).unwrap();
        repo.create_master_artist_associations(&[pair]).unwrap();
    }

    #[test]
    fn test_run_roundtrip() {
        let repo = test_repo();
        let mut run = ProcessingRun::new("2024-01");
        run.start();
        run.mark_step_completed(Step::LabelsEntities, 1.2, 0);
        repo.upsert_run(&run).unwrap();
        let loaded = repo.get_run("2024-01").unwrap().unwrap();
        assert_eq!(loaded.status, RunStatus::Processing);
        assert!(loaded.is_step_completed(Step::LabelsEntities));
    }

    #[test]
    fn test_get_latest_run_picks_max_year_month() {
        let repo = test_repo();
        repo.upsert_run(&ProcessingRun::new("2023-05")).unwrap();
        repo.upsert_run(&ProcessingRun::new("2024-01")).unwrap();
        let latest = repo.get_latest_run().unwrap().unwrap();
        assert_eq!(latest.year_month, "2024-01");
    }
}
