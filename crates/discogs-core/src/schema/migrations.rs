/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Entities. All four carry their Discogs-assigned id as the primary key
-- (invariant 1): these dumps are re-ingested monthly and the id is the
-- only stable natural key Discogs gives us.

CREATE TABLE IF NOT EXISTS labels (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    profile TEXT,
    resource_url TEXT NOT NULL,
    uri TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS artists (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS masters (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    year INTEGER,
    main_release_id INTEGER,
    main_release_resource_url TEXT,
    uri TEXT NOT NULL,
    resource_url TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS releases (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    year INTEGER,
    country TEXT,
    format TEXT NOT NULL,
    notes TEXT,
    master_id INTEGER REFERENCES masters(id),
    label_id INTEGER REFERENCES labels(id),
    tracks TEXT NOT NULL DEFAULT '[]',
    videos TEXT NOT NULL DEFAULT '[]',
    format_details TEXT NOT NULL DEFAULT '[]',
    total_duration_secs INTEGER
);

CREATE INDEX IF NOT EXISTS idx_releases_master_id ON releases(master_id);
CREATE INDEX IF NOT EXISTS idx_releases_label_id ON releases(label_id);

-- Genres have no natural key (invariant 3): name is identity, the
-- surrogate `id` exists only for the Genre/Style Manager's cache.
CREATE TABLE IF NOT EXISTS genres (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    image_type TEXT NOT NULL,
    imageable_id INTEGER NOT NULL,
    imageable_type TEXT NOT NULL,
    width INTEGER,
    height INTEGER,
    discogs_uri TEXT NOT NULL,
    discogs_uri_150 TEXT,
    discogs_type TEXT,
    UNIQUE (imageable_type, imageable_id, url)
);

CREATE INDEX IF NOT EXISTS idx_images_imageable ON images(imageable_type, imageable_id);

-- Associations, flushed strictly after the entities/genres they reference
-- (spec §4.3 flush ordering).

CREATE TABLE IF NOT EXISTS master_artists (
    master_id INTEGER NOT NULL REFERENCES masters(id),
    artist_id INTEGER NOT NULL REFERENCES artists(id),
    PRIMARY KEY (master_id, artist_id)
);

CREATE TABLE IF NOT EXISTS master_genres (
    master_id INTEGER NOT NULL REFERENCES masters(id),
    genre_name TEXT NOT NULL,
    PRIMARY KEY (master_id, genre_name)
);

CREATE TABLE IF NOT EXISTS release_artists (
    release_id INTEGER NOT NULL REFERENCES releases(id),
    artist_id INTEGER NOT NULL REFERENCES artists(id),
    PRIMARY KEY (release_id, artist_id)
);

CREATE TABLE IF NOT EXISTS release_labels (
    release_id INTEGER NOT NULL REFERENCES releases(id),
    label_id INTEGER NOT NULL REFERENCES labels(id),
    PRIMARY KEY (release_id, label_id)
);

CREATE TABLE IF NOT EXISTS release_genres (
    release_id INTEGER NOT NULL REFERENCES releases(id),
    genre_name TEXT NOT NULL,
    PRIMARY KEY (release_id, genre_name)
);

-- One row per monthly dump ingested. `step_map` is a JSON blob keyed by
-- Step::as_str() rather than a side table: the orchestrator reads and
-- rewrites the whole map each time a step finishes, so there's no
-- concurrent-writer contention to design around.
CREATE TABLE IF NOT EXISTS processing_runs (
    year_month TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT,
    error TEXT,
    step_map TEXT NOT NULL DEFAULT '{}'
);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: MIGRATION_001,
}];
