use std::path::PathBuf;

use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};

/// Configuration for discogs-ingest.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (`DISCOGS_*` prefix)
/// 3. Config file (~/.config/discogs-ingest/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding `{YYYY-MM}/{labels,artists,masters,releases}.xml.gz`.
    ///
    /// Can be set via:
    /// - ENV: `DISCOGS_DATA_DIR`
    /// - Config: `data_dir = "..."`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: `DISCOGS_DATABASE_PATH`
    /// - Config: `database_path = "/path/to/db"`
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Capacity of each of the eight fan-out channels (spec §4.3).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Flush threshold for entity/association batches (spec §4.4).
    #[serde(default = "default_entity_flush_threshold")]
    pub entity_flush_threshold: usize,

    /// Flush threshold for releases specifically, which are 10x heavier
    /// (spec §4.4).
    #[serde(default = "default_release_flush_threshold")]
    pub release_flush_threshold: usize,

    /// Progress broadcast throttle interval, in seconds (spec §4.7).
    #[serde(default = "default_broadcast_interval_secs")]
    pub broadcast_interval_secs: u64,

    /// Logging configuration.
    #[serde(default = "default_logging")]
    pub logging: twyg::Opts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_path: default_db_path(),
            channel_capacity: default_channel_capacity(),
            entity_flush_threshold: default_entity_flush_threshold(),
            release_flush_threshold: default_release_flush_threshold(),
            broadcast_interval_secs: default_broadcast_interval_secs(),
            logging: default_logging(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("discogs");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with a custom database path.
    ///
    /// Used when the `--db` CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("discogs-ingest")
        .join("dumps")
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("discogs-ingest")
        .join("discogs.db")
}

const fn default_channel_capacity() -> usize {
    10_000
}

const fn default_entity_flush_threshold() -> usize {
    5_000
}

const fn default_release_flush_threshold() -> usize {
    2_000
}

const fn default_broadcast_interval_secs() -> u64 {
    10
}

fn default_logging() -> twyg::Opts {
    twyg::OptsBuilder::new()
        .coloured(true)
        .output(twyg::Output::Stdout)
        .level(twyg::LogLevel::Info)
        .report_caller(false)
        .pad_level(true)
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Warning: Failed to build logging config: {e}, using fallback");
            twyg::Opts::default()
        })
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/discogs-ingest/config.toml
/// - macOS: ~/Library/Application Support/discogs-ingest/config.toml
/// - Windows: %APPDATA%\discogs-ingest\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("discogs-ingest")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r###"# discogs-ingest Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (DISCOGS_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Root directory holding {YYYY-MM}/{labels,artists,masters,releases}.xml.gz
#
# Can also be set via:
# - Environment: DISCOGS_DATA_DIR=/path/to/dumps
#data_dir = "/path/to/dumps"

# Path to the SQLite database
#
# Can also be set via:
# - CLI: discogs-ingest --db /custom/path.db run
# - Environment: DISCOGS_DATABASE_PATH=/custom/path.db
#database_path = "/path/to/custom/discogs.db"

# Capacity of each of the eight fan-out channels
# Default: 10000
#channel_capacity = 10000

# Flush threshold for entity/association batches
# Default: 5000
#entity_flush_threshold = 5000

# Flush threshold for release batches (10x heavier than other entities)
# Default: 2000
#release_flush_threshold = 2000

# Progress broadcast throttle interval, in seconds
# Default: 10
#broadcast_interval_secs = 10

# Logging configuration
#
# All options can also be set via environment variables with DISCOGS_LOGGING_* prefix
[logging]
# Enable colored output (true/false)
coloured = true

# Output destination: "stdout" or "stderr"
output = "stdout"

# Log level: "trace", "debug", "info", "warn", "error"
level = "info"

# Report caller location (file and line number)
report_caller = false

# Pad level names to equal width
pad_level = true
"###
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.database_path.as_os_str().is_empty());
        assert_eq!(config.channel_capacity, 10_000);
        assert_eq!(config.entity_flush_threshold, 5_000);
        assert_eq!(config.release_flush_threshold, 2_000);
        assert_eq!(config.broadcast_interval_secs, 10);
        assert_eq!(config.logging.level(), twyg::LogLevel::Info);
    }

    #[test]
    fn test_config_load() {
        let result = Config::load();
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_with_custom_db_path() {
        let custom_path = PathBuf::from("/tmp/test-discogs.db");
        let config = Config::load_with_db_path(custom_path.clone());
        assert!(config.is_ok());
        assert_eq!(config.unwrap().database_path, custom_path);
    }
}
