//! Resolves staged dump file paths and discovers the current `YYYY-MM`.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{IngestError, Result};

/// The four entity files a monthly dump is split across (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFile {
    Labels,
    Artists,
    Masters,
    Releases,
}

impl DumpFile {
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Labels => "labels",
            Self::Artists => "artists",
            Self::Masters => "masters",
            Self::Releases => "releases",
        }
    }
}

/// Locates `{data_dir}/{year_month}/{file_stem}.xml.gz`.
#[must_use]
pub fn dump_path(data_dir: &Path, year_month: &str, file: DumpFile) -> PathBuf {
    data_dir
        .join(year_month)
        .join(format!("{}.xml.gz", file.file_stem()))
}

/// Verifies all four dump files exist for `year_month`, returning the
/// first missing one as a `FatalConfig` error (spec §7).
pub fn verify_dump_files_present(data_dir: &Path, year_month: &str) -> Result<()> {
    for file in [
        DumpFile::Labels,
        DumpFile::Artists,
        DumpFile::Masters,
        DumpFile::Releases,
    ] {
        let path = dump_path(data_dir, year_month, file);
        if !path.exists() {
            return Err(IngestError::MissingFile(path.display().to_string()));
        }
    }
    Ok(())
}

/// The current `YYYY-MM`, used when no explicit month is supplied.
#[must_use]
pub fn current_year_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

/// Deletes the four staged dump files for `year_month` (spec §4.8
/// Cleanup step). Missing files are not an error — cleanup may run after
/// a previous partial cleanup.
pub fn remove_dump_files(data_dir: &Path, year_month: &str) -> Result<()> {
    for file in [
        DumpFile::Labels,
        DumpFile::Artists,
        DumpFile::Masters,
        DumpFile::Releases,
    ] {
        let path = dump_path(data_dir, year_month, file);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_path_shape() {
        let path = dump_path(Path::new("/data"), "2024-01", DumpFile::Releases);
        assert_eq!(path, PathBuf::from("/data/2024-01/releases.xml.gz"));
    }

    #[test]
    fn test_verify_dump_files_present_reports_missing() {
        let temp = tempfile::tempdir().unwrap();
        let err = verify_dump_files_present(temp.path(), "2024-01").unwrap_err();
        assert!(matches!(err, IngestError::MissingFile(_)));
    }

    #[test]
    fn test_current_year_month_shape() {
        let ym = current_year_month();
        assert_eq!(ym.len(), 7);
        assert_eq!(ym.as_bytes()[4], b'-');
    }
}
