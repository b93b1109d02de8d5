//! Ingestion pipeline error types.
//!
//! Follows the §7 error taxonomy: `RecordDrop` and `DecodeError` at the
//! per-record level are contained inside the converter/decoder and never
//! become an [`IngestError`] — only failures that should halt a step do.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// A repository upsert or association-create call failed (§7 `BatchError`).
    #[error("repository error: {0}")]
    Repository(#[from] discogs_core::Error),

    /// File open, gzip read, or seek failure (§7 `IOError`).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML or an unexpected structure mid-stream that aborts the
    /// whole file rather than being logged and skipped (§7 `DecodeError`,
    /// the non-recoverable subset).
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A dump file expected at step start is missing (§7 `FatalConfig`).
    #[error("missing dump file: {0}")]
    MissingFile(String),

    /// The run was cancelled cooperatively (§7 `Cancelled`).
    #[error("ingestion cancelled")]
    Cancelled,

    /// A batch producer/consumer channel was unexpectedly closed.
    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
