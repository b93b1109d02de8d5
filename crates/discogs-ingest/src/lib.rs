//! Streaming ingestion pipeline for the monthly Discogs data dumps.
//!
//! Decodes the four gzip-wrapped dump files token-by-token, converts raw
//! records into the `discogs-core` domain model, fans them out into
//! deduplicating batch accumulators, and upserts them through the
//! `Repository` contract under a fixed, resumable step order.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod batch;
pub mod broadcast;
pub mod config;
pub mod convert;
pub mod decode;
pub mod dump;
pub mod error;
pub mod fanout;
pub mod genre;
pub mod orchestrator;

pub use batch::{BatchCoordinator, FlushThresholds};
pub use broadcast::{ProgressBroadcaster, ProgressEvent, StageTag};
pub use config::Config;
pub use convert::DropReason;
pub use dump::{current_year_month, DumpFile};
pub use error::{IngestError, Result};
pub use fanout::{build_fanout, FanoutReceivers, FanoutSenders};
pub use genre::GenreManager;
pub use orchestrator::StepOrchestrator;
