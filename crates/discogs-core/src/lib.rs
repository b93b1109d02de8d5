//! Core domain model for discogs-ingest.
//!
//! This crate defines the Discogs-natural-keyed data model (Artist,
//! Label, Master, Release, Genre, Image, their associations, and the
//! `ProcessingRun` state machine), the SQLite schema, and the
//! `Repository` contract the ingestion pipeline upserts through.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod repository;
pub mod schema;

pub use error::{Error, Result};
pub use repository::{Repository, UpsertOutcome};
