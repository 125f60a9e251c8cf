//! Crate-wide typed errors.
//!
//! Each fallible subsystem gets its own variant set instead of one
//! catch-all enum, matching the taxonomy in the design notes: NotFound is
//! represented as `Option`, never as an error variant here.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from structural edits on a [`crate::track::Track`].
#[derive(Debug, Error, PartialEq, Clone)]
pub enum TrackError {
    #[error("track has no points")]
    EmptyTrack,

    #[error("index {index} out of range (track has {len} points)")]
    InvalidIndex { index: usize, len: usize },

    #[error("n must be >= 2, got {0}")]
    InvalidChunkSize(u32),

    /// A time-based operation found two consecutive, same-segment,
    /// timestamped points that are out of order. Carries the offending
    /// point's index and timestamp so the caller can report or navigate to it.
    #[error(
        "trackpoint {offending_index} (timestamp {offending_timestamp:?}) is out of order after \
         trackpoint {previous_index} (timestamp {previous_timestamp:?})"
    )]
    Ordering {
        previous_index: usize,
        previous_timestamp: Option<i64>,
        offending_index: usize,
        offending_timestamp: Option<i64>,
    },
}

/// Errors from loading a DEM tile.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read DEM file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized DEM format for {path}")]
    UnrecognizedFormat { path: PathBuf },

    #[error("corrupt DEM tile data in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// A cooperative cancellation signal propagated up through a long-running
/// operation, e.g. [`crate::dem::cache::DemCache::load_many`].
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Errors surfaced by the background job engine via `on_job_finished`.
#[derive(Debug, Error, Clone)]
pub enum JobError {
    #[error("job cancelled")]
    Cancelled,
    #[error("job failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Io(#[from] IoErrorMsg),
}

/// A cloneable stand-in for `std::io::Error`, which isn't `Clone`, so it can
/// travel through the job-status channel and be held by multiple observers.
#[derive(Debug, Error, Clone)]
#[error("{0}")]
pub struct IoErrorMsg(pub String);

impl From<std::io::Error> for IoErrorMsg {
    fn from(e: std::io::Error) -> Self {
        IoErrorMsg(e.to_string())
    }
}
