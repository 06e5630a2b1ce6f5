//! Error taxonomy for the organizer core.
//!
//! Only history corruption is fatal to a run; every other error is
//! caught at the single-item pipeline boundary and reported as a
//! per-item outcome so the batch can continue.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the history store.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The backing file exists but cannot be parsed. Fatal: aborting
    /// beats silently discarding the deduplication history.
    #[error("history file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The backing file cannot be read or written.
    #[error("history file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another process holds the history lock.
    #[error("history file {path} is locked by another process")]
    Locked { path: PathBuf },
}

impl HistoryError {
    /// Whether this error must terminate the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HistoryError::Corrupt { .. } | HistoryError::Locked { .. })
    }
}

/// Errors surfaced by an acquisition adapter.
///
/// The pipeline treats all three kinds as item-level failures, but the
/// caller can tell a dead item apart from a flaky network.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The item has been removed, made private, or never existed.
    #[error("item unavailable: {0}")]
    Unavailable(String),

    /// Transient condition (network, rate limiting); retrying a later
    /// run may succeed.
    #[error("transient acquisition failure: {0}")]
    Transient(String),

    /// The URL or platform is not supported by the engine.
    #[error("unsupported source: {0}")]
    Unsupported(String),
}

/// Filesystem failures while moving acquired files into the library.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The adapter reported success but left no audio file in staging.
    #[error("no audio file found in staging for item {item_id}")]
    MissingAudio { item_id: String },
}

/// Any error that fails a single item without stopping the run.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// Recording failed after placement; the item is not marked done,
    /// so a re-run will pick it up again.
    #[error(transparent)]
    History(#[from] HistoryError),
}
