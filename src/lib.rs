//! tunepull - Audio library organizer and download history manager
//!
//! A yt-dlp front end that downloads media items, deduplicates them
//! against a persistent history, and keeps the resulting files in a
//! stable on-disk layout.
//!
//! # Architecture
//!
//! - The history store is the sole arbiter of "already downloaded":
//!   every item is checked before any network cost is paid, and
//!   recorded only after its files are durably placed.
//! - Path resolution is a pure function of item metadata and layout
//!   policy; file stems embed the platform id so distinct items can
//!   never collide.
//! - Playlist membership is a view: collection folders hold symlinks
//!   (or copies, where links are unsupported) to canonical files.
//!
//! # Modules
//!
//! - `adapters`: External extraction engine integration (yt-dlp)
//! - `core`: Organizer logic (HistoryStore, PathResolver,
//!   CanonicalStore, Pipeline, BatchRunner)
//! - `domain`: Data structures (Item, HistoryRecord, outcomes)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Pull one URL
//! tunepull pull <url> --output-dir ~/music --history-file ~/music/history.json
//!
//! # Pull a list of URLs
//! tunepull batch --urls-file urls.txt --config config.yaml
//!
//! # Inspect the history
//! tunepull history --history-file ~/music/history.json
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;

// Re-export main types at crate root for convenience
pub use adapters::{AcquiredFiles, Acquirer, YtDlpAcquirer};
pub use config::RunConfig;
pub use crate::core::{BatchRunner, CanonicalStore, HistoryStore, PathResolver, Pipeline};
pub use domain::{CollectionRef, HistoryRecord, Item, ItemOutcome, LayoutPolicy, RunSummary};
pub use error::{AcquireError, HistoryError, ItemError, PlacementError};
