//! Domain types for the tunepull organizer.
//!
//! This module contains the core data structures:
//! - Item: One downloadable media unit
//! - HistoryRecord: Persisted outcome of a successful acquisition
//! - ItemOutcome / RunSummary: Per-item and per-run results

pub mod item;
pub mod outcome;

// Re-export commonly used types
pub use item::{CollectionRef, HistoryRecord, Item, LayoutPolicy};
pub use outcome::{ItemOutcome, RunSummary};
