//! Core organizer logic.
//!
//! This module contains:
//! - HistoryStore: Persistent deduplication history
//! - PathResolver: Pure layout-policy path mapping
//! - CanonicalStore: File placement and collection views
//! - Pipeline: Single-item processing
//! - BatchRunner: Sequential multi-URL orchestration

pub mod batch;
pub mod history;
pub mod layout;
pub mod pipeline;
pub mod placement;

// Re-export commonly used types
pub use batch::{read_urls, BatchRunner};
pub use history::HistoryStore;
pub use layout::{PathResolver, DEFAULT_MAX_SEGMENT_LEN};
pub use pipeline::Pipeline;
pub use placement::{CanonicalStore, LinkMode, LinkOutcome};
