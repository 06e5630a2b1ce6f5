//! Acquisition adapters for external extraction engines.
//!
//! An adapter turns a source URL into item metadata (expansion) and
//! raw files in a staging directory (acquisition). Everything past
//! this contract (network retries, codec selection, tag embedding)
//! is the engine's business.

pub mod ytdlp;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::Item;
use crate::error::AcquireError;

// Re-export the yt-dlp adapter
pub use ytdlp::YtDlpAcquirer;

/// Files produced by a successful acquisition, inside the staging
/// directory handed to `acquire`.
#[derive(Debug, Clone)]
pub struct AcquiredFiles {
    /// The transcoded audio file; its extension decides the canonical
    /// file name's extension
    pub audio: PathBuf,

    /// Thumbnail image, if the engine produced one
    pub thumbnail: Option<PathBuf>,

    /// Sidecar metadata (engine info JSON), if written
    pub metadata: Option<PathBuf>,
}

impl AcquiredFiles {
    /// Audio-only result
    pub fn new(audio: PathBuf) -> Self {
        Self {
            audio,
            thumbnail: None,
            metadata: None,
        }
    }
}

/// Trait for acquisition engines.
#[async_trait]
pub trait Acquirer: Send + Sync {
    /// Human-readable engine name
    fn name(&self) -> &str;

    /// Resolve a URL into one or more items.
    ///
    /// A collection URL expands into its member items, each carrying a
    /// `CollectionRef`; a plain item URL yields a single entry.
    async fn expand(&self, url: &str) -> Result<Vec<Item>, AcquireError>;

    /// Download and transcode one item into `staging`.
    async fn acquire(&self, item: &Item, staging: &Path) -> Result<AcquiredFiles, AcquireError>;
}
