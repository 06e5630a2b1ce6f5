//! Core data structures for items and the download history.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One downloadable media unit resolved from a source URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Stable platform identifier; non-empty, used as the history key
    pub id: String,

    /// Human-readable display name
    pub title: String,

    /// Track artist, if the platform exposes one
    pub artist: Option<String>,

    /// Album name, if the platform exposes one
    pub album: Option<String>,

    /// Collection (playlist) this item was discovered under
    pub collection: Option<CollectionRef>,

    /// Resolved URL handed to the acquisition adapter
    pub source_url: String,
}

impl Item {
    /// Create a standalone item with no album/artist metadata
    pub fn new(id: impl Into<String>, title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: None,
            album: None,
            collection: None,
            source_url: source_url.into(),
        }
    }

    /// Attach artist metadata
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Attach album metadata
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Mark this item as a member of a collection
    pub fn with_collection(mut self, collection: CollectionRef) -> Self {
        self.collection = Some(collection);
        self
    }
}

/// Reference to the collection an item belongs to.
///
/// Weak by design: collections never own item files, they only get a
/// named view pointing at the canonical location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    /// Platform identifier of the collection
    pub id: String,

    /// Display name, used for the view folder
    pub title: String,
}

impl CollectionRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Persisted outcome of a successful acquisition.
///
/// Presence of a record means "do not re-download", independent of
/// whether the files still exist on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Item id (unique key)
    pub item_id: String,

    /// Location of the primary files, relative to the output root
    pub canonical_path: PathBuf,

    /// When the record was written (ISO 8601)
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Create a record stamped with the current time
    pub fn new(item_id: impl Into<String>, canonical_path: impl Into<PathBuf>) -> Self {
        Self {
            item_id: item_id.into(),
            canonical_path: canonical_path.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// On-disk layout policy, fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPolicy {
    /// artist/album tree with collection views sharing files via links
    Hierarchical,

    /// Everything directly under the output root; no views, no links
    Flat,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self::Hierarchical
    }
}
