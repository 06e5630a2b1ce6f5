//! Persistent download history with file-based JSON storage.
//!
//! The history file is the single deduplication gate: a record for an
//! item id means "already downloaded", whether or not the files still
//! exist on disk. The file is plain JSON so it stays hand-editable;
//! deleting an entry re-enables re-download of that id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::HistoryRecord;
use crate::error::HistoryError;

/// On-disk schema of the history file
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    /// Schema version
    version: u32,

    /// All recorded downloads
    records: Vec<HistoryRecord>,
}

/// File-backed history store, the sole arbiter of "already downloaded".
///
/// Single writer per run: an exclusive advisory lock on a sidecar
/// file is held for the lifetime of the store.
#[derive(Debug)]
pub struct HistoryStore {
    /// Path to the backing JSON file
    path: PathBuf,

    /// Records indexed by item id
    records: HashMap<String, HistoryRecord>,

    /// Lock handle; released on drop
    _lock: std::fs::File,
}

impl HistoryStore {
    /// Open a history store, loading any existing records.
    ///
    /// An absent or empty backing file means "no history yet". A file
    /// that is present but unparseable is a fatal `Corrupt` error; the
    /// run must abort rather than risk re-downloading everything or
    /// clobbering a recoverable file.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|source| HistoryError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
        }

        // Lock a sidecar file rather than the history file itself; the
        // history file gets atomically replaced on every write and a
        // lock on a replaced inode protects nothing.
        let lock_path = path.with_extension("json.lock");
        let lock = std::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|source| HistoryError::Io {
                path: path.clone(),
                source,
            })?;
        lock.try_lock_exclusive()
            .map_err(|_| HistoryError::Locked { path: path.clone() })?;

        let records = Self::load(&path).await?;
        debug!(path = %path.display(), count = records.len(), "Opened history store");

        Ok(Self {
            path,
            records,
            _lock: lock,
        })
    }

    /// Deserialize the backing file into a record map
    async fn load(path: &Path) -> Result<HashMap<String, HistoryRecord>, HistoryError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        let file: HistoryFile =
            serde_json::from_str(&content).map_err(|source| HistoryError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(file
            .records
            .into_iter()
            .map(|r| (r.item_id.clone(), r))
            .collect())
    }

    /// True iff a record exists for `item_id`
    pub fn contains(&self, item_id: &str) -> bool {
        self.records.contains_key(item_id)
    }

    /// Get the record for `item_id`, if any
    pub fn get(&self, item_id: &str) -> Option<&HistoryRecord> {
        self.records.get(item_id)
    }

    /// Insert or overwrite the record for an item and persist durably.
    ///
    /// The write hits disk (fsync + atomic rename) before this returns,
    /// so a crash cannot lose an acknowledged record. Callers invoke
    /// this only after the files are placed: recorded implies placed.
    pub async fn record(
        &mut self,
        item_id: impl Into<String>,
        canonical_path: impl Into<PathBuf>,
    ) -> Result<(), HistoryError> {
        let item_id = item_id.into();
        let record = HistoryRecord {
            item_id: item_id.clone(),
            canonical_path: canonical_path.into(),
            recorded_at: Utc::now(),
        };
        let previous = self.records.insert(item_id.clone(), record);
        if let Err(e) = self.persist().await {
            // Keep memory in step with disk: a record that never hit
            // disk must not make a later duplicate look downloaded.
            match previous {
                Some(prev) => {
                    self.records.insert(item_id, prev);
                }
                None => {
                    self.records.remove(&item_id);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Write the full record set to disk: temp file, fsync, rename.
    async fn persist(&self) -> Result<(), HistoryError> {
        let io_err = |source| HistoryError::Io {
            path: self.path.clone(),
            source,
        };

        let mut records: Vec<&HistoryRecord> = self.records.values().collect();
        records.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));

        let file = HistoryFile {
            version: 1,
            records: records.into_iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| HistoryError::Io {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .await
            .map_err(io_err)?;
        tmp.write_all(json.as_bytes()).await.map_err(io_err)?;
        tmp.sync_all().await.map_err(io_err)?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path).await.map_err(io_err)?;
        Ok(())
    }

    /// All records, most recent last
    pub fn records(&self) -> Vec<&HistoryRecord> {
        let mut records: Vec<&HistoryRecord> = self.records.values().collect();
        records.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        records
    }

    /// Number of recorded items
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no items have been recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Timestamp of the most recent record
    pub fn last_recorded_at(&self) -> Option<DateTime<Utc>> {
        self.records.values().map(|r| r.recorded_at).max()
    }
}
