//! Canonical file placement and collection views.
//!
//! The canonical store owns the physical files under the output root.
//! Collection (playlist) folders hold non-owning references to the
//! canonical files: symlinks where the platform allows them, plain
//! copies where it does not. Deleting a view entry never deletes the
//! canonical files.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::adapters::AcquiredFiles;
use crate::domain::Item;
use crate::error::PlacementError;

/// Link mechanism selected by a one-time capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Symbolic links are available
    Symlink,

    /// Symlinks unsupported or unauthorized; fall back to copying
    Copy,
}

/// How a collection reference was materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A symlink (or an existing entry) points at the canonical file
    Linked,

    /// Degraded to a byte copy; the item still counts as recorded
    Copied,
}

/// Owns the output root: places acquired files at their canonical
/// location and maintains collection views.
pub struct CanonicalStore {
    /// Absolute output root
    root: PathBuf,

    /// Directory under the root holding collection view folders
    collections_dir: String,

    /// Probed once at open
    link_mode: LinkMode,
}

impl CanonicalStore {
    /// Open the store, creating the root and probing link support.
    pub async fn open(
        root: impl Into<PathBuf>,
        collections_dir: impl Into<String>,
    ) -> Result<Self, PlacementError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| PlacementError::CreateDir {
                path: root.clone(),
                source,
            })?;

        let link_mode = probe_link_support(&root).await;
        debug!(root = %root.display(), ?link_mode, "Opened canonical store");

        Ok(Self {
            root,
            collections_dir: collections_dir.into(),
            link_mode,
        })
    }

    /// Open the store with a fixed link mode instead of probing.
    pub async fn with_link_mode(
        root: impl Into<PathBuf>,
        collections_dir: impl Into<String>,
        link_mode: LinkMode,
    ) -> Result<Self, PlacementError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| PlacementError::CreateDir {
                path: root.clone(),
                source,
            })?;

        Ok(Self {
            root,
            collections_dir: collections_dir.into(),
            link_mode,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn link_mode(&self) -> LinkMode {
        self.link_mode
    }

    /// Move acquired files to their canonical location.
    ///
    /// Returns the canonical audio path relative to the root (stem plus
    /// the adapter-chosen extension). Sidecar files (thumbnail,
    /// metadata) land next to the audio under the same stem. Idempotent:
    /// if the canonical audio file already exists the filesystem is not
    /// touched. On failure, partially placed files are removed before
    /// the error surfaces.
    pub async fn place(
        &self,
        item: &Item,
        stem: &Path,
        acquired: &AcquiredFiles,
    ) -> Result<PathBuf, PlacementError> {
        let ext = acquired
            .audio
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| PlacementError::MissingAudio {
                item_id: item.id.clone(),
            })?;

        // Append rather than Path::with_extension: the stem ends in
        // the item id suffix, which must survive intact.
        let relative = PathBuf::from(format!("{}.{}", stem.display(), ext));
        let audio_dest = self.root.join(&relative);

        if fs::try_exists(&audio_dest).await.unwrap_or(false) {
            debug!(path = %audio_dest.display(), "Canonical file already present");
            return Ok(relative);
        }

        if let Some(parent) = audio_dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| PlacementError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let mut placed: Vec<PathBuf> = Vec::new();

        let mut sidecars: Vec<(&PathBuf, PathBuf)> = Vec::new();
        if let Some(thumb) = &acquired.thumbnail {
            if let Some(e) = thumb.extension().and_then(|e| e.to_str()) {
                sidecars.push((
                    thumb,
                    self.root.join(format!("{}.{}", stem.display(), e)),
                ));
            }
        }
        if let Some(meta) = &acquired.metadata {
            sidecars.push((meta, self.root.join(format!("{}.info.json", stem.display()))));
        }

        for (from, to) in std::iter::once((&acquired.audio, audio_dest.clone())).chain(sidecars) {
            match move_file(from, &to).await {
                Ok(()) => placed.push(to),
                Err(source) => {
                    // No half-written canonical entries
                    for p in &placed {
                        let _ = fs::remove_file(p).await;
                    }
                    return Err(PlacementError::Move {
                        from: from.clone(),
                        to,
                        source,
                    });
                }
            }
        }

        Ok(relative)
    }

    /// Create a reference to `canonical` inside the named collection's
    /// view folder.
    ///
    /// Uses a symlink when the probe said so, otherwise copies the
    /// canonical file with a warning. Idempotent when the entry already
    /// exists. The primary copy is already safely placed when this is
    /// called, so failures here should be rare and are item-level.
    pub async fn link_into_collection(
        &self,
        collection_name: &str,
        canonical: &Path,
    ) -> Result<LinkOutcome, PlacementError> {
        let target = self.root.join(canonical);
        let file_name = target
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("item"));

        let view_dir = self.root.join(&self.collections_dir).join(collection_name);
        fs::create_dir_all(&view_dir)
            .await
            .map_err(|source| PlacementError::CreateDir {
                path: view_dir.clone(),
                source,
            })?;

        let entry = view_dir.join(file_name);
        if entry_exists(&entry).await {
            debug!(entry = %entry.display(), "Collection entry already present");
            return Ok(LinkOutcome::Linked);
        }

        match self.link_mode {
            LinkMode::Symlink => match create_symlink(&target, &entry).await {
                Ok(()) => Ok(LinkOutcome::Linked),
                Err(e) => {
                    // Primary copy is safe; degrade rather than fail the item
                    warn!(
                        entry = %entry.display(),
                        error = %e,
                        "Symlink creation failed, falling back to copy"
                    );
                    self.copy_into_view(&target, &entry).await
                }
            },
            LinkMode::Copy => {
                warn!(
                    entry = %entry.display(),
                    "Symlinks unsupported on this platform, copying into collection"
                );
                self.copy_into_view(&target, &entry).await
            }
        }
    }

    async fn copy_into_view(&self, target: &Path, entry: &Path) -> Result<LinkOutcome, PlacementError> {
        fs::copy(target, entry)
            .await
            .map_err(|source| PlacementError::Move {
                from: target.to_path_buf(),
                to: entry.to_path_buf(),
                source,
            })?;
        Ok(LinkOutcome::Copied)
    }
}

/// True if a directory entry exists, including dangling symlinks
async fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).await.is_ok()
}

/// Rename, with a copy-and-remove fallback for cross-device staging
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to).await?;
            let _ = fs::remove_file(from).await;
            Ok(())
        }
    }
}

#[cfg(unix)]
async fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    fs::symlink(target, link).await
}

#[cfg(windows)]
async fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    fs::symlink_file(target, link).await
}

/// Probe symlink support once: create and remove a throwaway link.
///
/// Windows without developer mode and some mounted filesystems refuse
/// symlinks; in that case every collection reference degrades to a copy.
async fn probe_link_support(root: &Path) -> LinkMode {
    let probe_target = root.join(".tunepull-probe-target");
    let probe_link = root.join(".tunepull-probe-link");

    let _ = fs::remove_file(&probe_link).await;
    let _ = fs::remove_file(&probe_target).await;

    if fs::write(&probe_target, b"probe").await.is_err() {
        return LinkMode::Copy;
    }

    let mode = match create_symlink(&probe_target, &probe_link).await {
        Ok(()) => LinkMode::Symlink,
        Err(_) => LinkMode::Copy,
    };

    let _ = fs::remove_file(&probe_link).await;
    let _ = fs::remove_file(&probe_target).await;

    mode
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AcquiredFiles;
    use crate::domain::Item;
    use tempfile::TempDir;

    async fn staged_files(staging: &Path) -> AcquiredFiles {
        let audio = staging.join("raw.opus");
        let thumb = staging.join("raw.webp");
        fs::write(&audio, b"audio-bytes").await.unwrap();
        fs::write(&thumb, b"thumb-bytes").await.unwrap();
        AcquiredFiles {
            audio,
            thumbnail: Some(thumb),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_place_moves_files_under_root() {
        let root = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let store = CanonicalStore::open(root.path(), "playlists").await.unwrap();

        let item = Item::new("abc123", "Song", "url");
        let acquired = staged_files(staging.path()).await;

        let canonical = store
            .place(&item, Path::new("Band/LP/Song.abc123"), &acquired)
            .await
            .unwrap();

        assert_eq!(canonical, PathBuf::from("Band/LP/Song.abc123.opus"));
        assert!(root.path().join(&canonical).exists());
        assert!(root.path().join("Band/LP/Song.abc123.webp").exists());
        assert!(!acquired.audio.exists(), "staging file should be moved away");
    }

    #[tokio::test]
    async fn test_place_is_idempotent() {
        let root = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let store = CanonicalStore::open(root.path(), "playlists").await.unwrap();
        let item = Item::new("abc123", "Song", "url");

        let acquired = staged_files(staging.path()).await;
        let first = store
            .place(&item, Path::new("Song.abc123"), &acquired)
            .await
            .unwrap();
        let before = fs::read(root.path().join(&first)).await.unwrap();

        // Second placement with different staged bytes must not touch
        // the canonical file
        let audio = staging.path().join("other.opus");
        fs::write(&audio, b"different-bytes").await.unwrap();
        let again = AcquiredFiles {
            audio,
            thumbnail: None,
            metadata: None,
        };
        let second = store
            .place(&item, Path::new("Song.abc123"), &again)
            .await
            .unwrap();

        assert_eq!(first, second);
        let after = fs::read(root.path().join(&first)).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_link_into_collection_creates_entry() {
        let root = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let store = CanonicalStore::open(root.path(), "playlists").await.unwrap();
        let item = Item::new("abc123", "Song", "url");

        let acquired = staged_files(staging.path()).await;
        let canonical = store
            .place(&item, Path::new("Song.abc123"), &acquired)
            .await
            .unwrap();

        let outcome = store
            .link_into_collection("Road Trip", &canonical)
            .await
            .unwrap();

        let entry = root.path().join("playlists/Road Trip/Song.abc123.opus");
        assert!(entry_exists(&entry).await);

        // Whichever mechanism was used, the bytes resolve to the
        // canonical content
        let bytes = fs::read(&entry).await.unwrap();
        assert_eq!(bytes, b"audio-bytes");

        if store.link_mode() == LinkMode::Symlink {
            assert_eq!(outcome, LinkOutcome::Linked);
            assert!(fs::symlink_metadata(&entry)
                .await
                .unwrap()
                .file_type()
                .is_symlink());
        }
    }

    #[tokio::test]
    async fn test_link_is_idempotent() {
        let root = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let store = CanonicalStore::open(root.path(), "playlists").await.unwrap();
        let item = Item::new("abc123", "Song", "url");

        let acquired = staged_files(staging.path()).await;
        let canonical = store
            .place(&item, Path::new("Song.abc123"), &acquired)
            .await
            .unwrap();

        store.link_into_collection("Mix", &canonical).await.unwrap();
        let outcome = store.link_into_collection("Mix", &canonical).await.unwrap();
        assert_eq!(outcome, LinkOutcome::Linked);
    }

    #[tokio::test]
    async fn test_copy_mode_materializes_regular_file() {
        let root = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let store = CanonicalStore::with_link_mode(root.path(), "playlists", LinkMode::Copy)
            .await
            .unwrap();
        let item = Item::new("abc123", "Song", "url");

        let acquired = staged_files(staging.path()).await;
        let canonical = store
            .place(&item, Path::new("Song.abc123"), &acquired)
            .await
            .unwrap();

        let outcome = store.link_into_collection("Mix", &canonical).await.unwrap();
        assert_eq!(outcome, LinkOutcome::Copied);

        // The entry is a plain file, not a symlink
        let entry = root.path().join("playlists/Mix/Song.abc123.opus");
        let meta = fs::symlink_metadata(&entry).await.unwrap();
        assert!(meta.file_type().is_file());
        assert_eq!(fs::read(&entry).await.unwrap(), b"audio-bytes");
    }

    #[tokio::test]
    async fn test_deleting_view_entry_keeps_canonical_file() {
        let root = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let store = CanonicalStore::open(root.path(), "playlists").await.unwrap();
        let item = Item::new("abc123", "Song", "url");

        let acquired = staged_files(staging.path()).await;
        let canonical = store
            .place(&item, Path::new("Song.abc123"), &acquired)
            .await
            .unwrap();
        store.link_into_collection("Mix", &canonical).await.unwrap();

        fs::remove_file(root.path().join("playlists/Mix/Song.abc123.opus"))
            .await
            .unwrap();
        assert!(root.path().join(&canonical).exists());
    }
}
