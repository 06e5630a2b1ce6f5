//! yt-dlp adapter for media extraction.
//!
//! Subprocess mode: metadata comes from `yt-dlp -J`, audio from a
//! bestaudio download with opus extraction and embedded tags. The
//! engine does all network and transcoding work; this adapter only
//! shapes the contract.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use async_trait::async_trait;

use crate::domain::{CollectionRef, Item};
use crate::error::AcquireError;

use super::{AcquiredFiles, Acquirer};

/// yt-dlp adapter using subprocess mode
pub struct YtDlpAcquirer {
    /// Path to the extractor binary (default: "yt-dlp")
    binary_path: String,
}

impl Default for YtDlpAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpAcquirer {
    /// Create a new adapter with default binary discovery.
    ///
    /// Looks for yt-dlp first, falls back to youtube-dl.
    pub fn new() -> Self {
        let binary_path = if std::process::Command::new("yt-dlp")
            .arg("--version")
            .output()
            .is_ok()
        {
            "yt-dlp".to_string()
        } else {
            "youtube-dl".to_string()
        };

        Self { binary_path }
    }

    /// Create an adapter with a custom binary path
    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Run the engine and classify a non-zero exit via stderr
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, AcquireError> {
        debug!(binary = %self.binary_path, ?args, "Invoking extractor");

        let output = Command::new(&self.binary_path)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                AcquireError::Transient(format!("failed to spawn {}: {}", self.binary_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(stderr.trim()));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Acquirer for YtDlpAcquirer {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn expand(&self, url: &str) -> Result<Vec<Item>, AcquireError> {
        let stdout = self
            .run(&["-J", "--flat-playlist", "--no-warnings", url])
            .await?;

        let info: Value = serde_json::from_slice(&stdout).map_err(|e| {
            AcquireError::Transient(format!("unparseable extractor metadata: {}", e))
        })?;

        if info["_type"] == "playlist" || info.get("entries").is_some() {
            let collection = CollectionRef::new(
                text(&info, "id").unwrap_or_else(|| url.to_string()),
                text(&info, "title").unwrap_or_else(|| "Unknown Playlist".to_string()),
            );

            let entries = info["entries"].as_array().cloned().unwrap_or_default();
            let items = entries
                .iter()
                .filter_map(|entry| item_from_info(entry))
                .map(|item| item.with_collection(collection.clone()))
                .collect::<Vec<_>>();

            if items.is_empty() {
                return Err(AcquireError::Unavailable(format!(
                    "no items found in collection {}",
                    url
                )));
            }
            Ok(items)
        } else {
            let item = item_from_info(&info).ok_or_else(|| {
                AcquireError::Unavailable(format!("no item id in metadata for {}", url))
            })?;
            Ok(vec![item])
        }
    }

    async fn acquire(&self, item: &Item, staging: &Path) -> Result<AcquiredFiles, AcquireError> {
        let template = staging.join("%(id)s.%(ext)s");
        let template = template.to_string_lossy();

        self.run(&[
            "-f",
            "bestaudio/best",
            "--extract-audio",
            "--audio-format",
            "opus",
            "--audio-quality",
            "0",
            "--embed-metadata",
            "--embed-thumbnail",
            "--write-thumbnail",
            "--write-info-json",
            "--no-playlist",
            "--no-warnings",
            "-o",
            &template,
            &item.source_url,
        ])
        .await?;

        collect_staged(item, staging).await
    }
}

/// Find the engine's output files in the staging directory
async fn collect_staged(item: &Item, staging: &Path) -> Result<AcquiredFiles, AcquireError> {
    let mut audio = None;
    let mut thumbnail = None;
    let mut metadata = None;

    let mut entries = tokio::fs::read_dir(staging).await.map_err(|e| {
        AcquireError::Transient(format!("cannot read staging directory: {}", e))
    })?;

    while let Some(entry) = entries.next_entry().await.map_err(|e| {
        AcquireError::Transient(format!("cannot read staging directory: {}", e))
    })? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(&item.id) {
            continue;
        }

        if name.ends_with(".info.json") {
            metadata = Some(path);
        } else {
            match path.extension().and_then(|e| e.to_str()) {
                Some("opus") | Some("m4a") | Some("mp3") | Some("ogg") => audio = Some(path),
                Some("webp") | Some("jpg") | Some("jpeg") | Some("png") => thumbnail = Some(path),
                _ => {}
            }
        }
    }

    let audio = audio.ok_or_else(|| {
        AcquireError::Transient(format!("engine produced no audio file for {}", item.id))
    })?;

    Ok(AcquiredFiles {
        audio,
        thumbnail,
        metadata,
    })
}

/// Build an item from one extractor info object
fn item_from_info(info: &Value) -> Option<Item> {
    let id = text(info, "id")?;
    let title = text(info, "title").unwrap_or_else(|| "Unknown".to_string());
    let source_url = text(info, "webpage_url")
        .or_else(|| text(info, "url"))
        .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", id));

    let mut item = Item::new(id, title, source_url);

    // Artist fallback chain: artist, then uploader, then creator
    if let Some(artist) = text(info, "artist")
        .or_else(|| text(info, "uploader"))
        .or_else(|| text(info, "creator"))
    {
        item = item.with_artist(artist);
    }
    if let Some(album) = text(info, "album") {
        item = item.with_album(album);
    }

    Some(item)
}

fn text(info: &Value, key: &str) -> Option<String> {
    info.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Map engine stderr onto the error taxonomy.
///
/// "Gone forever" conditions must stay distinguishable from flaky
/// network ones, so callers can decide whether a retry is worth it.
fn classify_failure(stderr: &str) -> AcquireError {
    let lower = stderr.to_lowercase();

    if lower.contains("video unavailable")
        || lower.contains("private video")
        || lower.contains("has been removed")
        || lower.contains("account associated with this video has been terminated")
    {
        AcquireError::Unavailable(stderr.to_string())
    } else if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        AcquireError::Unsupported(stderr.to_string())
    } else {
        AcquireError::Transient(stderr.to_string())
    }
}
