//! Run configuration.
//!
//! Batch runs load a YAML config file supplying the output root, the
//! history file, and the layout policy; the single-URL command builds
//! the same resolved config from flags. `~` in configured paths is
//! expanded against the user's home directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::DEFAULT_MAX_SEGMENT_LEN;
use crate::domain::LayoutPolicy;

/// Default name of the collections view directory under the root
const DEFAULT_COLLECTIONS_DIR: &str = "playlists";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Root folder for downloads
    pub output_dir: String,

    /// JSON history file tracking downloaded items
    pub history_file: String,

    /// Layout policy (default: hierarchical)
    #[serde(default)]
    pub layout: Option<LayoutPolicy>,

    /// Name of the collection views folder under the root
    #[serde(default)]
    pub collections_dir: Option<String>,

    /// Cap on a single path segment's length
    #[serde(default)]
    pub max_segment_len: Option<usize>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Absolute output root
    pub output_dir: PathBuf,

    /// Absolute history file path
    pub history_file: PathBuf,

    pub layout: LayoutPolicy,

    pub collections_dir: String,

    pub max_segment_len: usize,
}

impl RunConfig {
    /// Build a config directly from CLI flags (single-URL command)
    pub fn new(output_dir: impl Into<PathBuf>, history_file: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: expand_tilde(output_dir.into()),
            history_file: expand_tilde(history_file.into()),
            layout: LayoutPolicy::default(),
            collections_dir: DEFAULT_COLLECTIONS_DIR.to_string(),
            max_segment_len: DEFAULT_MAX_SEGMENT_LEN,
        }
    }

    /// Load and resolve a YAML config file (batch command)
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(Self {
            output_dir: expand_tilde(PathBuf::from(file.output_dir)),
            history_file: expand_tilde(PathBuf::from(file.history_file)),
            layout: file.layout.unwrap_or_default(),
            collections_dir: file
                .collections_dir
                .unwrap_or_else(|| DEFAULT_COLLECTIONS_DIR.to_string()),
            max_segment_len: file.max_segment_len.unwrap_or(DEFAULT_MAX_SEGMENT_LEN),
        })
    }

    /// Force flat layout (CLI override flag)
    pub fn with_flat_layout(mut self, flat: bool) -> Self {
        if flat {
            self.layout = LayoutPolicy::Flat;
        }
        self
    }
}

/// Expand a leading `~/` against the home directory
fn expand_tilde(path: PathBuf) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path
}
