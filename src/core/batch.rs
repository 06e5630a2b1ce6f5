//! Batch orchestration over a list of URLs.
//!
//! URLs are processed in order against one shared history store, one
//! item at a time. A failed item or an unexpandable URL is counted and
//! reported, never fatal; only history corruption (caught earlier, at
//! store open) stops a run.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::adapters::Acquirer;
use crate::domain::{ItemOutcome, RunSummary};

use super::history::HistoryStore;
use super::pipeline::Pipeline;

/// Leading marker for comment lines in a URLs file
const COMMENT_MARKER: char = '#';

/// Read URLs from a file, one per line.
///
/// Blank lines and lines starting with `#` are ignored. Lines that do
/// not look like URLs are warned about and skipped rather than counted
/// as failures.
pub fn read_urls(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read URLs file: {}", path.display()))?;

    let mut urls = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        if !(line.starts_with("http://") || line.starts_with("https://")) {
            warn!(line = line_num + 1, content = line, "Line does not look like a URL, skipping");
            continue;
        }
        urls.push(line.to_string());
    }

    Ok(urls)
}

/// Runs the single-item pipeline for every URL's expansion.
pub struct BatchRunner<'a> {
    pipeline: &'a Pipeline,
    acquirer: &'a dyn Acquirer,
}

impl<'a> BatchRunner<'a> {
    pub fn new(pipeline: &'a Pipeline, acquirer: &'a dyn Acquirer) -> Self {
        Self { pipeline, acquirer }
    }

    /// Process every URL in order, sequencing items through the shared
    /// history store. Failures are collected, not propagated.
    pub async fn run(&self, history: &mut HistoryStore, urls: &[String]) -> RunSummary {
        let mut summary = RunSummary::new();

        for (idx, url) in urls.iter().enumerate() {
            info!(url = %url, "Processing URL {}/{}", idx + 1, urls.len());
            self.run_url(history, url, &mut summary).await;
        }

        info!(
            recorded = summary.recorded,
            skipped = summary.skipped,
            failed = summary.failed(),
            "Batch finished"
        );
        summary
    }

    /// Process one URL: expand, then pipeline each item.
    #[instrument(skip(self, history, summary))]
    pub async fn run_url(&self, history: &mut HistoryStore, url: &str, summary: &mut RunSummary) {
        let items = match self.acquirer.expand(url).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Could not expand URL");
                summary.absorb(&ItemOutcome::Failed {
                    subject: url.to_string(),
                    error: e.into(),
                });
                return;
            }
        };

        let total = items.len();
        for (idx, item) in items.iter().enumerate() {
            if total > 1 {
                info!(item = %item.title, "Item {}/{}", idx + 1, total);
            }
            let outcome = self.pipeline.process(history, self.acquirer, item).await;
            summary.absorb(&outcome);
        }
    }
}
