//! Per-item outcomes and the run summary they roll up into.

use std::path::PathBuf;

use crate::error::ItemError;

/// Terminal state of one item's trip through the pipeline.
#[derive(Debug)]
pub enum ItemOutcome {
    /// History hit; no acquisition cost was paid
    Skipped {
        item_id: String,
        canonical_path: PathBuf,
    },

    /// Acquired, placed, and durably recorded
    Recorded {
        item_id: String,
        canonical_path: PathBuf,
    },

    /// Failed after the history check; the run continues
    Failed {
        /// Item id when known, otherwise the source URL
        subject: String,
        error: ItemError,
    },
}

impl ItemOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ItemOutcome::Failed { .. })
    }
}

/// Aggregate result of a batch run.
///
/// Partial success is preserved: failures never roll back items that
/// were already recorded.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub skipped: usize,
    pub recorded: usize,
    /// (subject, error message) for each failed item or URL
    pub failures: Vec<(String, String)>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the summary
    pub fn absorb(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Recorded { .. } => self.recorded += 1,
            ItemOutcome::Failed { subject, error } => {
                self.failures.push((subject.clone(), error.to_string()));
            }
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.skipped + self.recorded + self.failed()
    }

    /// Process exit code: zero iff every item was skipped or recorded
    pub fn exit_code(&self) -> i32 {
        if self.failures.is_empty() {
            0
        } else {
            1
        }
    }
}
