//! Single-item pipeline: resolve, check history, acquire, place, link,
//! record.
//!
//! Every step error after the history check is caught here and turned
//! into a per-item outcome so a batch can keep moving. Two orderings
//! are load-bearing:
//! - the history store is consulted before any acquisition cost is
//!   paid, and
//! - the history record is written only after the files are durably
//!   placed, so "recorded" always implies "placed".

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{error, info, instrument};

use crate::adapters::Acquirer;
use crate::domain::{Item, ItemOutcome, LayoutPolicy};
use crate::error::{ItemError, PlacementError};

use super::history::HistoryStore;
use super::layout::PathResolver;
use super::placement::CanonicalStore;

/// Drives one item from discovery to a terminal outcome.
pub struct Pipeline {
    resolver: PathResolver,
    store: CanonicalStore,
}

impl Pipeline {
    pub fn new(resolver: PathResolver, store: CanonicalStore) -> Self {
        Self { resolver, store }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn store(&self) -> &CanonicalStore {
        &self.store
    }

    /// Process one item against the shared history store.
    #[instrument(skip(self, history, acquirer, item), fields(item_id = %item.id))]
    pub async fn process(
        &self,
        history: &mut HistoryStore,
        acquirer: &dyn Acquirer,
        item: &Item,
    ) -> ItemOutcome {
        // History hit: skip without paying any acquisition cost. A
        // previously downloaded item can still need a link when it
        // shows up as a member of a newly seen collection.
        if let Some(record) = history.get(&item.id) {
            let canonical_path = record.canonical_path.clone();
            info!(path = %canonical_path.display(), "Already downloaded, skipping");
            self.maybe_link(item, &canonical_path).await;
            return ItemOutcome::Skipped {
                item_id: item.id.clone(),
                canonical_path,
            };
        }

        match self.acquire_and_place(history, acquirer, item).await {
            Ok(canonical_path) => {
                info!(path = %canonical_path.display(), "Recorded");
                ItemOutcome::Recorded {
                    item_id: item.id.clone(),
                    canonical_path,
                }
            }
            Err(e) => {
                error!(error = %e, "Item failed");
                ItemOutcome::Failed {
                    subject: item.id.clone(),
                    error: e,
                }
            }
        }
    }

    async fn acquire_and_place(
        &self,
        history: &mut HistoryStore,
        acquirer: &dyn Acquirer,
        item: &Item,
    ) -> Result<PathBuf, ItemError> {
        // Fresh staging dir per item; removed on drop
        let staging =
            TempDir::with_prefix("tunepull-").map_err(|source| PlacementError::CreateDir {
                path: std::env::temp_dir(),
                source,
            })?;

        let acquired = acquirer.acquire(item, staging.path()).await?;

        let stem = self.resolver.resolve(item);
        let canonical_path = self.store.place(item, &stem, &acquired).await?;

        self.maybe_link(item, &canonical_path).await;

        // Last step: durable record. If this fails the item reports as
        // failed and a later run will retry it from scratch.
        history.record(&item.id, &canonical_path).await?;

        Ok(canonical_path)
    }

    /// Create the collection view entry when the item is a collection
    /// member and the layout supports views. Link trouble degrades
    /// inside the store and never fails the item.
    async fn maybe_link(&self, item: &Item, canonical_path: &Path) {
        let collection = match &item.collection {
            Some(c) if self.resolver.policy() == LayoutPolicy::Hierarchical => c,
            _ => return,
        };

        let view_name = self.resolver.sanitize_segment(&collection.title);
        if let Err(e) = self
            .store
            .link_into_collection(&view_name, canonical_path)
            .await
        {
            // The primary copy is already safe; a broken view is a
            // degraded state, not corruption.
            error!(collection = %view_name, error = %e, "Could not create collection entry");
        }
    }
}
