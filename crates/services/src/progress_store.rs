use std::collections::HashSet;
use std::sync::Arc;

use roadmap_core::model::{CompletedItem, StepId};
use storage::repository::{ProgressRepository, StorageError};

//
// ─── PROGRESS STATS ────────────────────────────────────────────────────────────
//

/// Aggregated view of overall learning progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStats {
    pub total_completed: usize,
    pub most_recent: Option<CompletedItem>,
}

//
// ─── PROGRESS STORE ────────────────────────────────────────────────────────────
//

/// The persisted set of completed items, the single source of truth for
/// completion state.
///
/// Holds the set in memory (insertion order, unique by step id) and writes the
/// whole record back through the injected repository after every mutation. The
/// in-memory set stays authoritative for the session even when a write fails;
/// persistence failures are logged, never surfaced as errors.
pub struct ProgressStore {
    items: Vec<CompletedItem>,
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressStore {
    /// Load the store from its persisted record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be read at startup; a store
    /// that cannot even load has nothing authoritative to fall back on.
    pub async fn load(repo: Arc<dyn ProgressRepository>) -> Result<Self, StorageError> {
        let items = repo.load_items().await?;
        Ok(Self { items, repo })
    }

    /// Marks an item complete. Duplicate adds are a successful no-op.
    ///
    /// Returns `true` if the item was inserted, `false` if an entry with the
    /// same id was already present.
    pub async fn add_completed_item(&mut self, item: CompletedItem) -> bool {
        if self.contains(&item.id) {
            return false;
        }
        self.items.push(item);
        self.persist().await;
        true
    }

    /// Removes the entry with the given id, if present.
    ///
    /// Returns `true` if an entry was removed.
    pub async fn remove_completed_item(&mut self, id: &StepId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        if self.items.len() == before {
            return false;
        }
        self.persist().await;
        true
    }

    /// The completed items in insertion order.
    #[must_use]
    pub fn list_completed_items(&self) -> &[CompletedItem] {
        &self.items
    }

    /// Whether a step id is recorded as complete.
    #[must_use]
    pub fn contains(&self, id: &StepId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// Snapshot of completed ids for derivation helpers.
    #[must_use]
    pub fn completed_ids(&self) -> HashSet<StepId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }

    #[must_use]
    pub fn stats(&self) -> ProgressStats {
        ProgressStats {
            total_completed: self.items.len(),
            most_recent: self.items.last().cloned(),
        }
    }

    async fn persist(&self) {
        if let Err(err) = self.repo.replace_items(&self.items).await {
            tracing::warn!(error = %err, "failed to persist progress; in-memory state remains authoritative");
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
