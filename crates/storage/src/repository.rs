use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roadmap_core::model::{CompletedItem, Roadmap, RoadmapId, Timeframe};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Summary row for a saved roadmap, enough for list views without loading
/// every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRoadmap {
    pub id: RoadmapId,
    pub technology: String,
    pub timeframe: Timeframe,
    pub created_at: DateTime<Utc>,
    pub total_steps: usize,
}

/// Repository contract for the persisted completion record.
///
/// The completed-item list is one named record: `load_items` reads it whole at
/// store initialization and `replace_items` overwrites it whole after every
/// mutation, preserving insertion order.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Read the full completed-item list in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be read.
    async fn load_items(&self) -> Result<Vec<CompletedItem>, StorageError>;

    /// Overwrite the record with the given list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    async fn replace_items(&self, items: &[CompletedItem]) -> Result<(), StorageError>;
}

/// Repository contract for saved roadmaps.
#[async_trait]
pub trait RoadmapRepository: Send + Sync {
    /// Persist a roadmap with its steps and resources.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the roadmap cannot be stored.
    async fn insert_roadmap(&self, roadmap: &Roadmap) -> Result<(), StorageError>;

    /// Fetch a roadmap by id, or `None` if it is not saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn get_roadmap(&self, id: RoadmapId) -> Result<Option<Roadmap>, StorageError>;

    /// List saved roadmaps, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn list_roadmaps(&self) -> Result<Vec<SavedRoadmap>, StorageError>;

    /// Delete a saved roadmap and everything under it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no roadmap has the id.
    async fn delete_roadmap(&self, id: RoadmapId) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    items: Arc<Mutex<Vec<CompletedItem>>>,
    roadmaps: Arc<Mutex<Vec<Roadmap>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            roadmaps: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_items(&self) -> Result<Vec<CompletedItem>, StorageError> {
        let guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn replace_items(&self, items: &[CompletedItem]) -> Result<(), StorageError> {
        let mut guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = items.to_vec();
        Ok(())
    }
}

#[async_trait]
impl RoadmapRepository for InMemoryRepository {
    async fn insert_roadmap(&self, roadmap: &Roadmap) -> Result<(), StorageError> {
        let mut guard = self
            .roadmaps
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.retain(|existing| existing.id() != roadmap.id());
        guard.push(roadmap.clone());
        Ok(())
    }

    async fn get_roadmap(&self, id: RoadmapId) -> Result<Option<Roadmap>, StorageError> {
        let guard = self
            .roadmaps
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().find(|roadmap| roadmap.id() == id).cloned())
    }

    async fn list_roadmaps(&self) -> Result<Vec<SavedRoadmap>, StorageError> {
        let guard = self
            .roadmaps
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut summaries: Vec<SavedRoadmap> = guard
            .iter()
            .map(|roadmap| SavedRoadmap {
                id: roadmap.id(),
                technology: roadmap.technology().to_string(),
                timeframe: roadmap.timeframe(),
                created_at: roadmap.created_at(),
                total_steps: roadmap.steps().len(),
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn delete_roadmap(&self, id: RoadmapId) -> Result<(), StorageError> {
        let mut guard = self
            .roadmaps
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|roadmap| roadmap.id() != id);
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

/// Aggregates progress and roadmap repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub roadmaps: Arc<dyn RoadmapRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let roadmaps: Arc<dyn RoadmapRepository> = Arc::new(repo);
        Self { progress, roadmaps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_core::model::{RoadmapRequest, RoadmapStep, StepId};
    use roadmap_core::time::fixed_now;

    fn build_item(id: &str) -> CompletedItem {
        CompletedItem::new(StepId::new(id), format!("Topic {id}"), fixed_now())
    }

    fn build_roadmap(technology: &str) -> Roadmap {
        let request = RoadmapRequest::new(technology, Timeframe::ThreeMonths).unwrap();
        Roadmap::new(
            RoadmapId::generate(),
            &request,
            fixed_now(),
            vec![RoadmapStep::new(
                StepId::new("s1"),
                "Fundamentals",
                "Core concepts",
                "2 weeks",
                vec![],
            )],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn replace_overwrites_the_whole_record() {
        let repo = InMemoryRepository::new();
        repo.replace_items(&[build_item("s1"), build_item("s2")])
            .await
            .unwrap();
        repo.replace_items(&[build_item("s3")]).await.unwrap();

        let items = repo.load_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, StepId::new("s3"));
    }

    #[tokio::test]
    async fn roadmap_round_trip_and_delete() {
        let repo = InMemoryRepository::new();
        let roadmap = build_roadmap("Rust");
        repo.insert_roadmap(&roadmap).await.unwrap();

        let fetched = repo.get_roadmap(roadmap.id()).await.unwrap().unwrap();
        assert_eq!(fetched, roadmap);

        repo.delete_roadmap(roadmap.id()).await.unwrap();
        assert!(repo.get_roadmap(roadmap.id()).await.unwrap().is_none());
        let err = repo.delete_roadmap(roadmap.id()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
