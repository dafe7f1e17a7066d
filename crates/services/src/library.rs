use std::sync::Arc;

use roadmap_core::model::{Roadmap, RoadmapId};
use storage::repository::{RoadmapRepository, SavedRoadmap, StorageError};

/// Saved-roadmap management: keeps generated roadmaps around so a later
/// session can reload them instead of regenerating.
#[derive(Clone)]
pub struct RoadmapLibraryService {
    repo: Arc<dyn RoadmapRepository>,
}

impl RoadmapLibraryService {
    #[must_use]
    pub fn new(repo: Arc<dyn RoadmapRepository>) -> Self {
        Self { repo }
    }

    /// Persist a roadmap. Saving the same id again replaces the stored copy.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the roadmap cannot be stored.
    pub async fn save(&self, roadmap: &Roadmap) -> Result<(), StorageError> {
        self.repo.insert_roadmap(roadmap).await
    }

    /// Saved roadmaps, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    pub async fn list(&self) -> Result<Vec<SavedRoadmap>, StorageError> {
        self.repo.list_roadmaps().await
    }

    /// Fetch one saved roadmap with its steps and resources.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    pub async fn get(&self, id: RoadmapId) -> Result<Option<Roadmap>, StorageError> {
        self.repo.get_roadmap(id).await
    }

    /// Delete a saved roadmap.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing is saved under the id.
    pub async fn delete(&self, id: RoadmapId) -> Result<(), StorageError> {
        self.repo.delete_roadmap(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_core::model::{RoadmapRequest, RoadmapStep, StepId, Timeframe};
    use roadmap_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn build_roadmap(technology: &str) -> Roadmap {
        let request = RoadmapRequest::new(technology, Timeframe::OneYear).unwrap();
        Roadmap::new(
            RoadmapId::generate(),
            &request,
            fixed_now(),
            vec![RoadmapStep::new(
                StepId::new("s1"),
                "Fundamentals",
                "Basics",
                "4 weeks",
                vec![],
            )],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_list_get_delete_cycle() {
        let library = RoadmapLibraryService::new(Arc::new(InMemoryRepository::new()));
        let roadmap = build_roadmap("Rust");

        library.save(&roadmap).await.unwrap();
        assert_eq!(library.list().await.unwrap().len(), 1);
        assert_eq!(
            library.get(roadmap.id()).await.unwrap().unwrap(),
            roadmap
        );

        library.delete(roadmap.id()).await.unwrap();
        assert!(library.get(roadmap.id()).await.unwrap().is_none());
        assert!(matches!(
            library.delete(roadmap.id()).await.unwrap_err(),
            StorageError::NotFound
        ));
    }
}
