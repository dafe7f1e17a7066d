use std::sync::Arc;

use roadmap_core::Clock;
use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::generation::GenerationService;
use crate::library::RoadmapLibraryService;
use crate::progress_store::ProgressStore;
use crate::provider::{GeminiProvider, RoadmapProvider};

/// Assembles app-facing services over one storage backend.
///
/// Owns the progress store, the single mutable source of truth for
/// completion; the other services are cheap to clone.
pub struct AppServices {
    clock: Clock,
    progress: ProgressStore,
    generation: GenerationService,
    library: RoadmapLibraryService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, with the generation
    /// provider configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the initial
    /// progress load fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let provider: Arc<dyn RoadmapProvider> = Arc::new(GeminiProvider::from_env());
        Self::new(storage, provider, clock).await
    }

    /// Build services over any storage backend and provider.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the persisted progress record cannot be
    /// read.
    pub async fn new(
        storage: Storage,
        provider: Arc<dyn RoadmapProvider>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let progress = ProgressStore::load(Arc::clone(&storage.progress)).await?;
        let generation = GenerationService::new(clock, provider);
        let library = RoadmapLibraryService::new(Arc::clone(&storage.roadmaps));

        Ok(Self {
            clock,
            progress,
            generation,
            library,
        })
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    #[must_use]
    pub fn progress_mut(&mut self) -> &mut ProgressStore {
        &mut self.progress
    }

    #[must_use]
    pub fn generation(&self) -> &GenerationService {
        &self.generation
    }

    #[must_use]
    pub fn library(&self) -> &RoadmapLibraryService {
        &self.library
    }
}
