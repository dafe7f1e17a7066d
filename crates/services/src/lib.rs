#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod events;
pub mod generation;
pub mod library;
pub mod progress_store;
pub mod provider;
pub mod session;

pub use roadmap_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ProviderError, SessionError};
pub use events::SessionEvent;
pub use generation::GenerationService;
pub use library::RoadmapLibraryService;
pub use progress_store::{ProgressStats, ProgressStore};
pub use provider::{GeminiConfig, GeminiProvider, RoadmapProvider};
pub use session::{GenerationTicket, RoadmapSession};
