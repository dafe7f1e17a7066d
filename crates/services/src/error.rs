//! Shared error types for the services crate.

use thiserror::Error;

use roadmap_core::model::StepId;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by roadmap generation providers.
///
/// Every variant carries a stable, user-displayable message; none of them is
/// fatal to the session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("provider not configured")]
    NotConfigured,
    #[error("generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("generation returned an empty response")]
    EmptyResponse,
    #[error("could not parse roadmap from response: {0}")]
    Malformed(String),
}

/// Errors emitted by `RoadmapSession`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no roadmap loaded")]
    NoRoadmap,
    #[error("unknown step id: {0}")]
    UnknownStep(StepId),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
