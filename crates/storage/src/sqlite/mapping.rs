use chrono::{DateTime, Utc};
use roadmap_core::model::{
    CompletedItem, Resource, ResourceId, ResourceKind, RoadmapId, StepId, Timeframe,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(super) fn map_completed_item_row(row: &SqliteRow) -> Result<CompletedItem, StorageError> {
    let step_id: String = row
        .try_get("step_id")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let title: String = row
        .try_get("title")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let completed_at: DateTime<Utc> = row
        .try_get("completed_at")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    Ok(CompletedItem::new(StepId::new(step_id), title, completed_at))
}

pub(super) fn map_resource_row(row: &SqliteRow) -> Result<Resource, StorageError> {
    let resource_id: String = row
        .try_get("resource_id")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let title: String = row
        .try_get("title")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let kind: String = row
        .try_get("kind")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let url: String = row
        .try_get("url")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let source: String = row
        .try_get("source")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let kind: ResourceKind = kind
        .parse()
        .map_err(|_| StorageError::Serialization(format!("unknown resource kind: {kind}")))?;

    Resource::new(ResourceId::new(resource_id), title, kind, url, source)
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

pub(super) fn parse_roadmap_id(raw: &str) -> Result<RoadmapId, StorageError> {
    raw.parse()
        .map_err(|_| StorageError::Serialization(format!("invalid roadmap id: {raw}")))
}

pub(super) fn parse_timeframe(raw: &str) -> Result<Timeframe, StorageError> {
    raw.parse()
        .map_err(|_| StorageError::Serialization(format!("invalid timeframe: {raw}")))
}
