use std::collections::HashMap;

use chrono::{DateTime, Utc};
use roadmap_core::model::{Resource, Roadmap, RoadmapId, RoadmapStep, StepId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{map_resource_row, parse_roadmap_id, parse_timeframe},
};
use crate::repository::{RoadmapRepository, SavedRoadmap, StorageError};

#[async_trait::async_trait]
impl RoadmapRepository for SqliteRepository {
    async fn insert_roadmap(&self, roadmap: &Roadmap) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO roadmaps (id, technology, timeframe, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                technology = excluded.technology,
                timeframe = excluded.timeframe
            ",
        )
        .bind(roadmap.id().to_string())
        .bind(roadmap.technology())
        .bind(roadmap.timeframe().as_str())
        .bind(roadmap.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Re-saving replaces the step list wholesale.
        sqlx::query("DELETE FROM roadmap_steps WHERE roadmap_id = ?1")
            .bind(roadmap.id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, step) in roadmap.steps().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                INSERT INTO roadmap_steps (
                    roadmap_id, step_id, position, title, description, estimated_time
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(roadmap.id().to_string())
            .bind(step.id.as_str())
            .bind(position)
            .bind(&step.title)
            .bind(&step.description)
            .bind(&step.estimated_time)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

            for (resource_position, resource) in step.resources.iter().enumerate() {
                let resource_position = i64::try_from(resource_position)
                    .map_err(|_| StorageError::Serialization("position overflow".into()))?;
                sqlx::query(
                    r"
                    INSERT INTO step_resources (
                        roadmap_id, step_id, position, resource_id, title, kind, url, source
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ",
                )
                .bind(roadmap.id().to_string())
                .bind(step.id.as_str())
                .bind(resource_position)
                .bind(resource.id.as_str())
                .bind(&resource.title)
                .bind(resource.kind.as_str())
                .bind(&resource.url)
                .bind(&resource.source)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_roadmap(&self, id: RoadmapId) -> Result<Option<Roadmap>, StorageError> {
        let Some(roadmap_row) = sqlx::query(
            r"
            SELECT technology, timeframe, created_at
            FROM roadmaps
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        else {
            return Ok(None);
        };

        let technology: String = roadmap_row
            .try_get("technology")
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let timeframe: String = roadmap_row
            .try_get("timeframe")
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let created_at: DateTime<Utc> = roadmap_row
            .try_get("created_at")
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let resource_rows = sqlx::query(
            r"
            SELECT step_id, resource_id, title, kind, url, source
            FROM step_resources
            WHERE roadmap_id = ?1
            ORDER BY step_id, position
            ",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut resources_by_step: HashMap<String, Vec<Resource>> = HashMap::new();
        for row in &resource_rows {
            let step_id: String = row
                .try_get("step_id")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            resources_by_step
                .entry(step_id)
                .or_default()
                .push(map_resource_row(row)?);
        }

        let step_rows = sqlx::query(
            r"
            SELECT step_id, title, description, estimated_time
            FROM roadmap_steps
            WHERE roadmap_id = ?1
            ORDER BY position
            ",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut steps = Vec::with_capacity(step_rows.len());
        for row in &step_rows {
            let step_id: String = row
                .try_get("step_id")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            let title: String = row
                .try_get("title")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            let description: String = row
                .try_get("description")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            let estimated_time: String = row
                .try_get("estimated_time")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;

            let resources = resources_by_step.remove(&step_id).unwrap_or_default();
            steps.push(RoadmapStep::new(
                StepId::new(step_id),
                title,
                description,
                estimated_time,
                resources,
            ));
        }

        let roadmap = Roadmap::from_persisted(
            id,
            technology,
            parse_timeframe(&timeframe)?,
            created_at,
            steps,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(Some(roadmap))
    }

    async fn list_roadmaps(&self) -> Result<Vec<SavedRoadmap>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                r.id,
                r.technology,
                r.timeframe,
                r.created_at,
                COUNT(s.step_id) AS total_steps
            FROM roadmaps r
            LEFT JOIN roadmap_steps s ON s.roadmap_id = r.id
            GROUP BY r.id
            ORDER BY r.created_at DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row
                .try_get("id")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            let technology: String = row
                .try_get("technology")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            let timeframe: String = row
                .try_get("timeframe")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            let created_at: DateTime<Utc> = row
                .try_get("created_at")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            let total_steps: i64 = row
                .try_get("total_steps")
                .map_err(|e| StorageError::Serialization(e.to_string()))?;

            summaries.push(SavedRoadmap {
                id: parse_roadmap_id(&id)?,
                technology,
                timeframe: parse_timeframe(&timeframe)?,
                created_at,
                total_steps: usize::try_from(total_steps).unwrap_or(0),
            });
        }

        Ok(summaries)
    }

    async fn delete_roadmap(&self, id: RoadmapId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM roadmaps WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
