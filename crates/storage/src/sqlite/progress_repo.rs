use roadmap_core::model::CompletedItem;

use super::{SqliteRepository, mapping::map_completed_item_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_items(&self) -> Result<Vec<CompletedItem>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT step_id, title, completed_at
            FROM completed_items
            ORDER BY position
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_completed_item_row).collect()
    }

    async fn replace_items(&self, items: &[CompletedItem]) -> Result<(), StorageError> {
        // The record is overwritten wholesale so insertion order is exactly
        // the order of the slice.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM completed_items")
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, item) in items.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                INSERT INTO completed_items (position, step_id, title, completed_at)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(position)
            .bind(item.id.as_str())
            .bind(&item.title)
            .bind(item.completed_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
