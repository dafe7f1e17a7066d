use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::StepId;

/// Record marking a roadmap step as finished by the user.
///
/// The title is captured at completion time and never re-synced, so a renamed
/// step keeps the label it was completed under. The progress store guarantees
/// no two entries share an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedItem {
    pub id: StepId,
    pub title: String,
    pub completed_at: DateTime<Utc>,
}

impl CompletedItem {
    #[must_use]
    pub fn new(id: StepId, title: impl Into<String>, completed_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            completed_at,
        }
    }
}
