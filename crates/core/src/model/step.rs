use serde::{Deserialize, Serialize};

use crate::model::ids::StepId;
use crate::model::resource::Resource;

/// One unit of a generated learning plan.
///
/// A step carries no completion flag of its own; whether it is done is
/// derived by looking its id up in the progress store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapStep {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub estimated_time: String,
    pub resources: Vec<Resource>,
}

impl RoadmapStep {
    #[must_use]
    pub fn new(
        id: StepId,
        title: impl Into<String>,
        description: impl Into<String>,
        estimated_time: impl Into<String>,
        resources: Vec<Resource>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            estimated_time: estimated_time.into(),
            resources,
        }
    }
}
