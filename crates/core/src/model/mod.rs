mod completed;
mod ids;
mod progress;
mod resource;
mod roadmap;
mod step;

pub use completed::CompletedItem;
pub use ids::{ParseIdError, ResourceId, RoadmapId, StepId};
pub use progress::{RoadmapProgress, is_step_complete};
pub use resource::{Resource, ResourceError, ResourceKind};
pub use roadmap::{Roadmap, RoadmapError, RoadmapRequest, Timeframe};
pub use step::RoadmapStep;
