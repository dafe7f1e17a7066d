use thiserror::Error;

use crate::model::{ResourceError, RoadmapError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Roadmap(#[from] RoadmapError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}
