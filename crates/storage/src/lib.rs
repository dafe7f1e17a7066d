#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    ProgressRepository, RoadmapRepository, SavedRoadmap, Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
