use roadmap_core::model::{RoadmapId, StepId};

/// Notifications the session surfaces to the UI layer.
///
/// Mutating session calls return the events they produced; the caller decides
/// how to present them (toast, certificate display, retry notice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A step's completion state flipped.
    CompletionToggled { step_id: StepId, completed: bool },
    /// Every step of the loaded roadmap is now complete. Emitted once per
    /// completion; re-armed only if the roadmap becomes incomplete again.
    RoadmapCompleted { roadmap_id: RoadmapId },
    /// A generation attempt failed. Retryable, never fatal.
    GenerationFailed { message: String },
}
