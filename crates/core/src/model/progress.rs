use std::collections::HashSet;

use crate::model::ids::StepId;
use crate::model::step::RoadmapStep;

/// Whether a single step counts as complete, derived purely from membership in
/// the completed-id set. Completion is never stored on the step itself.
#[must_use]
pub fn is_step_complete(step: &RoadmapStep, completed: &HashSet<StepId>) -> bool {
    completed.contains(&step.id)
}

/// Aggregated completion view over one roadmap, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapProgress {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl RoadmapProgress {
    /// Computes progress for a step list against the completed-id set.
    ///
    /// Recomputed from scratch on every call; callers must not cache the
    /// result across progress-store mutations.
    #[must_use]
    pub fn for_steps(steps: &[RoadmapStep], completed: &HashSet<StepId>) -> Self {
        let total = steps.len();
        let done = steps
            .iter()
            .filter(|step| is_step_complete(step, completed))
            .count();
        Self {
            total,
            completed: done,
            remaining: total - done,
            is_complete: total > 0 && done == total,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
