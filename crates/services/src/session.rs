use chrono::{DateTime, Utc};
use std::fmt;

use roadmap_core::model::{
    CompletedItem, Roadmap, RoadmapId, RoadmapProgress, RoadmapRequest, RoadmapStep, StepId,
};

use crate::error::{ProviderError, SessionError};
use crate::events::SessionEvent;
use crate::progress_store::ProgressStore;

//
// ─── GENERATION TICKET ─────────────────────────────────────────────────────────
//

/// Handle for one outstanding generation request.
///
/// Tickets are sequenced; only the most recently issued one is live, and
/// applying a response with a superseded ticket is a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket(u64);

//
// ─── ROADMAP SESSION ───────────────────────────────────────────────────────────
//

/// In-memory session holding at most one generated roadmap.
///
/// The session never owns completion state; it derives each step's completed
/// flag by membership lookup against the `ProgressStore` and is the only write
/// path into it. Discarded on process exit; the progress store is what
/// survives.
#[derive(Default)]
pub struct RoadmapSession {
    roadmap: Option<Roadmap>,
    completion_emitted: bool,
    request_seq: u64,
    live_request: Option<u64>,
}

impl RoadmapSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn roadmap(&self) -> Option<&Roadmap> {
        self.roadmap.as_ref()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.roadmap.is_some()
    }

    /// Registers a new generation request and supersedes any earlier one.
    pub fn begin_generation(&mut self) -> GenerationTicket {
        self.request_seq += 1;
        self.live_request = Some(self.request_seq);
        GenerationTicket(self.request_seq)
    }

    /// Applies the outcome of a generation call.
    ///
    /// A stale ticket (superseded by a newer `begin_generation`) is discarded
    /// without touching any state. A failed outcome leaves the previously
    /// loaded roadmap untouched and reports a `GenerationFailed` event. A
    /// successful outcome materializes the roadmap and loads it.
    pub fn apply_generation(
        &mut self,
        ticket: GenerationTicket,
        request: &RoadmapRequest,
        outcome: Result<Vec<RoadmapStep>, ProviderError>,
        progress: &ProgressStore,
        now: DateTime<Utc>,
    ) -> Vec<SessionEvent> {
        if self.live_request != Some(ticket.0) {
            tracing::debug!(ticket = ticket.0, "discarding stale generation response");
            return Vec::new();
        }
        self.live_request = None;

        let roadmap = outcome.and_then(|steps| {
            Roadmap::new(RoadmapId::generate(), request, now, steps)
                .map_err(|err| ProviderError::Malformed(err.to_string()))
        });

        match roadmap {
            Ok(roadmap) => self.load_roadmap(roadmap, progress),
            Err(err) => {
                tracing::warn!(error = %err, "roadmap generation failed");
                vec![SessionEvent::GenerationFailed {
                    message: err.to_string(),
                }]
            }
        }
    }

    /// Replaces the current roadmap.
    ///
    /// Completion is derived per step from the progress store. A roadmap whose
    /// steps are all already complete emits the completion event immediately.
    pub fn load_roadmap(&mut self, roadmap: Roadmap, progress: &ProgressStore) -> Vec<SessionEvent> {
        self.roadmap = Some(roadmap);
        self.completion_emitted = false;

        let mut events = Vec::new();
        self.sync_completion(progress, &mut events);
        events
    }

    /// Flips a step's completion by mutating the progress store.
    ///
    /// This is the only write path into completion state. The step title is
    /// captured into the completed item at toggle time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoRoadmap` when nothing is loaded and
    /// `SessionError::UnknownStep` when the id is not part of the roadmap.
    pub async fn toggle_step_completion(
        &mut self,
        id: &StepId,
        progress: &mut ProgressStore,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        let Some(roadmap) = self.roadmap.as_ref() else {
            return Err(SessionError::NoRoadmap);
        };
        let step = roadmap
            .step(id)
            .ok_or_else(|| SessionError::UnknownStep(id.clone()))?;
        let title = step.title.clone();

        let completed = if progress.contains(id) {
            progress.remove_completed_item(id).await;
            false
        } else {
            progress
                .add_completed_item(CompletedItem::new(id.clone(), title, now))
                .await;
            true
        };

        let mut events = vec![SessionEvent::CompletionToggled {
            step_id: id.clone(),
            completed,
        }];
        self.sync_completion(progress, &mut events);
        Ok(events)
    }

    /// Whether every step of the loaded roadmap is recorded complete.
    ///
    /// Recomputed from the progress store on every call; nothing is cached.
    #[must_use]
    pub fn is_fully_completed(&self, progress: &ProgressStore) -> bool {
        match &self.roadmap {
            Some(roadmap) => roadmap.step_ids().all(|id| progress.contains(id)),
            None => false,
        }
    }

    /// Aggregated completion view for the loaded roadmap.
    #[must_use]
    pub fn progress(&self, progress: &ProgressStore) -> RoadmapProgress {
        let steps = self.roadmap.as_ref().map_or(&[][..], Roadmap::steps);
        RoadmapProgress::for_steps(steps, &progress.completed_ids())
    }

    fn sync_completion(&mut self, progress: &ProgressStore, events: &mut Vec<SessionEvent>) {
        let Some(roadmap) = self.roadmap.as_ref() else {
            return;
        };

        if self.is_fully_completed(progress) {
            if !self.completion_emitted {
                self.completion_emitted = true;
                events.push(SessionEvent::RoadmapCompleted {
                    roadmap_id: roadmap.id(),
                });
            }
        } else {
            // Re-arm so completing again after un-toggling emits once more.
            self.completion_emitted = false;
        }
    }
}

impl fmt::Debug for RoadmapSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoadmapSession")
            .field("roadmap_id", &self.roadmap.as_ref().map(Roadmap::id))
            .field("completion_emitted", &self.completion_emitted)
            .field("request_seq", &self.request_seq)
            .field("live_request", &self.live_request)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_core::model::Timeframe;
    use roadmap_core::time::fixed_now;
    use std::sync::Arc;
    use storage::repository::InMemoryRepository;

    fn build_step(id: &str) -> RoadmapStep {
        RoadmapStep::new(
            StepId::new(id),
            format!("Step {id}"),
            "What to learn here",
            "2 weeks",
            vec![],
        )
    }

    fn build_request() -> RoadmapRequest {
        RoadmapRequest::new("Rust", Timeframe::ThreeMonths).unwrap()
    }

    fn build_roadmap(step_ids: &[&str]) -> Roadmap {
        let steps = step_ids.iter().map(|id| build_step(id)).collect();
        Roadmap::new(RoadmapId::generate(), &build_request(), fixed_now(), steps).unwrap()
    }

    async fn build_store() -> ProgressStore {
        ProgressStore::load(Arc::new(InMemoryRepository::new()))
            .await
            .unwrap()
    }

    async fn toggle(
        session: &mut RoadmapSession,
        progress: &mut ProgressStore,
        id: &str,
    ) -> Vec<SessionEvent> {
        session
            .toggle_step_completion(&StepId::new(id), progress, fixed_now())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn toggling_without_roadmap_is_an_error() {
        let mut session = RoadmapSession::new();
        let mut progress = build_store().await;

        let err = session
            .toggle_step_completion(&StepId::new("s1"), &mut progress, fixed_now())
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::NoRoadmap);
    }

    #[tokio::test]
    async fn toggling_unknown_step_is_an_error() {
        let mut session = RoadmapSession::new();
        let mut progress = build_store().await;
        session.load_roadmap(build_roadmap(&["s1"]), &progress);

        let err = session
            .toggle_step_completion(&StepId::new("s9"), &mut progress, fixed_now())
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::UnknownStep(StepId::new("s9")));
    }

    #[tokio::test]
    async fn completing_all_steps_emits_exactly_one_completion_event() {
        let mut session = RoadmapSession::new();
        let mut progress = build_store().await;
        session.load_roadmap(build_roadmap(&["s1", "s2", "s3"]), &progress);

        let events = toggle(&mut session, &mut progress, "s1").await;
        assert_eq!(
            events,
            vec![SessionEvent::CompletionToggled {
                step_id: StepId::new("s1"),
                completed: true
            }]
        );

        toggle(&mut session, &mut progress, "s2").await;
        assert!(!session.is_fully_completed(&progress));

        let events = toggle(&mut session, &mut progress, "s3").await;
        assert!(session.is_fully_completed(&progress));
        let completions = events
            .iter()
            .filter(|event| matches!(event, SessionEvent::RoadmapCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[tokio::test]
    async fn completion_event_rearms_after_becoming_incomplete() {
        let mut session = RoadmapSession::new();
        let mut progress = build_store().await;
        session.load_roadmap(build_roadmap(&["s1"]), &progress);

        let events = toggle(&mut session, &mut progress, "s1").await;
        assert!(
            events
                .iter()
                .any(|event| matches!(event, SessionEvent::RoadmapCompleted { .. }))
        );

        // Un-toggle, then complete again: the event fires once more.
        let events = toggle(&mut session, &mut progress, "s1").await;
        assert_eq!(
            events,
            vec![SessionEvent::CompletionToggled {
                step_id: StepId::new("s1"),
                completed: false
            }]
        );

        let events = toggle(&mut session, &mut progress, "s1").await;
        assert!(
            events
                .iter()
                .any(|event| matches!(event, SessionEvent::RoadmapCompleted { .. }))
        );
    }

    #[tokio::test]
    async fn toggle_round_trip_restores_store_state() {
        let mut session = RoadmapSession::new();
        let mut progress = build_store().await;
        session.load_roadmap(build_roadmap(&["s1", "s2"]), &progress);

        toggle(&mut session, &mut progress, "s2").await;
        let snapshot = progress.list_completed_items().to_vec();

        toggle(&mut session, &mut progress, "s1").await;
        toggle(&mut session, &mut progress, "s1").await;

        assert_eq!(progress.list_completed_items(), snapshot.as_slice());
    }

    #[tokio::test]
    async fn loading_derives_completion_from_the_store() {
        let mut session = RoadmapSession::new();
        let mut progress = build_store().await;
        progress
            .add_completed_item(CompletedItem::new(
                StepId::new("s1"),
                "Step s1",
                fixed_now(),
            ))
            .await;

        session.load_roadmap(build_roadmap(&["s1", "s2"]), &progress);

        let view = session.progress(&progress);
        assert_eq!(view.total, 2);
        assert_eq!(view.completed, 1);
        assert!(!view.is_complete);
    }

    #[tokio::test]
    async fn loading_an_already_complete_roadmap_emits_completion() {
        let mut session = RoadmapSession::new();
        let mut progress = build_store().await;
        progress
            .add_completed_item(CompletedItem::new(
                StepId::new("s1"),
                "Step s1",
                fixed_now(),
            ))
            .await;

        let events = session.load_roadmap(build_roadmap(&["s1"]), &progress);
        assert!(
            events
                .iter()
                .any(|event| matches!(event, SessionEvent::RoadmapCompleted { .. }))
        );
    }

    #[tokio::test]
    async fn failed_generation_leaves_loaded_roadmap_untouched() {
        let mut session = RoadmapSession::new();
        let progress = build_store().await;
        let loaded = build_roadmap(&["s1"]);
        let loaded_id = loaded.id();
        session.load_roadmap(loaded, &progress);

        let ticket = session.begin_generation();
        let events = session.apply_generation(
            ticket,
            &build_request(),
            Err(ProviderError::NotConfigured),
            &progress,
            fixed_now(),
        );

        assert_eq!(
            events,
            vec![SessionEvent::GenerationFailed {
                message: "provider not configured".into()
            }]
        );
        assert_eq!(session.roadmap().unwrap().id(), loaded_id);
    }

    #[tokio::test]
    async fn stale_generation_response_is_discarded() {
        let mut session = RoadmapSession::new();
        let progress = build_store().await;

        let first = session.begin_generation();
        let second = session.begin_generation();

        // The newer request resolves first and wins.
        let events = session.apply_generation(
            second,
            &build_request(),
            Ok(vec![build_step("new1")]),
            &progress,
            fixed_now(),
        );
        assert!(events.is_empty());
        let winner = session.roadmap().unwrap().id();

        // The older response arrives late and is dropped on the floor.
        let events = session.apply_generation(
            first,
            &build_request(),
            Ok(vec![build_step("old1")]),
            &progress,
            fixed_now(),
        );
        assert!(events.is_empty());
        assert_eq!(session.roadmap().unwrap().id(), winner);
        assert_eq!(session.roadmap().unwrap().steps()[0].id, StepId::new("new1"));
    }

    #[tokio::test]
    async fn generation_producing_duplicate_ids_fails_cleanly() {
        let mut session = RoadmapSession::new();
        let progress = build_store().await;

        let ticket = session.begin_generation();
        let events = session.apply_generation(
            ticket,
            &build_request(),
            Ok(vec![build_step("s1"), build_step("s1")]),
            &progress,
            fixed_now(),
        );

        assert!(matches!(
            events.as_slice(),
            [SessionEvent::GenerationFailed { .. }]
        ));
        assert!(!session.is_loaded());
    }
}
