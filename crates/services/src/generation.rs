use std::sync::Arc;

use roadmap_core::Clock;
use roadmap_core::model::RoadmapRequest;

use crate::events::SessionEvent;
use crate::progress_store::ProgressStore;
use crate::provider::RoadmapProvider;
use crate::session::RoadmapSession;

/// Drives one generation round against a session.
///
/// Takes the ticket before awaiting the provider so a re-submission issued
/// while the call is outstanding supersedes this round; the session then
/// drops the late response.
#[derive(Clone)]
pub struct GenerationService {
    clock: Clock,
    provider: Arc<dyn RoadmapProvider>,
}

impl GenerationService {
    #[must_use]
    pub fn new(clock: Clock, provider: Arc<dyn RoadmapProvider>) -> Self {
        Self { clock, provider }
    }

    /// Generates a roadmap for `request` and loads it into `session`.
    ///
    /// Provider failures are not errors here: they come back as a
    /// `GenerationFailed` event, leaving any loaded roadmap untouched.
    pub async fn generate_into(
        &self,
        session: &mut RoadmapSession,
        progress: &ProgressStore,
        request: &RoadmapRequest,
    ) -> Vec<SessionEvent> {
        let ticket = session.begin_generation();
        tracing::debug!(
            technology = request.technology(),
            timeframe = %request.timeframe(),
            "requesting roadmap generation"
        );
        let outcome = self.provider.generate(request).await;
        session.apply_generation(ticket, request, outcome, progress, self.clock.now())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
