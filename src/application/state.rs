use std::sync::Arc;

use crate::domain::repositories::score_store::ScoreStore;
use crate::domain::services::signal_scoring::SignalScoringService;
use crate::persistence::activity_repository::ActivityRepository;

/// Shared handler state. Everything here is either immutable or a pool
/// handle, so clones are cheap and handlers never coordinate.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SignalScoringService>,
    pub activities: Arc<ActivityRepository>,
    pub scores: Arc<dyn ScoreStore>,
}

impl AppState {
    pub fn new(
        service: SignalScoringService,
        activities: ActivityRepository,
        scores: Arc<dyn ScoreStore>,
    ) -> Self {
        AppState {
            service: Arc::new(service),
            activities: Arc::new(activities),
            scores,
        }
    }
}
