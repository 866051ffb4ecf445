use crate::backend::QuizApi;
use crate::config::AppConfig;
use crate::selector::system_random;
use crate::session::Session;
use crate::sync::ScoreSyncHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub api: Arc<dyn QuizApi>,
    /// Queue feeding the score-sync worker
    pub score_sync: ScoreSyncHandle,
}

impl AppState {
    pub fn new(config: AppConfig, api: Arc<dyn QuizApi>, score_sync: ScoreSyncHandle) -> Self {
        Self {
            config,
            api,
            score_sync,
        }
    }

    /// Start a fresh session for a new connection
    pub fn new_session(&self, challenger: Option<String>) -> Session {
        Session::new(
            self.config.session_config(challenger),
            self.api.clone(),
            self.score_sync.clone(),
            system_random(),
        )
    }
}
