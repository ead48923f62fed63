use std::sync::Arc;

use crate::{config::Config, store::AssessmentStore};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AssessmentStore>,
    pub config: Config,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn AssessmentStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
