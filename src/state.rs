// src/state.rs

use axum::extract::FromRef;

use crate::{
    config::Config,
    repository::SharedStore,
    services::{attempt::AttemptEngine, catalog::Catalog},
};

#[derive(Clone)]
pub struct AppState {
    pub attempts: AttemptEngine,
    pub catalog: Catalog,
    pub config: Config,
}

impl AppState {
    pub fn new(store: SharedStore, config: Config) -> Self {
        Self {
            attempts: AttemptEngine::new(store.clone()),
            catalog: Catalog::new(store),
            config,
        }
    }
}

impl FromRef<AppState> for AttemptEngine {
    fn from_ref(state: &AppState) -> Self {
        state.attempts.clone()
    }
}

impl FromRef<AppState> for Catalog {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
