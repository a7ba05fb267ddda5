use std::sync::Arc;

use ats_engine::Engine;

use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Immutable after startup; evaluations run on the blocking pool against it.
    pub engine: Arc<Engine>,
    /// Startup configuration; `build_router` takes its CORS origins from here.
    pub config: Config,
}

impl AppState {
    pub fn new(engine: Engine, config: Config) -> Self {
        Self {
            engine: Arc::new(engine),
            config,
        }
    }
}
