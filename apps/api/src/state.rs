use std::sync::Arc;

use crate::config::Config;
use crate::evaluation::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// One orchestrator for the process, so agent metrics accumulate across requests.
    pub orchestrator: Arc<Orchestrator>,
    pub config: Config,
}
