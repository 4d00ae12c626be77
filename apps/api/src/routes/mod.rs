pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/health", get(health::health_handler))
        // Evaluation API
        .route("/api/v1/evaluate", post(handlers::handle_evaluate))
        // Monitoring
        .route("/api/v1/agents/status", get(handlers::handle_agents_status))
        .route("/api/v1/agents/metrics", get(handlers::handle_agents_metrics))
        .route(
            "/api/v1/agents/metrics/reset",
            post(handlers::handle_reset_metrics),
        )
        .with_state(state)
}
