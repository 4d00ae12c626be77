mod agents;
mod config;
mod consensus;
mod errors;
mod evaluation;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::agents::base::AgentSettings;
use crate::agents::tiers::{FAST_MODEL, PREMIUM_MODEL};
use crate::config::Config;
use crate::evaluation::orchestrator::Orchestrator;
use crate::llm_client::AnthropicClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting swarm-eval v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    // Initialize LLM client
    let provider = Arc::new(AnthropicClient::new(
        config.anthropic_api_key.clone(),
        config.request_timeout,
    )?);
    info!("LLM client initialized (fast: {FAST_MODEL}, premium: {PREMIUM_MODEL})");

    // Build the agent swarm
    let settings = AgentSettings {
        request_timeout: config.request_timeout,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };
    let orchestrator = Arc::new(Orchestrator::new(
        provider,
        settings,
        config.consensus_mechanism,
    ));
    info!(
        "Agent swarm ready (consensus: {})",
        config.consensus_mechanism
    );

    // Build app state
    let state = AppState {
        orchestrator,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the recruiting frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
