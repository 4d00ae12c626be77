//! Axum route handlers for the Evaluation API.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::agents::cost::AgentMetricsSnapshot;
use crate::agents::models::{CandidateProfile, EvaluationRequest, JobRequirements, StakesFlags};
use crate::config::Config;
use crate::consensus::ConsensusMechanism;
use crate::errors::AppError;
use crate::evaluation::report::{AgentStatus, EvaluationReport, FleetTotals, SwarmStats};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Body of `POST /api/v1/evaluate`. Candidate fields sit at the top level.
#[derive(Debug, Deserialize)]
pub struct EvaluateCandidateRequest {
    #[serde(flatten)]
    pub candidate: CandidateProfile,
    #[serde(default)]
    pub job_opening_id: Option<i64>,
    #[serde(default)]
    pub job: JobRequirements,
    #[serde(default)]
    pub stakes: StakesFlags,
}

impl EvaluateCandidateRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.candidate.candidate_id <= 0 {
            return Err(AppError::Validation(
                "candidate_id must be a positive integer".to_string(),
            ));
        }
        if let Some(id) = self.job_opening_id.or(self.job.job_opening_id) {
            if id <= 0 {
                return Err(AppError::Validation(
                    "job_opening_id must be a positive integer".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn into_request(self) -> EvaluationRequest {
        let mut job = self.job;
        if self.job_opening_id.is_some() {
            job.job_opening_id = self.job_opening_id;
        }
        EvaluationRequest::new(self.candidate, job).with_stakes(self.stakes)
    }
}

#[derive(Debug, Serialize)]
pub struct AgentsStatusResponse {
    pub consensus_mechanism: ConsensusMechanism,
    pub agents: Vec<AgentStatus>,
    pub swarm: SwarmStats,
}

#[derive(Debug, Serialize)]
pub struct AgentsMetricsResponse {
    pub agents: Vec<AgentMetricsSnapshot>,
    pub totals: FleetTotals,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/evaluate
///
/// Runs the full agent swarm for one candidate. Agent failures do not fail the
/// request; they show up as `failed_agents` and `requires_human_review`.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EvaluateCandidateRequest>,
) -> Result<Json<EvaluationReport>, AppError> {
    authorize(&headers, &state.config)?;
    body.validate()?;

    let report = state
        .orchestrator
        .evaluate_candidate(body.into_request())
        .await;

    Ok(Json(report))
}

/// GET /api/v1/agents/status
pub async fn handle_agents_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AgentsStatusResponse>, AppError> {
    authorize(&headers, &state.config)?;

    Ok(Json(AgentsStatusResponse {
        consensus_mechanism: state.orchestrator.consensus_mechanism(),
        agents: state.orchestrator.agent_status(),
        swarm: state.orchestrator.swarm_stats(),
    }))
}

/// GET /api/v1/agents/metrics
pub async fn handle_agents_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AgentsMetricsResponse>, AppError> {
    authorize(&headers, &state.config)?;

    let agents = state.orchestrator.agent_metrics();
    let totals = FleetTotals::of(&agents);
    Ok(Json(AgentsMetricsResponse { agents, totals }))
}

/// POST /api/v1/agents/metrics/reset
pub async fn handle_reset_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AgentsMetricsResponse>, AppError> {
    authorize(&headers, &state.config)?;

    state.orchestrator.reset_metrics();
    let agents = state.orchestrator.agent_metrics();
    let totals = FleetTotals::of(&agents);
    Ok(Json(AgentsMetricsResponse { agents, totals }))
}

/// Bearer-token check. Outside development the header is mandatory.
fn authorize(headers: &HeaderMap, config: &Config) -> Result<(), AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return if config.is_development() {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Missing authorization header"))
        };
    };

    let raw = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed authorization header"))?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();

    if token == config.service_api_key {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid API key"))
    }
}
