//! The generic evaluation agent.
//!
//! Every role runs the same per-call state machine:
//!
//! ```text
//! SELECT_TIER → INVOKE → PARSE → RECORD_METRICS → [ESCALATE?] → RETURN
//! ```
//!
//! Escalation is a single bounded retry on the premium tier, so one vote costs at most
//! two provider calls. Roles differ only in their `RoleBehavior`: prompts, request
//! formatting and the schema their response must decode into.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::agents::cost::{cost, AgentMetrics, AgentMetricsSnapshot, TokenUsage};
use crate::agents::escalation::{is_high_stakes, should_escalate};
use crate::agents::models::{
    EvaluationRequest, EvaluationResult, QualitySignals, RoleOutput, SchemaError, ScoreScale,
};
use crate::agents::tiers::{tier_for, AgentRole, ModelTier};
use crate::llm_client::{decode_json, CompletionRequest, LlmProvider, ProviderError};

/// Role-specific strategy. One implementation per `AgentRole`.
pub trait RoleBehavior: Send + Sync {
    fn role(&self) -> AgentRole;

    fn system_prompt(&self) -> &'static str;

    /// Renders the user prompt from candidate/job data (and peer votes, for reviewers).
    fn format_request(&self, request: &EvaluationRequest) -> String;

    /// Decodes and validates the model's JSON against the role schema.
    fn parse_response(&self, value: Value) -> Result<RoleOutput, SchemaError>;

    /// Vote to return without calling the LLM when the role's source is absent.
    fn missing_source_vote(&self, _request: &EvaluationRequest) -> Option<RoleOutput> {
        None
    }
}

/// Per-call knobs, taken from `Config` at startup.
#[derive(Debug, Clone, Copy)]
pub struct AgentSettings {
    pub request_timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_tokens: 4096,
            temperature: 0.3,
        }
    }
}

/// Tier for one attempt. Deterministic in its inputs.
pub fn select_tier(role: AgentRole, force_premium: bool) -> ModelTier {
    if force_premium {
        ModelTier::Premium
    } else {
        tier_for(role)
    }
}

pub struct EvaluationAgent {
    behavior: Box<dyn RoleBehavior>,
    provider: Arc<dyn LlmProvider>,
    settings: AgentSettings,
    metrics: AgentMetrics,
}

impl EvaluationAgent {
    pub fn new(
        behavior: Box<dyn RoleBehavior>,
        provider: Arc<dyn LlmProvider>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            behavior,
            provider,
            settings,
            metrics: AgentMetrics::new(),
        }
    }

    pub fn role(&self) -> AgentRole {
        self.behavior.role()
    }

    pub fn default_tier(&self) -> ModelTier {
        tier_for(self.role())
    }

    pub fn metrics(&self) -> AgentMetricsSnapshot {
        self.metrics.snapshot(self.role())
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Produces this agent's vote.
    ///
    /// Provider failures are returned to the caller untouched. Unparseable responses are
    /// not failures: they come back as a zero-confidence fallback vote.
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, ProviderError> {
        let role = self.role();

        if let Some(output) = self.behavior.missing_source_vote(request) {
            info!(agent = %role, "Source missing, returning neutral vote without LLM call");
            let tier = self.default_tier();
            return Ok(assemble(role, output, tier, TokenUsage::default(), 0.0, None));
        }

        let forced = is_high_stakes(&request.stakes);
        let tier = select_tier(role, forced);
        let first = self.attempt(request, tier, forced).await?;

        // Premium answers are final: a forced or default-premium call never recurses.
        if tier == ModelTier::Premium || !should_escalate(&first.signals) {
            return Ok(first);
        }

        warn!(
            agent = %role,
            confidence = first.confidence(),
            "Low-quality fast response, escalating to premium tier"
        );
        match self.attempt(request, ModelTier::Premium, true).await {
            Ok(mut retry) => {
                // Counted only when the returned vote is marked escalated.
                self.metrics.record_escalation();
                retry.escalated = true;
                retry.token_usage += first.token_usage;
                retry.cost_usd += first.cost_usd;
                Ok(retry)
            }
            Err(e) => {
                warn!(agent = %role, "Premium retry failed, keeping fast-tier vote: {e}");
                Ok(first)
            }
        }
    }

    /// One provider call at a fixed tier.
    async fn attempt(
        &self,
        request: &EvaluationRequest,
        tier: ModelTier,
        forced: bool,
    ) -> Result<EvaluationResult, ProviderError> {
        let role = self.role();
        let model = tier.model_id();
        let prompt = self.behavior.format_request(request);

        info!(agent = %role, model, forced, "Processing request");

        let call = self.provider.invoke(CompletionRequest {
            system: self.behavior.system_prompt(),
            prompt: &prompt,
            model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        });
        let completion = tokio::time::timeout(self.settings.request_timeout, call)
            .await
            .map_err(|_| ProviderError::Timeout(self.settings.request_timeout))?
            .inspect_err(|e| warn!(agent = %role, model, "LLM call failed: {e}"))?;

        let parsed = decode_json(&completion.text)
            .map_err(|e| SchemaError::Json(e.to_string()))
            .and_then(|value| self.behavior.parse_response(value));

        let usage = TokenUsage::new(completion.input_tokens, completion.output_tokens);
        let call_cost = cost(usage.input, usage.output, tier);
        self.metrics.record_call(usage, call_cost);

        Ok(match parsed {
            Ok(output) => assemble(role, output, tier, usage, call_cost, None),
            Err(e) => {
                warn!(agent = %role, model, "Response failed schema validation: {e}");
                assemble(role, fallback_output(&e), tier, usage, call_cost, Some(e))
            }
        })
    }
}

/// Well-formed but worthless vote used when a response can't be decoded.
fn fallback_output(error: &SchemaError) -> RoleOutput {
    RoleOutput {
        raw_score: 0.0,
        scale: ScoreScale::Unit,
        reasoning: format!("Error parsing response: {error}"),
        signals: QualitySignals {
            confidence: 0.0,
            requires_review: true,
            ..QualitySignals::default()
        },
        metadata: json!({ "error": error.to_string() }),
    }
}

fn assemble(
    role: AgentRole,
    output: RoleOutput,
    tier: ModelTier,
    usage: TokenUsage,
    cost_usd: f64,
    parse_error: Option<SchemaError>,
) -> EvaluationResult {
    let mut signals = output.signals;
    signals.confidence = signals.confidence.clamp(0.0, 1.0);
    EvaluationResult {
        role,
        score: output.scale.normalize(output.raw_score),
        raw_score: output.raw_score,
        scale: output.scale,
        reasoning: output.reasoning,
        signals,
        metadata: output.metadata,
        tier,
        model_used: tier.model_id().to_string(),
        escalated: false,
        token_usage: usage,
        cost_usd,
        parse_error: parse_error.map(|e| e.to_string()),
    }
}
