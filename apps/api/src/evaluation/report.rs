//! Outbound shapes: the evaluation report and the monitoring views.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::agents::cost::{round_to, AgentMetricsSnapshot, TokenUsage};
use crate::agents::models::EvaluationResult;
use crate::agents::roles::bias::BiasFlag;
use crate::agents::tiers::{tier_for, AgentRole, ModelTier};
use crate::consensus::ConsensusResult;

/// Dollar amounts are reported to the micro-dollar.
const COST_DECIMALS: i32 = 6;

// ────────────────────────────────────────────────────────────────────────────
// Evaluation report
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub evaluation_id: Uuid,
    pub candidate_id: i64,
    pub job_opening_id: Option<i64>,
    pub agent_votes: BTreeMap<AgentRole, VoteSummary>,
    /// Agents whose provider call failed, with the error. Their votes are absent.
    pub failed_agents: BTreeMap<AgentRole, String>,
    pub consensus: ConsensusResult,
    pub overall_confidence: f64,
    pub bias_flags: Vec<BiasFlag>,
    pub policy_reviews: Vec<PolicyReview>,
    pub requires_human_review: bool,
    pub evaluated_at: DateTime<Utc>,
    pub processing_time_ms: f64,
    pub metrics: EvaluationMetrics,
}

/// One vote in the common report shape.
#[derive(Debug, Clone, Serialize)]
pub struct VoteSummary {
    pub score: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub metadata: Value,
    pub tier: ModelTier,
    pub model_used: String,
    pub escalated: bool,
    pub requires_review: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl From<&EvaluationResult> for VoteSummary {
    fn from(vote: &EvaluationResult) -> Self {
        Self {
            score: vote.score,
            confidence: vote.confidence(),
            reasoning: vote.reasoning.clone(),
            metadata: vote.metadata.clone(),
            tier: vote.tier,
            model_used: vote.model_used.clone(),
            escalated: vote.escalated,
            requires_review: vote.requires_review(),
            parse_error: vote.parse_error.clone(),
        }
    }
}

/// Severity-engine findings for one vote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyReview {
    pub agent: AgentRole,
    pub escalate: bool,
    pub triggered: Vec<&'static str>,
}

// ────────────────────────────────────────────────────────────────────────────
// Per-request metrics
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationMetrics {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost: f64,
    pub escalations: u64,
    pub per_agent: BTreeMap<AgentRole, AgentUsage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentUsage {
    pub tier: ModelTier,
    pub model_used: String,
    pub escalated: bool,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

impl EvaluationMetrics {
    /// Sums usage over every vote that was produced, synthesis included.
    pub fn collect<'a>(votes: impl IntoIterator<Item = &'a EvaluationResult>) -> Self {
        let mut tokens = TokenUsage::default();
        let mut total_cost = 0.0;
        let mut escalations = 0;
        let mut per_agent = BTreeMap::new();

        for vote in votes {
            tokens += vote.token_usage;
            total_cost += vote.cost_usd;
            escalations += u64::from(vote.escalated);
            per_agent.insert(
                vote.role,
                AgentUsage {
                    tier: vote.tier,
                    model_used: vote.model_used.clone(),
                    escalated: vote.escalated,
                    input_tokens: vote.token_usage.input,
                    output_tokens: vote.token_usage.output,
                    cost_usd: round_to(vote.cost_usd, COST_DECIMALS),
                },
            );
        }

        Self {
            total_input_tokens: tokens.input,
            total_output_tokens: tokens.output,
            total_cost: round_to(total_cost, COST_DECIMALS),
            escalations,
            per_agent,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Monitoring views
// ────────────────────────────────────────────────────────────────────────────

/// One row of `GET /api/v1/agents/status`.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub agent: AgentRole,
    pub name: &'static str,
    pub default_tier: ModelTier,
    pub model: &'static str,
    pub status: &'static str,
    pub metrics: AgentMetricsSnapshot,
}

/// Totals across every agent's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetTotals {
    pub total_requests: u64,
    pub escalations: u64,
    pub escalation_rate: f64,
    pub total_tokens: TokenUsage,
    pub total_cost: f64,
    /// Share of spend on the premium tier. Monitored, not enforced.
    pub premium_cost_share: f64,
}

impl FleetTotals {
    pub fn of(snapshots: &[AgentMetricsSnapshot]) -> Self {
        let total_requests: u64 = snapshots.iter().map(|s| s.total_requests).sum();
        let escalations: u64 = snapshots.iter().map(|s| s.escalations).sum();
        let total_tokens = snapshots
            .iter()
            .fold(TokenUsage::default(), |acc, s| acc + s.total_tokens);
        let total_cost: f64 = snapshots.iter().map(|s| s.total_cost).sum();

        // Escalated fast-tier calls are billed at premium rates too, but counters don't
        // split them out, so this is the default-tier share and a lower bound.
        let premium_cost: f64 = snapshots
            .iter()
            .filter(|s| tier_for(s.agent) == ModelTier::Premium)
            .map(|s| s.total_cost)
            .sum();

        Self {
            total_requests,
            escalations,
            escalation_rate: if total_requests == 0 {
                0.0
            } else {
                escalations as f64 / total_requests as f64
            },
            total_tokens,
            total_cost: round_to(total_cost, COST_DECIMALS),
            premium_cost_share: if total_cost > 0.0 {
                premium_cost / total_cost
            } else {
                0.0
            },
        }
    }
}

/// Counters over finished evaluations, as opposed to individual agent calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SwarmStats {
    pub total_evaluations: u64,
    pub average_confidence: f64,
    pub bias_flags_detected: u64,
    pub human_reviews_requested: u64,
}
