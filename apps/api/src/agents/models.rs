//! Request and result types shared by every agent role.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::agents::cost::TokenUsage;
use crate::agents::tiers::{AgentRole, ModelTier};

// ────────────────────────────────────────────────────────────────────────────
// Request side
// ────────────────────────────────────────────────────────────────────────────

/// Everything known about the candidate. Profile fetching is not implemented:
/// the sources are whatever the caller supplied inline, plus the URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub candidate_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub linkedin_profile: Option<Value>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub github_profile: Option<Value>,
}

impl CandidateProfile {
    pub fn has_linkedin(&self) -> bool {
        present(&self.linkedin_url) || self.linkedin_profile.is_some()
    }

    pub fn has_github(&self) -> bool {
        present(&self.github_url) || self.github_profile.is_some()
    }

    pub fn has_resume(&self) -> bool {
        present(&self.resume_url) || present(&self.resume_text)
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequirements {
    #[serde(default)]
    pub job_opening_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Screening,
    FinalHiringRecommendation,
}

/// Request semantics that force the premium tier before any call is made.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakesFlags {
    pub decision_type: Option<DecisionType>,
    pub compliance_review_required: bool,
    pub bias_check_critical: bool,
    pub legal_implications: bool,
    pub customer_escalation: bool,
    pub agent_consensus_failed: bool,
    pub edge_case_detected: bool,
}

/// Input for one agent call. Built per call and never persisted.
#[derive(Debug, Clone, Default)]
pub struct EvaluationRequest {
    pub candidate: CandidateProfile,
    pub job: JobRequirements,
    /// Peer votes, for the roles that review other agents' work.
    pub other_agent_votes: BTreeMap<AgentRole, EvaluationResult>,
    pub stakes: StakesFlags,
}

impl EvaluationRequest {
    pub fn new(candidate: CandidateProfile, job: JobRequirements) -> Self {
        Self {
            candidate,
            job,
            other_agent_votes: BTreeMap::new(),
            stakes: StakesFlags::default(),
        }
    }

    pub fn with_votes(mut self, votes: BTreeMap<AgentRole, EvaluationResult>) -> Self {
        self.other_agent_votes = votes;
        self
    }

    pub fn with_stakes(mut self, stakes: StakesFlags) -> Self {
        self.stakes = stakes;
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Response side
// ────────────────────────────────────────────────────────────────────────────

/// Self-reported quality fields every role schema carries (flattened into it).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySignals {
    pub confidence: f64,
    #[serde(default)]
    pub uncertainty_flags: Vec<String>,
    #[serde(default)]
    pub requires_review: bool,
    #[serde(default)]
    pub edge_case_detected: bool,
    #[serde(default)]
    pub contradictions_found: bool,
    #[serde(default)]
    pub data_completeness: Option<f64>,
    #[serde(default)]
    pub concerns: Vec<String>,
}

impl QualitySignals {
    pub fn with_confidence(confidence: f64) -> Self {
        Self {
            confidence,
            ..Self::default()
        }
    }
}

/// Native range of a role's score field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScale {
    /// 0.0 – 1.0
    Unit,
    /// 0 – 100
    Percent,
}

impl ScoreScale {
    pub fn max(self) -> f64 {
        match self {
            ScoreScale::Unit => 1.0,
            ScoreScale::Percent => 100.0,
        }
    }

    /// Maps a raw score onto [0, 1].
    pub fn normalize(self, raw: f64) -> f64 {
        (raw / self.max()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("response is not valid JSON: {0}")]
    Json(String),

    #[error("response does not match the {role} schema: {message}")]
    Schema { role: AgentRole, message: String },

    #[error("{field} = {value} is outside [0, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        max: f64,
    },

    #[error("validation failed: {0}")]
    Validation(String),
}

/// Checks a numeric field against its range. NaN is out of range.
pub fn check_range(field: &'static str, value: f64, max: f64) -> Result<(), SchemaError> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(SchemaError::OutOfRange { field, value, max })
    }
}

/// What a role extracts from a decoded response, before tier/usage are attached.
#[derive(Debug, Clone)]
pub struct RoleOutput {
    pub raw_score: f64,
    pub scale: ScoreScale,
    pub reasoning: String,
    pub signals: QualitySignals,
    /// Role-specific fields (red flags, skill lists, ...).
    pub metadata: Value,
}

/// One agent's vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub role: AgentRole,
    /// Always in [0, 1].
    pub score: f64,
    pub raw_score: f64,
    pub scale: ScoreScale,
    pub reasoning: String,
    pub signals: QualitySignals,
    pub metadata: Value,
    pub tier: ModelTier,
    pub model_used: String,
    /// True when a fast-tier answer was redone on the premium tier.
    pub escalated: bool,
    /// Summed over every call that produced this vote.
    pub token_usage: TokenUsage,
    pub cost_usd: f64,
    /// Set when the response could not be decoded; the vote is a zero-confidence fallback.
    pub parse_error: Option<String>,
}

impl EvaluationResult {
    pub fn confidence(&self) -> f64 {
        self.signals.confidence
    }

    pub fn requires_review(&self) -> bool {
        self.signals.requires_review
    }

    /// Bare unit-scale vote for tests that only care about score and confidence.
    #[cfg(test)]
    pub fn stub(role: AgentRole, score: f64, confidence: f64) -> Self {
        let tier = crate::agents::tiers::tier_for(role);
        Self {
            role,
            score,
            raw_score: score,
            scale: ScoreScale::Unit,
            reasoning: format!("{role} stub vote"),
            signals: QualitySignals::with_confidence(confidence),
            metadata: Value::Null,
            tier,
            model_used: tier.model_id().to_string(),
            escalated: false,
            token_usage: TokenUsage::default(),
            cost_usd: 0.0,
            parse_error: None,
        }
    }
}
