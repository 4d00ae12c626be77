//! Bias detection: compliance review over every other agent's vote.
//!
//! Always runs after the profile and forecast agents, on the premium tier.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agents::base::RoleBehavior;
use crate::agents::models::{
    check_range, EvaluationRequest, QualitySignals, RoleOutput, SchemaError, ScoreScale,
};
use crate::agents::roles::{decode_assessment, render_job, render_votes, Level};
use crate::agents::tiers::AgentRole;
use crate::llm_client::prompts::{QUALITY_SIGNALS_RULES, QUALITY_SIGNALS_SCHEMA};

pub const BIAS_SYSTEM: &str = "You are an EEOC compliance specialist who audits hiring \
    evaluations for bias. You look for reasoning that relies on protected characteristics \
    (age, gender, race or ethnicity, disability, religion, national origin) or on proxies \
    for them, such as graduation years, names, gaps explained by caregiving, or location. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

const BIAS_PROMPT_TEMPLATE: &str = r#"Audit these agent evaluations for bias and EEOC compliance.

{job}

CANDIDATE #{candidate_id}

AGENT EVALUATIONS:
{votes}

Return a JSON object with this EXACT schema:
{
  "eeoc_compliance_score": 95,
  "bias_flags": [
    {"category": "age", "severity": "low", "agent": "resume_analysis", "description": "..."}
  ],
  "eeoc_compliant": true,
  "recommendations": ["..."],
{quality_signals}
}

eeoc_compliance_score is 0-100 where 100 means no bias indicators at all.
category is one of age|gender|race_ethnicity|disability|religion|national_origin|other.
severity is one of high|medium|low. agent names the evaluation the flag applies to.
Return an empty bias_flags list when nothing is found; do not invent flags.
{quality_rules}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectedCategory {
    Age,
    Gender,
    RaceEthnicity,
    Disability,
    Religion,
    NationalOrigin,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasFlag {
    pub category: ProtectedCategory,
    pub severity: Level,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BiasAssessment {
    pub eeoc_compliance_score: f64,
    #[serde(default)]
    pub bias_flags: Vec<BiasFlag>,
    pub eeoc_compliant: bool,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(flatten)]
    pub signals: QualitySignals,
}

pub struct BiasDetectionRole;

impl RoleBehavior for BiasDetectionRole {
    fn role(&self) -> AgentRole {
        AgentRole::BiasDetection
    }

    fn system_prompt(&self) -> &'static str {
        BIAS_SYSTEM
    }

    fn format_request(&self, request: &EvaluationRequest) -> String {
        BIAS_PROMPT_TEMPLATE
            .replace("{quality_signals}", QUALITY_SIGNALS_SCHEMA)
            .replace("{quality_rules}", QUALITY_SIGNALS_RULES)
            .replace("{candidate_id}", &request.candidate.candidate_id.to_string())
            .replace("{job}", &render_job(&request.job))
            .replace("{votes}", &render_votes(&request.other_agent_votes))
    }

    fn parse_response(&self, value: Value) -> Result<RoleOutput, SchemaError> {
        let a: BiasAssessment = decode_assessment(self.role(), value)?;
        check_range("eeoc_compliance_score", a.eeoc_compliance_score, 100.0)?;
        check_range("confidence", a.signals.confidence, 1.0)?;

        Ok(RoleOutput {
            raw_score: a.eeoc_compliance_score,
            scale: ScoreScale::Percent,
            metadata: json!({
                "bias_flags": a.bias_flags,
                "eeoc_compliant": a.eeoc_compliant,
                "recommendations": a.recommendations,
            }),
            reasoning: a.reasoning,
            signals: a.signals,
        })
    }
}

/// Bias flags carried in a compliance vote's metadata. Empty for any other vote.
pub fn bias_flags_of(metadata: &Value) -> Vec<BiasFlag> {
    metadata
        .get("bias_flags")
        .cloned()
        .and_then(|flags| serde_json::from_value(flags).ok())
        .unwrap_or_default()
}
