//! GitHub sourcing: code-contribution profile source.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agents::base::RoleBehavior;
use crate::agents::models::{
    check_range, EvaluationRequest, QualitySignals, RoleOutput, SchemaError, ScoreScale,
};
use crate::agents::roles::{decode_assessment, render_job, render_json, Level};
use crate::agents::tiers::AgentRole;
use crate::llm_client::prompts::{
    FAIRNESS_INSTRUCTION, QUALITY_SIGNALS_RULES, QUALITY_SIGNALS_SCHEMA,
};

pub const GITHUB_SYSTEM: &str = "You are a senior engineer who reviews open-source activity \
    to judge technical ability. You assess code quality, repository activity, languages, \
    open-source involvement and collaboration patterns. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

const GITHUB_PROMPT_TEMPLATE: &str = r#"Evaluate this candidate's code contributions against the job opening.

{job}

CANDIDATE #{candidate_id}
- GitHub URL: {url}
- Profile data:
{profile}

{fairness}

Return a JSON object with this EXACT schema:
{
  "technical_score": 72,
  "code_quality": "medium",
  "activity_level": "active",
  "primary_languages": ["Python", "JavaScript"],
  "notable_projects": ["fastapi-utils fork with 40 stars"],
  "open_source_involvement": "medium",
{quality_signals}
}

technical_score is 0-100. code_quality and open_source_involvement are one of high|medium|low.
activity_level is one of very_active|active|occasional|inactive.
Private work is invisible here: low public activity alone is NOT evidence of low skill.
{quality_rules}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    VeryActive,
    Active,
    Occasional,
    Inactive,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubAssessment {
    pub technical_score: f64,
    pub code_quality: Level,
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub primary_languages: Vec<String>,
    #[serde(default)]
    pub notable_projects: Vec<String>,
    pub open_source_involvement: Level,
    #[serde(default)]
    pub reasoning: String,
    #[serde(flatten)]
    pub signals: QualitySignals,
}

pub struct GithubSourcingRole;

impl RoleBehavior for GithubSourcingRole {
    fn role(&self) -> AgentRole {
        AgentRole::GithubSourcing
    }

    fn system_prompt(&self) -> &'static str {
        GITHUB_SYSTEM
    }

    fn format_request(&self, request: &EvaluationRequest) -> String {
        let candidate = &request.candidate;
        let profile = candidate
            .github_profile
            .as_ref()
            .map(render_json)
            .unwrap_or_else(|| "not available".to_string());

        GITHUB_PROMPT_TEMPLATE
            .replace("{fairness}", FAIRNESS_INSTRUCTION)
            .replace("{quality_signals}", QUALITY_SIGNALS_SCHEMA)
            .replace("{quality_rules}", QUALITY_SIGNALS_RULES)
            .replace("{candidate_id}", &candidate.candidate_id.to_string())
            // Caller-supplied content last, so it is never scanned for placeholders.
            .replace("{job}", &render_job(&request.job))
            .replace("{url}", candidate.github_url.as_deref().unwrap_or("not provided"))
            .replace("{profile}", &profile)
    }

    fn parse_response(&self, value: Value) -> Result<RoleOutput, SchemaError> {
        let a: GithubAssessment = decode_assessment(self.role(), value)?;
        check_range("technical_score", a.technical_score, 100.0)?;
        check_range("confidence", a.signals.confidence, 1.0)?;

        Ok(RoleOutput {
            raw_score: a.technical_score,
            scale: ScoreScale::Percent,
            metadata: json!({
                "has_profile": true,
                "code_quality": a.code_quality,
                "activity_level": a.activity_level,
                "primary_languages": a.primary_languages,
                "notable_projects": a.notable_projects,
                "open_source_involvement": a.open_source_involvement,
            }),
            reasoning: a.reasoning,
            signals: a.signals,
        })
    }

    fn missing_source_vote(&self, request: &EvaluationRequest) -> Option<RoleOutput> {
        if request.candidate.has_github() {
            return None;
        }
        Some(RoleOutput {
            raw_score: 0.5,
            scale: ScoreScale::Unit,
            reasoning: "No GitHub profile provided".to_string(),
            signals: QualitySignals::with_confidence(0.3),
            metadata: json!({ "has_profile": false }),
        })
    }
}
