//! LinkedIn sourcing: professional-network profile source.

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

pub const LINKEDIN_SYSTEM: &str = "You are an expert technical recruiter who evaluates \
    professional profiles against job openings. You assess work-experience relevance, \
    career progression, skills and endorsements. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

const LINKEDIN_PROMPT_TEMPLATE: &str = r#"Evaluate this candidate's professional profile against the job opening.

{job}

CANDIDATE #{candidate_id}
- Profile URL: {url}
- Profile data:
{profile}

{fairness}

Return a JSON object with this EXACT schema:
{
  "overall_score": 78,
  "experience_relevance": "high",
  "career_progression": "ascending",
  "years_experience": 5,
  "skills_matched": ["Python"],
  "skills_missing": ["Kubernetes"],
  "red_flags": [],
{quality_signals}
}

overall_score is 0-100. experience_relevance is one of high|medium|low.
career_progression is one of ascending|lateral|descending|unclear.
If only a URL is available, score conservatively and lower confidence accordingly.
{quality_rules}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerProgression {
    Ascending,
    Lateral,
    Descending,
    Unclear,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkedinAssessment {
    pub overall_score: f64,
    pub experience_relevance: Level,
    pub career_progression: CareerProgression,
    #[serde(default)]
    pub years_experience: Option<f64>,
    #[serde(default)]
    pub skills_matched: Vec<String>,
    #[serde(default)]
    pub skills_missing: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(flatten)]
    pub signals: QualitySignals,
}

pub struct LinkedinSourcingRole;

impl RoleBehavior for LinkedinSourcingRole {
    fn role(&self) -> AgentRole {
        AgentRole::LinkedinSourcing
    }

    fn system_prompt(&self) -> &'static str {
        LINKEDIN_SYSTEM
    }

    fn format_request(&self, request: &EvaluationRequest) -> String {
        let candidate = &request.candidate;
        let profile = candidate
            .linkedin_profile
            .as_ref()
            .map(render_json)
            .unwrap_or_else(|| "not available".to_string());

        LINKEDIN_PROMPT_TEMPLATE
            .replace("{fairness}", FAIRNESS_INSTRUCTION)
            .replace("{quality_signals}", QUALITY_SIGNALS_SCHEMA)
            .replace("{quality_rules}", QUALITY_SIGNALS_RULES)
            .replace("{candidate_id}", &candidate.candidate_id.to_string())
            // Caller-supplied content last, so it is never scanned for placeholders.
            .replace("{job}", &render_job(&request.job))
            .replace("{url}", candidate.linkedin_url.as_deref().unwrap_or("not provided"))
            .replace("{profile}", &profile)
    }

    fn parse_response(&self, value: Value) -> Result<RoleOutput, SchemaError> {
        let a: LinkedinAssessment = decode_assessment(self.role(), value)?;
        check_range("overall_score", a.overall_score, 100.0)?;
        check_range("confidence", a.signals.confidence, 1.0)?;

        Ok(RoleOutput {
            raw_score: a.overall_score,
            scale: ScoreScale::Percent,
            metadata: json!({
                "has_profile": true,
                "experience_relevance": a.experience_relevance,
                "career_progression": a.career_progression,
                "years_experience": a.years_experience,
                "skills_matched": a.skills_matched,
                "skills_missing": a.skills_missing,
                "red_flags": a.red_flags,
            }),
            reasoning: a.reasoning,
            signals: a.signals,
        })
    }

    fn missing_source_vote(&self, request: &EvaluationRequest) -> Option<RoleOutput> {
        if request.candidate.has_linkedin() {
            return None;
        }
        Some(RoleOutput {
            raw_score: 0.5,
            scale: ScoreScale::Unit,
            reasoning: "No LinkedIn profile provided".to_string(),
            signals: QualitySignals::with_confidence(0.3),
            metadata: json!({ "has_profile": false }),
        })
    }
}
