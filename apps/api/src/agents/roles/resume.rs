//! Resume analysis: document profile source.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::agents::base::RoleBehavior;
use crate::agents::models::{
    check_range, EvaluationRequest, QualitySignals, RoleOutput, SchemaError, ScoreScale,
};
use crate::agents::roles::{decode_assessment, render_job};
use crate::agents::tiers::AgentRole;
use crate::llm_client::prompts::{
    FAIRNESS_INSTRUCTION, QUALITY_SIGNALS_RULES, QUALITY_SIGNALS_SCHEMA,
};

/// Resume text beyond this many characters is cut before prompting.
pub(crate) const MAX_RESUME_CHARS: usize = 20_000;

pub const RESUME_SYSTEM: &str = "You are an expert resume analyst. You extract skills, \
    experience and education from a resume and judge how well they match a job opening. \
    You note career gaps and red flags without speculating about their causes. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

const RESUME_PROMPT_TEMPLATE: &str = r#"Analyze this resume against the job opening.

{job}

CANDIDATE #{candidate_id}
- Resume URL: {url}
- Resume text:
"""
{resume_text}
"""

{fairness}

Return a JSON object with this EXACT schema:
{
  "overall_match_score": 82,
  "skills_found": ["Python", "PostgreSQL"],
  "skills_missing": ["FastAPI"],
  "experience_years": 5,
  "education_level": "BS Computer Science",
  "career_gaps": [],
  "red_flags": [],
{quality_signals}
}

overall_match_score is 0-100. Only list skills that literally appear in the resume text.
An empty or missing resume must get a low score AND low confidence.
{quality_rules}"#;

#[derive(Debug, Clone, Deserialize)]
pub struct ResumeAssessment {
    pub overall_match_score: f64,
    #[serde(default)]
    pub skills_found: Vec<String>,
    #[serde(default)]
    pub skills_missing: Vec<String>,
    #[serde(default)]
    pub experience_years: Option<f64>,
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub career_gaps: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(flatten)]
    pub signals: QualitySignals,
}

pub struct ResumeAnalysisRole;

impl RoleBehavior for ResumeAnalysisRole {
    fn role(&self) -> AgentRole {
        AgentRole::ResumeAnalysis
    }

    fn system_prompt(&self) -> &'static str {
        RESUME_SYSTEM
    }

    fn format_request(&self, request: &EvaluationRequest) -> String {
        let candidate = &request.candidate;
        let resume_text = candidate
            .resume_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(|t| truncate_chars(t, MAX_RESUME_CHARS))
            .unwrap_or("(resume text not available; only the URL was provided)");

        RESUME_PROMPT_TEMPLATE
            .replace("{fairness}", FAIRNESS_INSTRUCTION)
            .replace("{quality_signals}", QUALITY_SIGNALS_SCHEMA)
            .replace("{quality_rules}", QUALITY_SIGNALS_RULES)
            .replace("{candidate_id}", &candidate.candidate_id.to_string())
            // Caller-supplied content last, so it is never scanned for placeholders.
            .replace("{job}", &render_job(&request.job))
            .replace("{url}", candidate.resume_url.as_deref().unwrap_or("not provided"))
            .replace("{resume_text}", resume_text)
    }

    fn parse_response(&self, value: Value) -> Result<RoleOutput, SchemaError> {
        let a: ResumeAssessment = decode_assessment(self.role(), value)?;
        check_range("overall_match_score", a.overall_match_score, 100.0)?;
        check_range("confidence", a.signals.confidence, 1.0)?;

        Ok(RoleOutput {
            raw_score: a.overall_match_score,
            scale: ScoreScale::Percent,
            metadata: json!({
                "has_resume": true,
                "skills_found": a.skills_found,
                "skills_missing": a.skills_missing,
                "experience_years": a.experience_years,
                "education_level": a.education_level,
                "career_gaps": a.career_gaps,
                "red_flags": a.red_flags,
            }),
            reasoning: a.reasoning,
            signals: a.signals,
        })
    }

    fn missing_source_vote(&self, request: &EvaluationRequest) -> Option<RoleOutput> {
        if request.candidate.has_resume() {
            return None;
        }
        Some(RoleOutput {
            raw_score: 0.4,
            scale: ScoreScale::Unit,
            reasoning: "No resume provided".to_string(),
            signals: QualitySignals::with_confidence(0.2),
            metadata: json!({ "has_resume": false }),
        })
    }
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
