//! Predictive analytics: outcome forecast. Always premium.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::agents::base::RoleBehavior;
use crate::agents::models::{
    check_range, CandidateProfile, EvaluationRequest, QualitySignals, RoleOutput, SchemaError,
    ScoreScale,
};
use crate::agents::roles::resume::{truncate_chars, MAX_RESUME_CHARS};
use crate::agents::roles::{decode_assessment, render_job, render_json, Level};
use crate::agents::tiers::AgentRole;
use crate::llm_client::prompts::{
    FAIRNESS_INSTRUCTION, QUALITY_SIGNALS_RULES, QUALITY_SIGNALS_SCHEMA,
};

pub const PREDICTIVE_SYSTEM: &str = "You are a workforce analytics expert who forecasts \
    hiring outcomes. From the evidence available you estimate the probability that a \
    candidate succeeds in the role, stays at least two years, and how quickly they \
    become productive. You are explicit about what the forecast rests on. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

const PREDICTIVE_PROMPT_TEMPLATE: &str = r#"Forecast this candidate's outcome in the job opening.

{job}

CANDIDATE #{candidate_id}
- Sources available: {sources}

{evidence}

{fairness}

Return a JSON object with this EXACT schema:
{
  "success_probability": 0.78,
  "retention_probability": 0.82,
  "performance_forecast": "high",
  "time_to_productivity_months": 3,
  "risk_factors": ["No management experience for a lead role"],
{quality_signals}
}

success_probability and retention_probability are 0.0-1.0.
performance_forecast is one of high|medium|low.
Base the forecast only on the evidence above.
With few sources available, keep probabilities near 0.5 and lower confidence.
{quality_rules}"#;

#[derive(Debug, Clone, Deserialize)]
pub struct PredictiveAssessment {
    pub success_probability: f64,
    pub retention_probability: f64,
    pub performance_forecast: Level,
    #[serde(default)]
    pub time_to_productivity_months: Option<f64>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(flatten)]
    pub signals: QualitySignals,
}

pub struct PredictiveAnalyticsRole;

impl RoleBehavior for PredictiveAnalyticsRole {
    fn role(&self) -> AgentRole {
        AgentRole::PredictiveAnalytics
    }

    fn system_prompt(&self) -> &'static str {
        PREDICTIVE_SYSTEM
    }

    fn format_request(&self, request: &EvaluationRequest) -> String {
        PREDICTIVE_PROMPT_TEMPLATE
            .replace("{fairness}", FAIRNESS_INSTRUCTION)
            .replace("{quality_signals}", QUALITY_SIGNALS_SCHEMA)
            .replace("{quality_rules}", QUALITY_SIGNALS_RULES)
            .replace("{candidate_id}", &request.candidate.candidate_id.to_string())
            .replace("{sources}", &describe_sources(request))
            // Caller-supplied content last, so it is never scanned for placeholders.
            .replace("{job}", &render_job(&request.job))
            .replace("{evidence}", &render_evidence(&request.candidate))
    }

    fn parse_response(&self, value: Value) -> Result<RoleOutput, SchemaError> {
        let a: PredictiveAssessment = decode_assessment(self.role(), value)?;
        check_range("success_probability", a.success_probability, 1.0)?;
        check_range("retention_probability", a.retention_probability, 1.0)?;
        check_range("confidence", a.signals.confidence, 1.0)?;
        if let Some(months) = a.time_to_productivity_months {
            if months < 0.0 {
                return Err(SchemaError::Validation(format!(
                    "time_to_productivity_months must not be negative, got {months}"
                )));
            }
        }

        Ok(RoleOutput {
            raw_score: a.success_probability,
            scale: ScoreScale::Unit,
            metadata: json!({
                "retention_probability": a.retention_probability,
                "performance_forecast": a.performance_forecast,
                "time_to_productivity_months": a.time_to_productivity_months,
                "risk_factors": a.risk_factors,
            }),
            reasoning: a.reasoning,
            signals: a.signals,
        })
    }
}

/// Everything the profile agents see, in one block.
fn render_evidence(candidate: &CandidateProfile) -> String {
    let url = |u: &Option<String>| u.clone().unwrap_or_else(|| "not provided".to_string());
    let profile = |p: &Option<Value>| {
        p.as_ref()
            .map(render_json)
            .unwrap_or_else(|| "not available".to_string())
    };
    let resume = candidate
        .resume_text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| truncate_chars(t, MAX_RESUME_CHARS))
        .unwrap_or("not available");

    format!(
        "RESUME\n- URL: {}\n- Text:\n\"\"\"\n{}\n\"\"\"\n\n\
         LINKEDIN\n- URL: {}\n- Profile data:\n{}\n\n\
         GITHUB\n- URL: {}\n- Profile data:\n{}",
        url(&candidate.resume_url),
        resume,
        url(&candidate.linkedin_url),
        profile(&candidate.linkedin_profile),
        url(&candidate.github_url),
        profile(&candidate.github_profile),
    )
}

fn describe_sources(request: &EvaluationRequest) -> String {
    let candidate = &request.candidate;
    let sources: Vec<&str> = [
        (candidate.has_resume(), "resume"),
        (candidate.has_linkedin(), "LinkedIn profile"),
        (candidate.has_github(), "GitHub profile"),
    ]
    .into_iter()
    .filter_map(|(present, name)| present.then_some(name))
    .collect();

    if sources.is_empty() {
        "none".to_string()
    } else {
        sources.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_probability_is_the_score() {
        let value = json!({
            "success_probability": 0.78,
            "retention_probability": 0.82,
            "performance_forecast": "high",
            "time_to_productivity_months": 3,
            "risk_factors": [],
            "confidence": 0.85,
            "reasoning": "High likelihood of success based on skills match"
        });

        let output = PredictiveAnalyticsRole.parse_response(value).unwrap();

        assert_eq!(output.scale, ScoreScale::Unit);
        assert_eq!(output.raw_score, 0.78);
        assert_eq!(output.metadata["performance_forecast"], "high");
    }

    #[test]
    fn test_percent_probability_is_out_of_range() {
        let value = json!({
            "success_probability": 78,
            "retention_probability": 0.82,
            "performance_forecast": "high",
            "confidence": 0.85
        });
        assert!(matches!(
            PredictiveAnalyticsRole.parse_response(value),
            Err(SchemaError::OutOfRange { field: "success_probability", .. })
        ));
    }

    #[test]
    fn test_negative_ramp_up_is_invalid() {
        let value = json!({
            "success_probability": 0.5,
            "retention_probability": 0.5,
            "performance_forecast": "medium",
            "time_to_productivity_months": -2,
            "confidence": 0.7
        });
        assert!(matches!(
            PredictiveAnalyticsRole.parse_response(value),
            Err(SchemaError::Validation(_))
        ));
    }

    #[test]
    fn test_prompt_lists_available_sources() {
        let request = EvaluationRequest {
            candidate: CandidateProfile {
                candidate_id: 9,
                resume_text: Some("Python developer".to_string()),
                github_url: Some("https://github.com/test".to_string()),
                ..CandidateProfile::default()
            },
            ..EvaluationRequest::default()
        };

        let prompt = PredictiveAnalyticsRole.format_request(&request);

        assert!(prompt.contains("Sources available: resume, GitHub profile"));
        assert!(PredictiveAnalyticsRole
            .format_request(&EvaluationRequest::default())
            .contains("Sources available: none"));
    }

    #[test]
    fn test_prompt_carries_candidate_evidence() {
        let request = EvaluationRequest {
            candidate: CandidateProfile {
                candidate_id: 9,
                resume_text: Some("Staff engineer, 12 years of Rust and Go".to_string()),
                linkedin_url: Some("https://linkedin.com/in/forecast".to_string()),
                github_profile: Some(json!({"public_repos": 41, "followers": 310})),
                ..CandidateProfile::default()
            },
            ..EvaluationRequest::default()
        };

        let prompt = PredictiveAnalyticsRole.format_request(&request);

        assert!(prompt.contains("Staff engineer, 12 years of Rust and Go"));
        assert!(prompt.contains("https://linkedin.com/in/forecast"));
        assert!(prompt.contains("\"public_repos\": 41"));
        assert!(!prompt.contains("{evidence}"));
    }

    #[test]
    fn test_evidence_is_not_expanded_as_placeholders() {
        let request = EvaluationRequest {
            candidate: CandidateProfile {
                candidate_id: 3,
                resume_text: Some("Skills: {quality_rules} {fairness}".to_string()),
                ..CandidateProfile::default()
            },
            ..EvaluationRequest::default()
        };

        let prompt = PredictiveAnalyticsRole.format_request(&request);

        assert!(prompt.contains("Skills: {quality_rules} {fairness}"));
        assert_eq!(prompt.matches(FAIRNESS_INSTRUCTION).count(), 1);
    }
}
