// Concrete agent roles. Each file owns one role's prompts, schema and parsing.
// The mechanism (tiering, escalation, metrics) is shared in `agents::base`.

pub mod bias;
pub mod github;
pub mod linkedin;
pub mod predictive;
pub mod resume;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::models::{EvaluationResult, JobRequirements, SchemaError};
use crate::agents::tiers::AgentRole;

pub use bias::BiasDetectionRole;
pub use github::GithubSourcingRole;
pub use linkedin::LinkedinSourcingRole;
pub use predictive::PredictiveAnalyticsRole;
pub use resume::ResumeAnalysisRole;

/// Three-step rating used by several role schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    High,
    Medium,
    Low,
}

/// Decodes a role schema, reporting field/enum mismatches as `SchemaError::Schema`.
pub(crate) fn decode_assessment<T: DeserializeOwned>(
    role: AgentRole,
    value: Value,
) -> Result<T, SchemaError> {
    serde_json::from_value(value).map_err(|e| SchemaError::Schema {
        role,
        message: e.to_string(),
    })
}

/// Job block shared by every role's user prompt.
pub(crate) fn render_job(job: &JobRequirements) -> String {
    let skills = if job.required_skills.is_empty() {
        "not specified".to_string()
    } else {
        job.required_skills.join(", ")
    };
    format!(
        "JOB OPENING{id}\n- Title: {title}\n- Required skills: {skills}\n- Experience required: {years}\n- Description: {description}",
        id = job
            .job_opening_id
            .map(|id| format!(" #{id}"))
            .unwrap_or_default(),
        title = job.title.as_deref().unwrap_or("not specified"),
        years = job
            .experience_years
            .map(|y| format!("{y}+ years"))
            .unwrap_or_else(|| "not specified".to_string()),
        description = job.description.as_deref().unwrap_or("not specified"),
    )
}

/// Pretty JSON for embedding inline data in a prompt.
pub(crate) fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// One block per peer vote, for the roles that review other agents' work.
pub(crate) fn render_votes(votes: &BTreeMap<AgentRole, EvaluationResult>) -> String {
    if votes.is_empty() {
        return "(no agent evaluations were available)".to_string();
    }
    votes
        .values()
        .map(|vote| {
            let mut block = format!(
                "- {name} ({role}): score {score:.2}, confidence {confidence:.2}\n  Reasoning: {reasoning}",
                name = vote.role.display_name(),
                role = vote.role,
                score = vote.score,
                confidence = vote.confidence(),
                reasoning = if vote.reasoning.is_empty() {
                    "(none given)"
                } else {
                    vote.reasoning.as_str()
                },
            );
            if !vote.signals.concerns.is_empty() {
                block.push_str(&format!("\n  Concerns: {}", vote.signals.concerns.join("; ")));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}
