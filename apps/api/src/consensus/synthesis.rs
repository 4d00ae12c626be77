//! LLM-mediated consensus, used when the agents disagree too much to average.
//!
//! Runs through the ordinary `EvaluationAgent` machinery as the `consensus_engine`
//! role, so it is always premium, its cost is metered, and an unusable answer
//! degrades into a zero-confidence fallback instead of an error.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agents::base::RoleBehavior;
use crate::agents::models::{
    check_range, EvaluationRequest, EvaluationResult, QualitySignals, RoleOutput, SchemaError,
    ScoreScale,
};
use crate::agents::roles::{decode_assessment, render_job, render_votes, Level};
use crate::agents::tiers::AgentRole;
use crate::consensus::{Recommendation, VoteStats};
use crate::llm_client::prompts::{QUALITY_SIGNALS_RULES, QUALITY_SIGNALS_SCHEMA};

pub const SYNTHESIS_SYSTEM: &str = "You are the chair of a hiring committee. Several \
    specialist evaluators have scored the same candidate and they disagree. Your job is to \
    weigh their evidence, explain where and why they diverge, and reach a single decision \
    with an honest risk assessment. A disagreement you cannot resolve is a reason to ask \
    for human review, not to split the difference. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

const SYNTHESIS_PROMPT_TEMPLATE: &str = r#"Reach a consensus decision for this candidate.

{job}

CANDIDATE #{candidate_id}

VOTE STATISTICS
- Mean score: {avg_score}
- Variance: {variance}
- Largest deviation from the mean: {max_deviation}

AGENT EVALUATIONS:
{votes}

Return a JSON object with this EXACT schema:
{
  "final_score": 0.65,
  "recommendation": "maybe",
  "risk_assessment": {"level": "medium", "factors": ["..."]},
  "key_disagreements": ["..."],
  "requires_human_review": true,
{quality_signals}
}

final_score is 0.0-1.0.
recommendation is one of strong_hire|hire|maybe|proceed_with_caution|pass.
risk_assessment.level is one of high|medium|low.
{quality_rules}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: Level,
    #[serde(default)]
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SynthesisAssessment {
    final_score: f64,
    recommendation: Recommendation,
    risk_assessment: RiskAssessment,
    #[serde(default)]
    key_disagreements: Vec<String>,
    #[serde(default)]
    requires_human_review: bool,
    #[serde(default)]
    reasoning: String,
    #[serde(flatten)]
    signals: QualitySignals,
}

/// The structured decision carried in a synthesis vote's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisVerdict {
    pub recommendation: Recommendation,
    pub risk_assessment: RiskAssessment,
    pub key_disagreements: Vec<String>,
    pub requires_human_review: bool,
}

/// Reads the verdict back out of a synthesis vote. `None` for fallback votes.
pub fn verdict_of(vote: &EvaluationResult) -> Option<SynthesisVerdict> {
    serde_json::from_value(vote.metadata.clone()).ok()
}

pub struct ConsensusSynthesisRole;

impl RoleBehavior for ConsensusSynthesisRole {
    fn role(&self) -> AgentRole {
        AgentRole::ConsensusEngine
    }

    fn system_prompt(&self) -> &'static str {
        SYNTHESIS_SYSTEM
    }

    fn format_request(&self, request: &EvaluationRequest) -> String {
        let scores: Vec<f64> = request.other_agent_votes.values().map(|v| v.score).collect();
        let stats = VoteStats::of(&scores);

        SYNTHESIS_PROMPT_TEMPLATE
            .replace("{quality_signals}", QUALITY_SIGNALS_SCHEMA)
            .replace("{quality_rules}", QUALITY_SIGNALS_RULES)
            .replace("{candidate_id}", &request.candidate.candidate_id.to_string())
            .replace("{avg_score}", &format!("{:.3}", stats.avg_score))
            .replace("{variance}", &format!("{:.3}", stats.variance))
            .replace("{max_deviation}", &format!("{:.3}", stats.max_deviation))
            .replace("{job}", &render_job(&request.job))
            .replace("{votes}", &render_votes(&request.other_agent_votes))
    }

    fn parse_response(&self, value: Value) -> Result<RoleOutput, SchemaError> {
        let a: SynthesisAssessment = decode_assessment(self.role(), value)?;
        check_range("final_score", a.final_score, 1.0)?;
        check_range("confidence", a.signals.confidence, 1.0)?;

        let verdict = SynthesisVerdict {
            recommendation: a.recommendation,
            risk_assessment: a.risk_assessment,
            key_disagreements: a.key_disagreements,
            requires_human_review: a.requires_human_review,
        };

        Ok(RoleOutput {
            raw_score: a.final_score,
            scale: ScoreScale::Unit,
            metadata: json!(verdict),
            reasoning: a.reasoning,
            signals: a.signals,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_parses_verdict_into_metadata() {
        let value = json!({
            "final_score": 0.4,
            "recommendation": "proceed_with_caution",
            "confidence": 0.6,
            "risk_assessment": {"level": "high", "factors": ["unverifiable claims"]},
            "key_disagreements": ["resume vs GitHub"],
            "requires_human_review": true,
            "reasoning": "Claims in the resume are not reflected in public code"
        });

        let output = ConsensusSynthesisRole.parse_response(value).unwrap();
        let verdict: SynthesisVerdict = serde_json::from_value(output.metadata).unwrap();

        assert_eq!(verdict.recommendation, Recommendation::ProceedWithCaution);
        assert_eq!(verdict.risk_assessment.level, Level::High);
        assert!(verdict.requires_human_review);
        assert_eq!(output.raw_score, 0.4);
    }

    #[test]
    fn test_unknown_recommendation_is_rejected() {
        let value = json!({
            "final_score": 0.4,
            "recommendation": "definitely",
            "confidence": 0.6,
            "risk_assessment": {"level": "low"}
        });
        assert!(matches!(
            ConsensusSynthesisRole.parse_response(value),
            Err(SchemaError::Schema { role: AgentRole::ConsensusEngine, .. })
        ));
    }

    #[test]
    fn test_confidence_above_one_is_rejected() {
        let value = json!({
            "final_score": 0.4,
            "recommendation": "pass",
            "confidence": 1.5,
            "risk_assessment": {"level": "low"}
        });
        assert!(matches!(
            ConsensusSynthesisRole.parse_response(value),
            Err(SchemaError::OutOfRange { field: "confidence", .. })
        ));
    }

    #[test]
    fn test_prompt_carries_vote_statistics() {
        let votes = BTreeMap::from([
            (
                AgentRole::ResumeAnalysis,
                EvaluationResult::stub(AgentRole::ResumeAnalysis, 0.95, 0.9),
            ),
            (
                AgentRole::GithubSourcing,
                EvaluationResult::stub(AgentRole::GithubSourcing, 0.10, 0.8),
            ),
        ]);
        let request = EvaluationRequest::default().with_votes(votes);

        let prompt = ConsensusSynthesisRole.format_request(&request);

        assert!(prompt.contains("Mean score: 0.525"));
        assert!(prompt.contains("Largest deviation from the mean: 0.425"));
        assert!(prompt.contains("github_sourcing): score 0.10"));
    }

    #[test]
    fn test_fallback_metadata_has_no_verdict() {
        let mut vote = EvaluationResult::stub(AgentRole::ConsensusEngine, 0.0, 0.0);
        vote.metadata = json!({"error": "response is not valid JSON"});
        assert!(verdict_of(&vote).is_none());
    }
}
