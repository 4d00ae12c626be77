//! Consensus engine: folds the collected votes into one hiring decision.
//!
//! Two closed-form aggregators (confidence-weighted average, majority) handle the
//! common case. When the informative votes disagree too much for an average to mean
//! anything, the decision is delegated to an LLM synthesis call instead.

pub mod synthesis;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::agents::base::EvaluationAgent;
use crate::agents::cost::round_to;
use crate::agents::models::{DecisionType, EvaluationRequest, EvaluationResult, StakesFlags};
use crate::agents::roles::Level;
use crate::agents::tiers::AgentRole;
use crate::consensus::synthesis::verdict_of;

/// Votes within this distance of the mean count as "in consensus".
pub const CONSENSUS_BAND: f64 = 0.15;
/// Any informative vote further than this from the mean triggers synthesis.
pub const DISAGREEMENT_THRESHOLD: f64 = 0.4;
/// Score variance above this triggers synthesis.
pub const VARIANCE_THRESHOLD: f64 = 0.15;
/// Majority voting: a score at or above this is a "yes".
pub const MAJORITY_YES_THRESHOLD: f64 = 0.7;
/// Precision scores are compared at when picking a recommendation.
const RECOMMENDATION_DECIMALS: i32 = 4;

// ────────────────────────────────────────────────────────────────────────────
// Mechanism and recommendation
// ────────────────────────────────────────────────────────────────────────────

/// Closed-form aggregator, chosen at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusMechanism {
    #[default]
    WeightedAverage,
    Majority,
}

impl ConsensusMechanism {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsensusMechanism::WeightedAverage => "weighted_average",
            ConsensusMechanism::Majority => "majority",
        }
    }
}

impl fmt::Display for ConsensusMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown consensus mechanism '{0}' (expected weighted_average or majority)")]
pub struct UnknownMechanism(String);

impl FromStr for ConsensusMechanism {
    type Err = UnknownMechanism;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weighted_average" => Ok(ConsensusMechanism::WeightedAverage),
            "majority" => Ok(ConsensusMechanism::Majority),
            other => Err(UnknownMechanism(other.to_string())),
        }
    }
}

/// How a particular result was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusMethod {
    WeightedAverage,
    Majority,
    LlmSynthesis,
}

impl From<ConsensusMechanism> for ConsensusMethod {
    fn from(mechanism: ConsensusMechanism) -> Self {
        match mechanism {
            ConsensusMechanism::WeightedAverage => ConsensusMethod::WeightedAverage,
            ConsensusMechanism::Majority => ConsensusMethod::Majority,
        }
    }
}

/// Ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Pass,
    ProceedWithCaution,
    Maybe,
    Hire,
    StrongHire,
}

impl Recommendation {
    /// Classifies on the score rounded to four places, so a weighted average that is
    /// exactly on a cut-off in decimal does not fall below it in binary.
    pub fn from_score(score: f64) -> Self {
        let score = round_to(score, RECOMMENDATION_DECIMALS);
        if score >= 0.85 {
            Recommendation::StrongHire
        } else if score >= 0.70 {
            Recommendation::Hire
        } else if score >= 0.55 {
            Recommendation::Maybe
        } else if score >= 0.40 {
            Recommendation::ProceedWithCaution
        } else {
            Recommendation::Pass
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Statistics
// ────────────────────────────────────────────────────────────────────────────

/// Spread of a set of scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoteStats {
    pub avg_score: f64,
    pub variance: f64,
    pub agreement_score: f64,
    pub agents_in_consensus: usize,
    pub max_deviation: f64,
}

impl VoteStats {
    pub fn of(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self {
                avg_score: 0.0,
                variance: 0.0,
                agreement_score: 0.0,
                agents_in_consensus: 0,
                max_deviation: 0.0,
            };
        }

        let n = scores.len() as f64;
        let avg_score = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - avg_score).powi(2)).sum::<f64>() / n;
        let max_deviation = scores
            .iter()
            .map(|s| (s - avg_score).abs())
            .fold(0.0, f64::max);

        Self {
            avg_score,
            variance,
            agreement_score: 1.0 - variance.min(1.0),
            agents_in_consensus: scores
                .iter()
                .filter(|s| (*s - avg_score).abs() <= CONSENSUS_BAND)
                .count(),
            max_deviation,
        }
    }

    /// Too much spread for a closed-form summary. Needs at least two votes.
    pub fn is_disagreement(&self, votes: usize) -> bool {
        votes >= 2
            && (self.max_deviation > DISAGREEMENT_THRESHOLD || self.variance > VARIANCE_THRESHOLD)
    }

    fn as_details(&self) -> Value {
        json!({
            "avg_score": self.avg_score,
            "score_variance": self.variance,
            "max_deviation": self.max_deviation,
        })
    }
}

/// `Σ(score·confidence) / Σ(confidence)`, or 0 when no vote carries any confidence.
pub fn weighted_score<'a>(votes: impl IntoIterator<Item = &'a EvaluationResult>) -> f64 {
    let (weighted_sum, confidence_sum) = votes
        .into_iter()
        .fold((0.0, 0.0), |(ws, cs), vote| {
            (ws + vote.score * vote.confidence(), cs + vote.confidence())
        });
    if confidence_sum > 0.0 {
        weighted_sum / confidence_sum
    } else {
        0.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Result
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ConsensusResult {
    pub method: ConsensusMethod,
    pub final_score: f64,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub agreement_score: f64,
    pub agents_in_consensus: usize,
    pub agents_total: usize,
    pub requires_human_review: bool,
    /// Method-specific numbers and, for synthesis, the model's rationale.
    pub details: Value,
}

impl ConsensusResult {
    fn neutral(method: ConsensusMethod) -> Self {
        Self {
            method,
            final_score: 0.0,
            recommendation: Recommendation::Pass,
            confidence: 0.0,
            agreement_score: 0.0,
            agents_in_consensus: 0,
            agents_total: 0,
            requires_human_review: true,
            details: json!({}),
        }
    }
}

/// The decision plus the synthesis vote, when one was made, so its cost can be counted.
#[derive(Debug, Clone)]
pub struct ConsensusOutcome {
    pub result: ConsensusResult,
    pub synthesis: Option<EvaluationResult>,
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

pub struct ConsensusEngine {
    mechanism: ConsensusMechanism,
    synthesizer: EvaluationAgent,
}

impl ConsensusEngine {
    /// `synthesizer` must run `synthesis::ConsensusSynthesisRole`.
    pub fn new(mechanism: ConsensusMechanism, synthesizer: EvaluationAgent) -> Self {
        Self {
            mechanism,
            synthesizer,
        }
    }

    pub fn mechanism(&self) -> ConsensusMechanism {
        self.mechanism
    }

    pub fn synthesizer(&self) -> &EvaluationAgent {
        &self.synthesizer
    }

    pub async fn aggregate(
        &self,
        votes: &BTreeMap<AgentRole, EvaluationResult>,
        request: &EvaluationRequest,
    ) -> ConsensusOutcome {
        if votes.is_empty() {
            warn!("No votes to aggregate, returning neutral consensus");
            return ConsensusOutcome {
                result: ConsensusResult::neutral(self.mechanism.into()),
                synthesis: None,
            };
        }

        let scores: Vec<f64> = votes.values().map(|v| v.score).collect();
        let stats = VoteStats::of(&scores);

        // Zero-confidence votes carry no weight, so they can't signal disagreement either.
        let informative: Vec<f64> = votes
            .values()
            .filter(|v| v.confidence() > 0.0)
            .map(|v| v.score)
            .collect();
        let spread = VoteStats::of(&informative);

        if spread.is_disagreement(informative.len()) {
            info!(
                max_deviation = spread.max_deviation,
                variance = spread.variance,
                "Agents disagree, delegating consensus to LLM synthesis"
            );
            return self.synthesize(votes, request, stats).await;
        }

        info!(mechanism = %self.mechanism, agents = votes.len(), "Closed-form consensus");
        ConsensusOutcome {
            result: self.closed_form(votes, stats),
            synthesis: None,
        }
    }

    fn closed_form(
        &self,
        votes: &BTreeMap<AgentRole, EvaluationResult>,
        stats: VoteStats,
    ) -> ConsensusResult {
        match self.mechanism {
            ConsensusMechanism::WeightedAverage => weighted_average(votes, stats),
            ConsensusMechanism::Majority => majority(votes, stats),
        }
    }

    async fn synthesize(
        &self,
        votes: &BTreeMap<AgentRole, EvaluationResult>,
        request: &EvaluationRequest,
        stats: VoteStats,
    ) -> ConsensusOutcome {
        let synthesis_request = EvaluationRequest {
            candidate: request.candidate.clone(),
            job: request.job.clone(),
            other_agent_votes: votes.clone(),
            stakes: StakesFlags {
                decision_type: Some(DecisionType::FinalHiringRecommendation),
                agent_consensus_failed: true,
                ..request.stakes.clone()
            },
        };

        match self.synthesizer.evaluate(&synthesis_request).await {
            Ok(vote) => ConsensusOutcome {
                result: from_synthesis(&vote, stats, votes.len()),
                synthesis: Some(vote),
            },
            Err(e) => {
                warn!(
                    mechanism = %self.mechanism,
                    "Consensus synthesis failed, falling back to closed form: {e}"
                );
                let mut result = self.closed_form(votes, stats);
                result.requires_human_review = true;
                if let Some(details) = result.details.as_object_mut() {
                    details.insert("synthesis_error".to_string(), json!(e.to_string()));
                }
                ConsensusOutcome {
                    result,
                    synthesis: None,
                }
            }
        }
    }
}

fn weighted_average(
    votes: &BTreeMap<AgentRole, EvaluationResult>,
    stats: VoteStats,
) -> ConsensusResult {
    let total = votes.len();
    let confidence_sum: f64 = votes.values().map(|v| v.confidence()).sum();
    let final_score = weighted_score(votes.values());
    let mean_confidence = confidence_sum / total as f64;

    let mut details = stats.as_details();
    if let Some(map) = details.as_object_mut() {
        map.insert("confidence_sum".to_string(), json!(confidence_sum));
    }

    ConsensusResult {
        method: ConsensusMethod::WeightedAverage,
        final_score,
        recommendation: Recommendation::from_score(final_score),
        confidence: (mean_confidence * stats.agreement_score).clamp(0.0, 1.0),
        agreement_score: stats.agreement_score,
        agents_in_consensus: stats.agents_in_consensus,
        agents_total: total,
        requires_human_review: confidence_sum == 0.0,
        details,
    }
}

fn majority(votes: &BTreeMap<AgentRole, EvaluationResult>, stats: VoteStats) -> ConsensusResult {
    let total = votes.len();
    let yes = votes
        .values()
        .filter(|v| v.score >= MAJORITY_YES_THRESHOLD)
        .count();
    let no = total - yes;
    let hire = yes > no;

    let mut details = stats.as_details();
    if let Some(map) = details.as_object_mut() {
        map.insert("yes_votes".to_string(), json!(yes));
        map.insert("no_votes".to_string(), json!(no));
        map.insert("threshold".to_string(), json!(MAJORITY_YES_THRESHOLD));
    }

    ConsensusResult {
        method: ConsensusMethod::Majority,
        final_score: if hire { 1.0 } else { 0.0 },
        recommendation: if hire {
            Recommendation::Hire
        } else {
            Recommendation::Pass
        },
        confidence: yes.abs_diff(no) as f64 / total as f64,
        agreement_score: stats.agreement_score,
        agents_in_consensus: stats.agents_in_consensus,
        agents_total: total,
        requires_human_review: yes == no,
        details,
    }
}

fn from_synthesis(vote: &EvaluationResult, stats: VoteStats, total: usize) -> ConsensusResult {
    let mut details = stats.as_details();
    let verdict = verdict_of(vote);

    let Some(verdict) = verdict.filter(|_| vote.parse_error.is_none()) else {
        if let Some(map) = details.as_object_mut() {
            map.insert(
                "error".to_string(),
                json!(vote
                    .parse_error
                    .as_deref()
                    .unwrap_or("synthesis verdict missing")),
            );
        }
        return ConsensusResult {
            agreement_score: stats.agreement_score,
            agents_in_consensus: stats.agents_in_consensus,
            agents_total: total,
            details,
            ..ConsensusResult::neutral(ConsensusMethod::LlmSynthesis)
        };
    };

    let requires_human_review = verdict.requires_human_review
        || vote.requires_review()
        || verdict.risk_assessment.level == Level::High;

    if let Some(map) = details.as_object_mut() {
        map.insert("reasoning".to_string(), json!(vote.reasoning));
        map.insert("risk_assessment".to_string(), json!(verdict.risk_assessment));
        map.insert("key_disagreements".to_string(), json!(verdict.key_disagreements));
        map.insert("model_used".to_string(), json!(vote.model_used));
    }

    ConsensusResult {
        method: ConsensusMethod::LlmSynthesis,
        final_score: vote.score,
        recommendation: verdict.recommendation,
        confidence: vote.confidence(),
        agreement_score: stats.agreement_score,
        agents_in_consensus: stats.agents_in_consensus,
        agents_total: total,
        requires_human_review,
        details,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::agents::base::AgentSettings;
    use crate::agents::tiers::PREMIUM_MODEL;
    use crate::consensus::synthesis::{ConsensusSynthesisRole, SYNTHESIS_SYSTEM};
    use crate::llm_client::testing::{completion, ScriptedProvider};
    use crate::llm_client::ProviderError;

    const VERDICT: &str = r#"{
        "final_score": 0.62,
        "recommendation": "maybe",
        "confidence": 0.7,
        "risk_assessment": {"level": "medium", "factors": ["profile sources disagree"]},
        "key_disagreements": ["GitHub activity vs resume claims"],
        "requires_human_review": false,
        "reasoning": "Resume is strong but code evidence is thin"
    }"#;

    fn engine(mechanism: ConsensusMechanism, provider: Arc<ScriptedProvider>) -> ConsensusEngine {
        ConsensusEngine::new(
            mechanism,
            EvaluationAgent::new(
                Box::new(ConsensusSynthesisRole),
                provider,
                AgentSettings::default(),
            ),
        )
    }

    fn votes(entries: &[(AgentRole, f64, f64)]) -> BTreeMap<AgentRole, EvaluationResult> {
        entries
            .iter()
            .map(|&(role, score, confidence)| {
                (role, EvaluationResult::stub(role, score, confidence))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_weighted_average_of_two_confident_votes() {
        let provider = ScriptedProvider::fixed(VERDICT, 1, 1);
        let engine = engine(ConsensusMechanism::WeightedAverage, provider.clone());
        let votes = votes(&[
            (AgentRole::LinkedinSourcing, 0.9, 1.0),
            (AgentRole::ResumeAnalysis, 0.5, 1.0),
        ]);

        let outcome = engine.aggregate(&votes, &EvaluationRequest::default()).await;

        assert!((outcome.result.final_score - 0.7).abs() < 1e-9);
        assert_eq!(outcome.result.recommendation, Recommendation::Hire);
        assert_eq!(outcome.result.method, ConsensusMethod::WeightedAverage);
        assert_eq!(outcome.result.agents_total, 2);
        assert!(outcome.synthesis.is_none());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unanimous_seventy_is_hire_despite_float_error() {
        let provider = ScriptedProvider::fixed(VERDICT, 1, 1);
        let engine = engine(ConsensusMechanism::WeightedAverage, provider);
        let votes = votes(&[
            (AgentRole::LinkedinSourcing, 0.7, 0.7),
            (AgentRole::ResumeAnalysis, 0.7, 0.8),
        ]);

        let outcome = engine.aggregate(&votes, &EvaluationRequest::default()).await;

        // The reported score is left unrounded.
        assert!((outcome.result.final_score - 0.7).abs() < 1e-9);
        assert_eq!(outcome.result.recommendation, Recommendation::Hire);
    }

    #[tokio::test]
    async fn test_zero_confidence_sum_scores_zero() {
        let provider = ScriptedProvider::fixed(VERDICT, 1, 1);
        let engine = engine(ConsensusMechanism::WeightedAverage, provider);
        let votes = votes(&[
            (AgentRole::LinkedinSourcing, 0.8, 0.0),
            (AgentRole::GithubSourcing, 0.6, 0.0),
        ]);

        let result = engine.aggregate(&votes, &EvaluationRequest::default()).await.result;

        assert_eq!(result.final_score, 0.0);
        assert_eq!(result.recommendation, Recommendation::Pass);
        assert!(result.requires_human_review);
    }

    #[tokio::test]
    async fn test_strong_disagreement_routes_to_synthesis() {
        let provider = ScriptedProvider::fixed(VERDICT, 2000, 400);
        let engine = engine(ConsensusMechanism::WeightedAverage, provider.clone());
        let votes = votes(&[
            (AgentRole::ResumeAnalysis, 0.95, 0.9),
            (AgentRole::GithubSourcing, 0.10, 0.8),
        ]);

        let outcome = engine.aggregate(&votes, &EvaluationRequest::default()).await;

        assert_eq!(outcome.result.method, ConsensusMethod::LlmSynthesis);
        assert_eq!(outcome.result.recommendation, Recommendation::Maybe);
        assert!((outcome.result.final_score - 0.62).abs() < 1e-12);
        assert_eq!(outcome.result.details["key_disagreements"][0], "GitHub activity vs resume claims");
        assert_eq!(provider.models_for(SYNTHESIS_SYSTEM), vec![PREMIUM_MODEL.to_string()]);

        let synthesis = outcome.synthesis.unwrap();
        assert_eq!(synthesis.role, AgentRole::ConsensusEngine);
        assert!(synthesis.cost_usd > 0.0);
        assert_eq!(engine.synthesizer().metrics().total_requests, 1);
    }

    #[tokio::test]
    async fn test_majority_path_also_delegates_on_disagreement() {
        let provider = ScriptedProvider::fixed(VERDICT, 1, 1);
        let engine = engine(ConsensusMechanism::Majority, provider.clone());
        let votes = votes(&[
            (AgentRole::ResumeAnalysis, 0.95, 0.9),
            (AgentRole::GithubSourcing, 0.10, 0.8),
        ]);

        let result = engine.aggregate(&votes, &EvaluationRequest::default()).await.result;

        assert_eq!(result.method, ConsensusMethod::LlmSynthesis);
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_synthesis_gives_fallback_consensus() {
        let provider = ScriptedProvider::fixed("The candidate seems fine overall.", 100, 20);
        let engine = engine(ConsensusMechanism::WeightedAverage, provider);
        let votes = votes(&[
            (AgentRole::ResumeAnalysis, 0.95, 0.9),
            (AgentRole::GithubSourcing, 0.10, 0.8),
        ]);

        let outcome = engine.aggregate(&votes, &EvaluationRequest::default()).await;

        assert_eq!(outcome.result.method, ConsensusMethod::LlmSynthesis);
        assert_eq!(outcome.result.final_score, 0.0);
        assert_eq!(outcome.result.recommendation, Recommendation::Pass);
        assert_eq!(outcome.result.confidence, 0.0);
        assert!(outcome.result.requires_human_review);
        assert!(outcome.result.details["error"].is_string());
        assert!(outcome.synthesis.unwrap().parse_error.is_some());
    }

    #[tokio::test]
    async fn test_out_of_range_synthesis_is_a_fallback() {
        let provider = ScriptedProvider::fixed(
            r#"{"final_score": 1.4, "recommendation": "hire", "confidence": 0.9,
                "risk_assessment": {"level": "low", "factors": []}}"#,
            10,
            10,
        );
        let engine = engine(ConsensusMechanism::WeightedAverage, provider);
        let votes = votes(&[
            (AgentRole::ResumeAnalysis, 0.95, 0.9),
            (AgentRole::GithubSourcing, 0.10, 0.8),
        ]);

        let result = engine.aggregate(&votes, &EvaluationRequest::default()).await.result;

        assert_eq!(result.confidence, 0.0);
        assert!(result.requires_human_review);
    }

    #[tokio::test]
    async fn test_synthesis_provider_error_falls_back_to_closed_form() {
        let provider = ScriptedProvider::new(|_| Err(ProviderError::EmptyContent));
        let engine = engine(ConsensusMechanism::WeightedAverage, provider);
        let votes = votes(&[
            (AgentRole::ResumeAnalysis, 0.95, 0.5),
            (AgentRole::GithubSourcing, 0.10, 0.5),
        ]);

        let outcome = engine.aggregate(&votes, &EvaluationRequest::default()).await;

        assert_eq!(outcome.result.method, ConsensusMethod::WeightedAverage);
        assert!((outcome.result.final_score - 0.525).abs() < 1e-9);
        assert!(outcome.result.requires_human_review);
        assert!(outcome.result.details["synthesis_error"].is_string());
        assert!(outcome.synthesis.is_none());
    }

    #[tokio::test]
    async fn test_fallback_vote_does_not_shift_overall_score() {
        let provider = ScriptedProvider::fixed(VERDICT, 1, 1);
        let engine = engine(ConsensusMechanism::WeightedAverage, provider.clone());
        let clean = votes(&[
            (AgentRole::LinkedinSourcing, 0.8, 0.9),
            (AgentRole::ResumeAnalysis, 0.7, 0.8),
        ]);
        let mut with_fallback = clean.clone();
        with_fallback.insert(
            AgentRole::GithubSourcing,
            EvaluationResult::stub(AgentRole::GithubSourcing, 0.0, 0.0),
        );

        let a = engine.aggregate(&clean, &EvaluationRequest::default()).await.result;
        let b = engine
            .aggregate(&with_fallback, &EvaluationRequest::default())
            .await
            .result;

        assert!((a.final_score - b.final_score).abs() < 1e-12);
        assert_eq!(a.recommendation, b.recommendation);
        assert_eq!(b.method, ConsensusMethod::WeightedAverage);
        assert_eq!(b.agents_total, 3);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_majority_vote() {
        let provider = ScriptedProvider::fixed(VERDICT, 1, 1);
        let engine = engine(ConsensusMechanism::Majority, provider);
        let votes = votes(&[
            (AgentRole::LinkedinSourcing, 0.8, 0.9),
            (AgentRole::GithubSourcing, 0.75, 0.8),
            (AgentRole::ResumeAnalysis, 0.3, 0.9),
        ]);

        let result = engine.aggregate(&votes, &EvaluationRequest::default()).await.result;

        assert_eq!(result.method, ConsensusMethod::Majority);
        assert_eq!(result.recommendation, Recommendation::Hire);
        assert_eq!(result.final_score, 1.0);
        assert!((result.confidence - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.details["yes_votes"], 2);
        assert!(!result.requires_human_review);
    }

    #[tokio::test]
    async fn test_no_votes_is_neutral() {
        let provider = ScriptedProvider::fixed(VERDICT, 1, 1);
        let engine = engine(ConsensusMechanism::WeightedAverage, provider.clone());

        let result = engine
            .aggregate(&BTreeMap::new(), &EvaluationRequest::default())
            .await
            .result;

        assert_eq!(result.final_score, 0.0);
        assert_eq!(result.recommendation, Recommendation::Pass);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.agents_total, 0);
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn test_single_vote_never_disagrees() {
        let stats = VoteStats::of(&[0.1]);
        assert!(!stats.is_disagreement(1));
    }

    #[test]
    fn test_stats() {
        let stats = VoteStats::of(&[0.9, 0.5]);
        assert!((stats.avg_score - 0.7).abs() < 1e-12);
        assert!((stats.variance - 0.04).abs() < 1e-12);
        assert!((stats.agreement_score - 0.96).abs() < 1e-12);
        assert!((stats.max_deviation - 0.2).abs() < 1e-12);
        assert_eq!(stats.agents_in_consensus, 0);
        assert!(!stats.is_disagreement(2));
    }

    #[test]
    fn test_recommendation_thresholds() {
        assert_eq!(Recommendation::from_score(0.9), Recommendation::StrongHire);
        assert_eq!(Recommendation::from_score(0.85), Recommendation::StrongHire);
        assert_eq!(Recommendation::from_score(0.75), Recommendation::Hire);
        assert_eq!(Recommendation::from_score(0.6), Recommendation::Maybe);
        assert_eq!(Recommendation::from_score(0.45), Recommendation::ProceedWithCaution);
        assert_eq!(Recommendation::from_score(0.2), Recommendation::Pass);
        // Just under a cut-off in binary, on it in decimal.
        assert_eq!(Recommendation::from_score(0.6999999999999998), Recommendation::Hire);
        assert_eq!(Recommendation::from_score(0.39999999999999997), Recommendation::ProceedWithCaution);
        assert_eq!(Recommendation::from_score(0.8499999999999999), Recommendation::StrongHire);
        // Genuinely below a cut-off still drops a tier.
        assert_eq!(Recommendation::from_score(0.6998), Recommendation::Maybe);
        assert!(Recommendation::Hire > Recommendation::Maybe);
    }

    #[test]
    fn test_mechanism_from_str() {
        assert_eq!(
            "weighted_average".parse::<ConsensusMechanism>().unwrap(),
            ConsensusMechanism::WeightedAverage
        );
        assert_eq!(
            " Majority ".parse::<ConsensusMechanism>().unwrap(),
            ConsensusMechanism::Majority
        );
        assert!("unanimous".parse::<ConsensusMechanism>().is_err());
    }
}
