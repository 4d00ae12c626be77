//! Swarm orchestrator: runs one candidate through every agent and the consensus engine.
//!
//! Sequencing per request:
//! 1. LinkedIn, GitHub, resume and predictive agents run concurrently (`join_all`).
//!    A provider failure drops that agent's vote; the rest carry on.
//! 2. Bias detection reviews whatever votes came back, forced to premium.
//! 3. The consensus engine folds every vote into one decision.
//! 4. Usage, policy reviews and timing are gathered into the report.
//!
//! Agent instances live as long as the orchestrator and are shared by concurrent
//! requests. Their counters and the swarm counters are the only shared mutable state.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use futures::future::join_all;
use tokio::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use crate::agents::base::{AgentSettings, EvaluationAgent, RoleBehavior};
use crate::agents::cost::AgentMetricsSnapshot;
use crate::agents::escalation::EscalationEngine;
use crate::agents::models::{EvaluationRequest, EvaluationResult, StakesFlags};
use crate::agents::roles::bias::{bias_flags_of, BiasFlag};
use crate::agents::roles::{
    BiasDetectionRole, GithubSourcingRole, LinkedinSourcingRole, Level, PredictiveAnalyticsRole,
    ResumeAnalysisRole,
};
use crate::agents::tiers::AgentRole;
use crate::consensus::synthesis::ConsensusSynthesisRole;
use crate::consensus::{ConsensusEngine, ConsensusMechanism};
use crate::evaluation::report::{
    AgentStatus, EvaluationMetrics, EvaluationReport, PolicyReview, SwarmStats, VoteSummary,
};
use crate::llm_client::{LlmProvider, ProviderError};

pub struct Orchestrator {
    linkedin: EvaluationAgent,
    github: EvaluationAgent,
    resume: EvaluationAgent,
    predictive: EvaluationAgent,
    bias: EvaluationAgent,
    consensus: ConsensusEngine,
    swarm: Mutex<SwarmCounters>,
}

#[derive(Debug, Default)]
struct SwarmCounters {
    evaluations: u64,
    confidence_sum: f64,
    bias_flags: u64,
    human_reviews: u64,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        settings: AgentSettings,
        mechanism: ConsensusMechanism,
    ) -> Self {
        let agent = |behavior: Box<dyn RoleBehavior>| {
            EvaluationAgent::new(behavior, provider.clone(), settings)
        };

        Self {
            linkedin: agent(Box::new(LinkedinSourcingRole)),
            github: agent(Box::new(GithubSourcingRole)),
            resume: agent(Box::new(ResumeAnalysisRole)),
            predictive: agent(Box::new(PredictiveAnalyticsRole)),
            bias: agent(Box::new(BiasDetectionRole)),
            consensus: ConsensusEngine::new(mechanism, agent(Box::new(ConsensusSynthesisRole))),
            swarm: Mutex::new(SwarmCounters::default()),
        }
    }

    /// Every agent, in role order. The consensus engine's synthesizer is last.
    fn agents(&self) -> [&EvaluationAgent; 6] {
        [
            &self.linkedin,
            &self.github,
            &self.resume,
            &self.bias,
            &self.predictive,
            self.consensus.synthesizer(),
        ]
    }

    pub fn consensus_mechanism(&self) -> ConsensusMechanism {
        self.consensus.mechanism()
    }

    pub async fn evaluate_candidate(&self, request: EvaluationRequest) -> EvaluationReport {
        let started = Instant::now();
        let evaluation_id = Uuid::new_v4();
        let candidate_id = request.candidate.candidate_id;
        info!(%evaluation_id, candidate_id, "Starting swarm evaluation");

        // Step 1: independent agents, concurrently.
        let parallel = [&self.linkedin, &self.github, &self.resume, &self.predictive];
        let shared = &request;
        let outcomes = join_all(
            parallel
                .into_iter()
                .map(|agent| async move { (agent.role(), agent.evaluate(shared).await) }),
        )
        .await;

        let mut votes = BTreeMap::new();
        let mut failed_agents = BTreeMap::new();
        for (role, outcome) in outcomes {
            collect_vote(role, outcome, &mut votes, &mut failed_agents);
        }

        // Step 2: compliance review over a complete snapshot of step 1.
        let compliance_request = EvaluationRequest {
            other_agent_votes: votes.clone(),
            stakes: StakesFlags {
                compliance_review_required: true,
                ..request.stakes.clone()
            },
            ..request.clone()
        };
        let compliance = self.bias.evaluate(&compliance_request).await;
        collect_vote(
            AgentRole::BiasDetection,
            compliance,
            &mut votes,
            &mut failed_agents,
        );

        // Step 3: consensus.
        let outcome = self.consensus.aggregate(&votes, &request).await;

        // Step 4: reporting.
        let metrics = EvaluationMetrics::collect(votes.values().chain(outcome.synthesis.as_ref()));
        let bias_flags: Vec<BiasFlag> = votes
            .get(&AgentRole::BiasDetection)
            .map(|vote| bias_flags_of(&vote.metadata))
            .unwrap_or_default();
        let policy_reviews = policy_reviews(&votes);

        let requires_human_review = outcome.result.requires_human_review
            || !failed_agents.is_empty()
            || policy_reviews.iter().any(|r| r.escalate)
            || bias_flags.iter().any(|f| f.severity == Level::High);

        {
            let mut swarm = self.swarm();
            swarm.evaluations += 1;
            swarm.confidence_sum += outcome.result.confidence;
            swarm.bias_flags += bias_flags.len() as u64;
            swarm.human_reviews += u64::from(requires_human_review);
        }

        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            %evaluation_id,
            candidate_id,
            recommendation = ?outcome.result.recommendation,
            method = ?outcome.result.method,
            votes = votes.len(),
            failed = failed_agents.len(),
            total_cost = metrics.total_cost,
            processing_time_ms,
            "Swarm evaluation complete"
        );

        EvaluationReport {
            evaluation_id,
            candidate_id,
            job_opening_id: request.job.job_opening_id,
            agent_votes: votes
                .iter()
                .map(|(role, vote)| (*role, VoteSummary::from(vote)))
                .collect(),
            failed_agents,
            overall_confidence: outcome.result.confidence,
            consensus: outcome.result,
            bias_flags,
            policy_reviews,
            requires_human_review,
            evaluated_at: Utc::now(),
            processing_time_ms,
            metrics,
        }
    }

    /// Read-only snapshot of every agent's counters.
    pub fn agent_metrics(&self) -> Vec<AgentMetricsSnapshot> {
        self.agents().iter().map(|agent| agent.metrics()).collect()
    }

    pub fn agent_status(&self) -> Vec<AgentStatus> {
        self.agents()
            .iter()
            .map(|agent| AgentStatus {
                agent: agent.role(),
                name: agent.role().display_name(),
                default_tier: agent.default_tier(),
                model: agent.default_tier().model_id(),
                status: "ready",
                metrics: agent.metrics(),
            })
            .collect()
    }

    pub fn swarm_stats(&self) -> SwarmStats {
        let swarm = self.swarm();
        SwarmStats {
            total_evaluations: swarm.evaluations,
            average_confidence: if swarm.evaluations == 0 {
                0.0
            } else {
                swarm.confidence_sum / swarm.evaluations as f64
            },
            bias_flags_detected: swarm.bias_flags,
            human_reviews_requested: swarm.human_reviews,
        }
    }

    pub fn reset_metrics(&self) {
        for agent in self.agents() {
            agent.reset_metrics();
        }
        *self.swarm() = SwarmCounters::default();
        info!("Agent metrics reset");
    }

    fn swarm(&self) -> MutexGuard<'_, SwarmCounters> {
        self.swarm
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn collect_vote(
    role: AgentRole,
    outcome: Result<EvaluationResult, ProviderError>,
    votes: &mut BTreeMap<AgentRole, EvaluationResult>,
    failed_agents: &mut BTreeMap<AgentRole, String>,
) {
    match outcome {
        Ok(vote) => {
            votes.insert(role, vote);
        }
        Err(e) => {
            error!(agent = %role, "Agent failed, continuing without its vote: {e}");
            failed_agents.insert(role, e.to_string());
        }
    }
}

fn policy_reviews(votes: &BTreeMap<AgentRole, EvaluationResult>) -> Vec<PolicyReview> {
    votes
        .values()
        .filter_map(|vote| {
            let decision = EscalationEngine::evaluate(&vote.signals);
            (!decision.triggered.is_empty()).then(|| PolicyReview {
                agent: vote.role,
                escalate: decision.escalate,
                triggered: decision.triggered,
            })
        })
        .collect()
}
