//! Model tier registry: which Claude model each agent role runs on by default.
//!
//! Fast (Haiku 4.5) carries the high-volume sourcing work; Premium (Sonnet 4.5) is
//! reserved for roles with legal or business stakes. Model IDs are hardcoded to
//! prevent drift.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const FAST_MODEL: &str = "claude-haiku-4-5-20251022";
pub const PREMIUM_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Cost/capability class of an LLM call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Fast,
    Premium,
}

impl ModelTier {
    pub fn model_id(self) -> &'static str {
        match self {
            ModelTier::Fast => FAST_MODEL,
            ModelTier::Premium => PREMIUM_MODEL,
        }
    }

    /// USD per million input tokens.
    pub fn input_rate(self) -> f64 {
        match self {
            ModelTier::Fast => 1.00,
            ModelTier::Premium => 3.00,
        }
    }

    /// USD per million output tokens.
    pub fn output_rate(self) -> f64 {
        match self {
            ModelTier::Fast => 5.00,
            ModelTier::Premium => 15.00,
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelTier::Fast => write!(f, "fast"),
            ModelTier::Premium => write!(f, "premium"),
        }
    }
}

/// Every agent in the swarm. Used as the registry key and as the vote-map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Professional-network profile source.
    LinkedinSourcing,
    /// Code-hosting profile source.
    GithubSourcing,
    /// Resume document source.
    ResumeAnalysis,
    /// EEOC compliance review over the other agents' votes.
    BiasDetection,
    /// Hiring-outcome forecast.
    PredictiveAnalytics,
    /// LLM-mediated consensus when the numeric aggregators can't be trusted.
    ConsensusEngine,
}

impl AgentRole {
    pub const ALL: [AgentRole; 6] = [
        AgentRole::LinkedinSourcing,
        AgentRole::GithubSourcing,
        AgentRole::ResumeAnalysis,
        AgentRole::BiasDetection,
        AgentRole::PredictiveAnalytics,
        AgentRole::ConsensusEngine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::LinkedinSourcing => "linkedin_sourcing",
            AgentRole::GithubSourcing => "github_sourcing",
            AgentRole::ResumeAnalysis => "resume_analysis",
            AgentRole::BiasDetection => "bias_detection",
            AgentRole::PredictiveAnalytics => "predictive_analytics",
            AgentRole::ConsensusEngine => "consensus_engine",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AgentRole::LinkedinSourcing => "LinkedIn Sourcing Agent",
            AgentRole::GithubSourcing => "GitHub Sourcing Agent",
            AgentRole::ResumeAnalysis => "Resume Analysis Agent",
            AgentRole::BiasDetection => "Bias Detection Agent",
            AgentRole::PredictiveAnalytics => "Predictive Analytics Agent",
            AgentRole::ConsensusEngine => "Consensus Engine",
        }
    }

    pub fn from_name(name: &str) -> Option<AgentRole> {
        let normalized = normalize_agent_name(name);
        AgentRole::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default tier for a role.
pub fn tier_for(role: AgentRole) -> ModelTier {
    match role {
        AgentRole::LinkedinSourcing | AgentRole::GithubSourcing | AgentRole::ResumeAnalysis => {
            ModelTier::Fast
        }
        AgentRole::BiasDetection | AgentRole::PredictiveAnalytics | AgentRole::ConsensusEngine => {
            ModelTier::Premium
        }
    }
}

/// Name-keyed lookup ("Bias Detection", "github_sourcing", ...). Unknown names get Fast.
pub fn tier_for_agent_name(name: &str) -> ModelTier {
    AgentRole::from_name(name)
        .map(tier_for)
        .unwrap_or(ModelTier::Fast)
}

fn normalize_agent_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}
