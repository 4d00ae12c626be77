//! Cost accounting: token counts × tier rates, and the per-agent running totals.

use std::ops::{Add, AddAssign};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::agents::tiers::{AgentRole, ModelTier};

/// USD cost of one call. Piecewise-linear in tokens; no rounding here.
pub fn cost(input_tokens: u64, output_tokens: u64, tier: ModelTier) -> f64 {
    (input_tokens as f64 / 1_000_000.0) * tier.input_rate()
        + (output_tokens as f64 / 1_000_000.0) * tier.output_rate()
}

/// Rounds for display. Only used where values leave the service.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

impl TokenUsage {
    pub fn new(input: u64, output: u64) -> Self {
        Self { input, output }
    }

    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            input: self.input + rhs.input,
            output: self.output + rhs.output,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        self.input += rhs.input;
        self.output += rhs.output;
    }
}

#[derive(Debug, Default)]
struct Counters {
    total_requests: u64,
    escalations: u64,
    tokens: TokenUsage,
    total_cost: f64,
}

/// Running counters owned by one agent instance.
///
/// Agents are shared across concurrent requests through the orchestrator, so every
/// update goes through one mutex: each call lands as a single increment-and-add.
#[derive(Debug, Default)]
pub struct AgentMetrics {
    counters: Mutex<Counters>,
}

impl AgentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed provider call.
    pub fn record_call(&self, usage: TokenUsage, cost_usd: f64) {
        let mut counters = self.lock();
        counters.total_requests += 1;
        counters.tokens += usage;
        counters.total_cost += cost_usd;
    }

    pub fn record_escalation(&self) {
        self.lock().escalations += 1;
    }

    pub fn reset(&self) {
        *self.lock() = Counters::default();
    }

    pub fn snapshot(&self, role: AgentRole) -> AgentMetricsSnapshot {
        let counters = self.lock();
        let requests = counters.total_requests;
        AgentMetricsSnapshot {
            agent: role,
            total_requests: requests,
            escalations: counters.escalations,
            escalation_rate: ratio(counters.escalations as f64, requests),
            total_tokens: counters.tokens,
            total_cost: counters.total_cost,
            avg_cost_per_request: ratio(counters.total_cost, requests),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        // A poisoned guard still holds consistent counters: every update is a plain add.
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn ratio(numerator: f64, requests: u64) -> f64 {
    if requests == 0 {
        0.0
    } else {
        numerator / requests as f64
    }
}

/// Read-only view of an agent's counters for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentMetricsSnapshot {
    pub agent: AgentRole,
    pub total_requests: u64,
    pub escalations: u64,
    pub escalation_rate: f64,
    pub total_tokens: TokenUsage,
    pub total_cost: f64,
    pub avg_cost_per_request: f64,
}
