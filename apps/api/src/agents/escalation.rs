//! Escalation policy.
//!
//! Three independent rule sets live here and must stay independent:
//! - `should_escalate`: per-agent self-escalation. Any trigger redoes the call on Premium.
//! - `EscalationEngine`: severity-weighted policy review run by the orchestrator over
//!   finished votes. Only high-severity or paired medium-severity triggers escalate.
//! - `is_high_stakes`: pre-call override driven by request semantics, not response quality.

use serde::Serialize;

use crate::agents::models::{DecisionType, QualitySignals, StakesFlags};

/// Below this self-reported confidence a fast-tier answer is redone.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Per-agent self-escalation. Logical OR over the quality signals.
pub fn should_escalate(signals: &QualitySignals) -> bool {
    signals.confidence < LOW_CONFIDENCE_THRESHOLD
        || !signals.uncertainty_flags.is_empty()
        || signals.requires_review
        || signals.edge_case_detected
        || signals.contradictions_found
}

/// Pre-call premium override.
pub fn is_high_stakes(stakes: &StakesFlags) -> bool {
    stakes.decision_type == Some(DecisionType::FinalHiringRecommendation)
        || stakes.compliance_review_required
        || stakes.bias_check_critical
        || stakes.legal_implications
        || stakes.customer_escalation
        || stakes.agent_consensus_failed
        || stakes.edge_case_detected
}

// ────────────────────────────────────────────────────────────────────────────
// Severity-weighted policy engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Medium,
    High,
}

pub struct EscalationRule {
    pub name: &'static str,
    pub description: &'static str,
    pub severity: RuleSeverity,
    check: fn(&QualitySignals) -> bool,
}

impl EscalationRule {
    pub fn triggers(&self, signals: &QualitySignals) -> bool {
        (self.check)(signals)
    }
}

/// Policy thresholds. Deliberately separate from `LOW_CONFIDENCE_THRESHOLD`.
const POLICY_LOW_CONFIDENCE: f64 = 0.6;
const POLICY_MIN_DATA_COMPLETENESS: f64 = 0.5;
const POLICY_MAX_CONCERNS: usize = 3;
const POLICY_MEDIUM_TRIGGERS_TO_ESCALATE: usize = 2;

pub static RULES: [EscalationRule; 7] = [
    EscalationRule {
        name: "low_confidence",
        description: "Agent confidence below threshold",
        severity: RuleSeverity::High,
        check: low_confidence,
    },
    EscalationRule {
        name: "uncertainty_flags",
        description: "Agent flagged uncertain findings",
        severity: RuleSeverity::Medium,
        check: has_uncertainty_flags,
    },
    EscalationRule {
        name: "requires_review",
        description: "Agent explicitly requests human/premium review",
        severity: RuleSeverity::High,
        check: requests_review,
    },
    EscalationRule {
        name: "edge_case",
        description: "Unusual or edge case scenario",
        severity: RuleSeverity::High,
        check: is_edge_case,
    },
    EscalationRule {
        name: "contradictions",
        description: "Contradictory information detected",
        severity: RuleSeverity::Medium,
        check: has_contradictions,
    },
    EscalationRule {
        name: "incomplete_data",
        description: "Insufficient data for reliable analysis",
        severity: RuleSeverity::Medium,
        check: has_incomplete_data,
    },
    EscalationRule {
        name: "multiple_red_flags",
        description: "Multiple concerns requiring careful review",
        severity: RuleSeverity::High,
        check: has_many_concerns,
    },
];

fn low_confidence(s: &QualitySignals) -> bool {
    s.confidence < POLICY_LOW_CONFIDENCE
}

fn has_uncertainty_flags(s: &QualitySignals) -> bool {
    !s.uncertainty_flags.is_empty()
}

fn requests_review(s: &QualitySignals) -> bool {
    s.requires_review
}

fn is_edge_case(s: &QualitySignals) -> bool {
    s.edge_case_detected
}

fn has_contradictions(s: &QualitySignals) -> bool {
    s.contradictions_found
}

fn has_incomplete_data(s: &QualitySignals) -> bool {
    s.data_completeness.unwrap_or(1.0) < POLICY_MIN_DATA_COMPLETENESS
}

fn has_many_concerns(s: &QualitySignals) -> bool {
    s.concerns.len() > POLICY_MAX_CONCERNS
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDecision {
    pub escalate: bool,
    pub triggered: Vec<&'static str>,
}

pub struct EscalationEngine;

impl EscalationEngine {
    pub fn evaluate(signals: &QualitySignals) -> PolicyDecision {
        let fired: Vec<&EscalationRule> = RULES.iter().filter(|r| r.triggers(signals)).collect();

        let any_high = fired.iter().any(|r| r.severity == RuleSeverity::High);
        let medium_count = fired
            .iter()
            .filter(|r| r.severity == RuleSeverity::Medium)
            .count();

        PolicyDecision {
            escalate: any_high || medium_count >= POLICY_MEDIUM_TRIGGERS_TO_ESCALATE,
            triggered: fired.iter().map(|r| r.name).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confident() -> QualitySignals {
        QualitySignals {
            confidence: 0.9,
            data_completeness: Some(0.9),
            ..QualitySignals::default()
        }
    }

    // ── per-agent self-escalation ───────────────────────────────────────────

    #[test]
    fn test_clean_confident_response_does_not_escalate() {
        assert!(!should_escalate(&confident()));
    }

    #[test]
    fn test_low_confidence_alone_escalates() {
        let s = QualitySignals {
            confidence: 0.59,
            ..confident()
        };
        assert!(should_escalate(&s));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let s = QualitySignals {
            confidence: LOW_CONFIDENCE_THRESHOLD,
            ..confident()
        };
        assert!(!should_escalate(&s));
    }

    #[test]
    fn test_uncertainty_flags_alone_escalate() {
        let s = QualitySignals {
            uncertainty_flags: vec!["employment dates unverified".to_string()],
            ..confident()
        };
        assert!(should_escalate(&s));
    }

    #[test]
    fn test_requires_review_alone_escalates() {
        let s = QualitySignals {
            requires_review: true,
            ..confident()
        };
        assert!(should_escalate(&s));
    }

    #[test]
    fn test_edge_case_alone_escalates() {
        let s = QualitySignals {
            edge_case_detected: true,
            ..confident()
        };
        assert!(should_escalate(&s));
    }

    #[test]
    fn test_contradictions_alone_escalate() {
        let s = QualitySignals {
            contradictions_found: true,
            ..confident()
        };
        assert!(should_escalate(&s));
    }

    #[test]
    fn test_combined_triggers_escalate() {
        let s = QualitySignals {
            confidence: 0.3,
            uncertainty_flags: vec!["x".to_string()],
            requires_review: true,
            edge_case_detected: true,
            contradictions_found: true,
            ..confident()
        };
        assert!(should_escalate(&s));
    }

    #[test]
    fn test_self_escalation_ignores_policy_only_signals() {
        // data_completeness and concerns belong to the policy engine only
        let s = QualitySignals {
            data_completeness: Some(0.1),
            concerns: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            ..confident()
        };
        assert!(!should_escalate(&s));
    }

    // ── severity engine ─────────────────────────────────────────────────────

    #[test]
    fn test_engine_single_medium_trigger_does_not_escalate() {
        let s = QualitySignals {
            contradictions_found: true,
            ..confident()
        };
        let decision = EscalationEngine::evaluate(&s);
        assert!(!decision.escalate);
        assert_eq!(decision.triggered, vec!["contradictions"]);
    }

    #[test]
    fn test_engine_two_medium_triggers_escalate() {
        let s = QualitySignals {
            contradictions_found: true,
            data_completeness: Some(0.3),
            ..confident()
        };
        let decision = EscalationEngine::evaluate(&s);
        assert!(decision.escalate);
        assert_eq!(decision.triggered, vec!["contradictions", "incomplete_data"]);
    }

    #[test]
    fn test_engine_single_high_trigger_escalates() {
        for s in [
            QualitySignals {
                confidence: 0.2,
                ..confident()
            },
            QualitySignals {
                requires_review: true,
                ..confident()
            },
            QualitySignals {
                edge_case_detected: true,
                ..confident()
            },
            QualitySignals {
                concerns: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                ..confident()
            },
        ] {
            assert!(EscalationEngine::evaluate(&s).escalate, "{s:?}");
        }
    }

    #[test]
    fn test_engine_three_concerns_is_not_multiple_red_flags() {
        let s = QualitySignals {
            concerns: vec!["a".into(), "b".into(), "c".into()],
            ..confident()
        };
        let decision = EscalationEngine::evaluate(&s);
        assert!(decision.triggered.is_empty());
        assert!(!decision.escalate);
    }

    #[test]
    fn test_engine_missing_completeness_is_treated_as_complete() {
        let s = QualitySignals {
            data_completeness: None,
            ..confident()
        };
        assert!(EscalationEngine::evaluate(&s).triggered.is_empty());
    }

    #[test]
    fn test_uncertainty_flag_escalates_agent_but_not_policy() {
        // The two rule sets disagree here on purpose.
        let s = QualitySignals {
            uncertainty_flags: vec!["unclear".to_string()],
            ..confident()
        };
        assert!(should_escalate(&s));
        assert!(!EscalationEngine::evaluate(&s).escalate);
    }

    // ── high-stakes override ────────────────────────────────────────────────

    #[test]
    fn test_default_stakes_are_not_high() {
        assert!(!is_high_stakes(&StakesFlags::default()));
        let screening = StakesFlags {
            decision_type: Some(DecisionType::Screening),
            ..StakesFlags::default()
        };
        assert!(!is_high_stakes(&screening));
    }

    #[test]
    fn test_each_stakes_flag_forces_premium() {
        let cases = [
            StakesFlags {
                decision_type: Some(DecisionType::FinalHiringRecommendation),
                ..StakesFlags::default()
            },
            StakesFlags {
                compliance_review_required: true,
                ..StakesFlags::default()
            },
            StakesFlags {
                bias_check_critical: true,
                ..StakesFlags::default()
            },
            StakesFlags {
                legal_implications: true,
                ..StakesFlags::default()
            },
            StakesFlags {
                customer_escalation: true,
                ..StakesFlags::default()
            },
            StakesFlags {
                agent_consensus_failed: true,
                ..StakesFlags::default()
            },
            StakesFlags {
                edge_case_detected: true,
                ..StakesFlags::default()
            },
        ];
        for stakes in cases {
            assert!(is_high_stakes(&stakes), "{stakes:?}");
        }
    }
}
