// Shared prompt fragments. Each agent role keeps its own system prompt and
// request template next to its schema; this file holds the cross-cutting pieces.

/// Quality-signal fields every agent schema carries. The escalation policy reads them.
pub const QUALITY_SIGNALS_SCHEMA: &str = r#"  "confidence": 0.85,
  "reasoning": "2-4 sentences grounded in the supplied data",
  "uncertainty_flags": [],
  "requires_review": false,
  "edge_case_detected": false,
  "contradictions_found": false,
  "data_completeness": 0.9,
  "concerns": []"#;

/// Rules for filling in the quality-signal fields honestly.
pub const QUALITY_SIGNALS_RULES: &str = "\
    QUALITY SIGNALS: \
    - confidence is 0.0-1.0 and reflects how well the data supports your score. \
    - List anything you could not verify in uncertainty_flags. \
    - Set requires_review=true when a human should look before this vote is trusted. \
    - Set edge_case_detected=true for unusual profiles (career changers, long gaps, non-traditional paths). \
    - Set contradictions_found=true when sources disagree with each other. \
    - data_completeness is 0.0-1.0: the share of the information you needed that was present.";

/// Fairness fragment shared by every role that scores a person.
pub const FAIRNESS_INSTRUCTION: &str = "\
    CRITICAL: Evaluate only job-relevant skills, experience and evidence. \
    NEVER consider or infer age, gender, race, ethnicity, religion, disability, \
    national origin or any other protected characteristic.";
