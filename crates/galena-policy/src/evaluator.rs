//! Request evaluation against a mined rule set.

use std::fmt;
use std::sync::Arc;

use galena_types::{AccessRequest, MinedRule};
use serde::Serialize;
use tracing::trace;

use crate::report::{BatchReport, BatchSummary};

// ============================================================================
// Decision
// ============================================================================

/// The outcome of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Some rule's conditions were all satisfied.
    Grant,
    /// No rule matched. Denial is the default, never an explicit rule.
    Deny,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Grant => "grant",
            Self::Deny => "deny",
        })
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// A decision together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Grant or deny.
    pub decision: Decision,
    /// The first matching rule, rendered; `None` on deny.
    pub matched_rule: Option<String>,
    /// Human-readable explanation of the decision.
    pub justification: String,
}

impl Evaluation {
    /// Returns true if the request was granted.
    pub fn is_granted(&self) -> bool {
        self.decision == Decision::Grant
    }
}

// ============================================================================
// PolicyEvaluator
// ============================================================================

/// Evaluates requests against a frozen snapshot of the rule set.
///
/// Rules are tried in their mined order, most general first, and the first
/// match wins. Because the snapshot is an `Arc`, an evaluator stays
/// consistent even while a newer rule set is being installed.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    rules: Arc<[MinedRule]>,
}

impl PolicyEvaluator {
    /// Creates an evaluator over a rule set snapshot.
    pub fn new(rules: Arc<[MinedRule]>) -> Self {
        Self { rules }
    }

    /// The rules this evaluator consults.
    pub fn rules(&self) -> &[MinedRule] {
        &self.rules
    }

    /// Decides a single request. Requests matching no rule are denied.
    pub fn evaluate(&self, request: &AccessRequest) -> Evaluation {
        for rule in self.rules.iter() {
            if rule.matches(request) {
                trace!(rule = %rule, "request granted");
                let rendered = rule.render();
                return Evaluation {
                    decision: Decision::Grant,
                    justification: format!("matched rule `{rendered}`"),
                    matched_rule: Some(rendered),
                };
            }
        }
        trace!("request denied, no rule matched");
        Evaluation {
            decision: Decision::Deny,
            matched_rule: None,
            justification: "no rule matched; denied by default".to_string(),
        }
    }

    /// Decides a batch of requests, tallying grants and denials.
    pub fn evaluate_batch(&self, requests: &[AccessRequest]) -> BatchReport {
        let evaluations: Vec<Evaluation> =
            requests.iter().map(|request| self.evaluate(request)).collect();
        let granted = evaluations.iter().filter(|e| e.is_granted()).count();
        let summary = BatchSummary::new(evaluations.len(), granted);
        BatchReport {
            evaluations,
            summary,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use galena_types::Pattern;

    use super::*;

    fn evaluator(patterns: &[Pattern]) -> PolicyEvaluator {
        let rules: Vec<MinedRule> = patterns
            .iter()
            .map(|p| MinedRule::new(p.clone(), 3, 4))
            .collect();
        PolicyEvaluator::new(Arc::from(rules))
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let evaluator = evaluator(&[
            Pattern::from([("op", "read")]),
            Pattern::from([("op", "read"), ("role", "ta")]),
        ]);

        let evaluation = evaluator.evaluate(&AccessRequest::from([("op", "read"), ("role", "ta")]));
        assert!(evaluation.is_granted());
        assert_eq!(evaluation.matched_rule.as_deref(), Some("op = read"));
        assert_eq!(evaluation.justification, "matched rule `op = read`");
    }

    #[test]
    fn test_unmatched_request_is_denied() {
        let evaluator = evaluator(&[Pattern::from([("op", "read")])]);

        let evaluation = evaluator.evaluate(&AccessRequest::from([("op", "write")]));
        assert_eq!(evaluation.decision, Decision::Deny);
        assert!(evaluation.matched_rule.is_none());
        assert_eq!(evaluation.justification, "no rule matched; denied by default");
    }

    #[test]
    fn test_extra_request_attributes_are_ignored() {
        let evaluator = evaluator(&[Pattern::from([("op", "read")])]);

        let request = AccessRequest::from([("op", "read"), ("ip", "10.0.0.1")]);
        assert!(evaluator.evaluate(&request).is_granted());
    }

    #[test]
    fn test_missing_attribute_is_not_a_wildcard() {
        let evaluator = evaluator(&[Pattern::from([("op", "read"), ("role", "ta")])]);

        let request = AccessRequest::from([("op", "read")]);
        assert_eq!(evaluator.evaluate(&request).decision, Decision::Deny);
    }

    #[test]
    fn test_empty_rule_set_denies_everything() {
        let evaluator = evaluator(&[]);
        let evaluation = evaluator.evaluate(&AccessRequest::from([("op", "read")]));
        assert_eq!(evaluation.decision, Decision::Deny);
    }

    #[test]
    fn test_batch_tallies() {
        let evaluator = evaluator(&[Pattern::from([("op", "read")])]);
        let requests = vec![
            AccessRequest::from([("op", "read")]),
            AccessRequest::from([("op", "write")]),
            AccessRequest::from([("op", "read"), ("role", "ta")]),
        ];

        let report = evaluator.evaluate_batch(&requests);
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.granted, 2);
        assert_eq!(report.summary.denied, 1);
        assert!((report.summary.grant_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.evaluations.len(), 3);
    }

    #[test]
    fn test_empty_batch() {
        let evaluator = evaluator(&[Pattern::from([("op", "read")])]);
        let report = evaluator.evaluate_batch(&[]);
        assert_eq!(report.summary.total, 0);
        assert!((report.summary.grant_rate - 0.0).abs() < f64::EPSILON);
    }
}
