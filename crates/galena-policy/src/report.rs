//! Serializable views of the policy and its behavior over data.

use std::collections::BTreeMap;

use galena_types::{Condition, MinedRule, Record};
use serde::Serialize;

use crate::evaluator::Evaluation;
use crate::store::{MiningProvenance, PolicyStatus};

// ============================================================================
// RuleSummary / RuleSetReport
// ============================================================================

/// One rule, rendered for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    /// The rule body as a readable conjunction.
    pub text: String,
    /// The structured conditions, in attribute order.
    pub conditions: Vec<Condition>,
    /// Number of records the rule matched when mined.
    pub support: u64,
    /// `support` as a fraction of the mined record count.
    pub coverage: f64,
}

impl From<&MinedRule> for RuleSummary {
    fn from(rule: &MinedRule) -> Self {
        Self {
            text: rule.render(),
            conditions: rule.pattern.conditions().collect(),
            support: rule.support,
            coverage: rule.coverage,
        }
    }
}

/// The full exportable state of the policy store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSetReport {
    /// Lifecycle state of the store.
    pub status: PolicyStatus,
    /// Number of rules in the active set.
    pub rule_count: usize,
    /// The rules themselves, most general first.
    pub rules: Vec<RuleSummary>,
    /// How the active set was produced, when one exists.
    pub provenance: Option<MiningProvenance>,
}

impl RuleSetReport {
    /// Serializes the report as a JSON value.
    ///
    /// # Errors
    ///
    /// Propagates serialization failures from `serde_json`.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

// ============================================================================
// CoverageStats
// ============================================================================

/// How much of a record set the mined rules explain, plus the shape of
/// the rule set itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageStats {
    /// Records matched by at least one rule.
    pub covered_records: usize,
    /// Total records examined.
    pub total_records: usize,
    /// `covered_records / total_records`, 0 for an empty set.
    pub coverage: f64,
    /// Per-rule match counts, in rule order.
    pub rule_matches: Vec<u64>,
    /// Histogram of rules by condition count.
    pub rules_by_size: BTreeMap<usize, usize>,
    /// How many rules constrain each attribute.
    pub attribute_usage: BTreeMap<String, usize>,
}

impl CoverageStats {
    /// Counts, for each record, whether any rule's pattern matches it, and
    /// how many records each rule matches individually.
    pub fn compute(rules: &[MinedRule], records: &[Record]) -> Self {
        let mut rule_matches = vec![0u64; rules.len()];
        let mut covered_records = 0usize;
        for record in records {
            let mut covered = false;
            for (i, rule) in rules.iter().enumerate() {
                if rule.pattern.matches(record) {
                    rule_matches[i] += 1;
                    covered = true;
                }
            }
            if covered {
                covered_records += 1;
            }
        }
        let coverage = if records.is_empty() {
            0.0
        } else {
            covered_records as f64 / records.len() as f64
        };

        let mut rules_by_size: BTreeMap<usize, usize> = BTreeMap::new();
        let mut attribute_usage: BTreeMap<String, usize> = BTreeMap::new();
        for rule in rules {
            *rules_by_size.entry(rule.condition_count()).or_default() += 1;
            for condition in rule.pattern.conditions() {
                *attribute_usage.entry(condition.attribute).or_default() += 1;
            }
        }

        Self {
            covered_records,
            total_records: records.len(),
            coverage,
            rule_matches,
            rules_by_size,
            attribute_usage,
        }
    }
}

// ============================================================================
// BatchSummary / BatchReport
// ============================================================================

/// Grant and denial tallies for a batch of requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Requests evaluated.
    pub total: usize,
    /// Requests some rule granted.
    pub granted: usize,
    /// Requests denied by default.
    pub denied: usize,
    /// `granted / total`, 0 for an empty batch.
    pub grant_rate: f64,
}

impl BatchSummary {
    /// Builds a summary from the batch size and grant count.
    pub fn new(total: usize, granted: usize) -> Self {
        let grant_rate = if total == 0 {
            0.0
        } else {
            granted as f64 / total as f64
        };
        Self {
            total,
            granted,
            denied: total - granted,
            grant_rate,
        }
    }
}

/// Per-request evaluations plus their summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// One entry per request, in submission order.
    pub evaluations: Vec<Evaluation>,
    /// Aggregate tallies.
    pub summary: BatchSummary,
}

// ============================================================================
// Tests
// ============================================================================
