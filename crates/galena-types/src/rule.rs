//! Mined policy rules.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;
use crate::request::AccessRequest;

// ============================================================================
// MinedRule
// ============================================================================

/// A pattern accepted into the final policy, frozen with its statistics.
///
/// Created by the miner and never mutated after acceptance. `support` is
/// the number of loaded records satisfying every condition; `coverage` is
/// that count as a fraction of the record total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinedRule {
    /// The conjunction this rule grants.
    pub pattern: Pattern,
    /// Number of records matching the pattern.
    pub support: u64,
    /// `support / record_count`, in `[0, 1]`.
    pub coverage: f64,
}

impl MinedRule {
    /// Freezes an accepted pattern into a rule.
    ///
    /// `record_count` must be the size of the table the pattern was mined
    /// from; the miner rejects empty tables before any rule is created.
    pub fn new(pattern: Pattern, support: u64, record_count: u64) -> Self {
        let coverage = if record_count == 0 {
            0.0
        } else {
            support as f64 / record_count as f64
        };
        Self {
            pattern,
            support,
            coverage,
        }
    }

    /// Number of conditions in the rule body.
    pub fn condition_count(&self) -> usize {
        self.pattern.len()
    }

    /// Returns true if this rule's conditions are all satisfied by the
    /// request. Missing request attributes are not wildcards.
    pub fn matches(&self, request: &AccessRequest) -> bool {
        self.pattern.satisfied_by(request)
    }

    /// Returns true if this rule is more general than `other` (its
    /// condition set is a strict subset of the other's).
    pub fn subsumes(&self, other: &MinedRule) -> bool {
        self.pattern.len() < other.pattern.len() && self.pattern.is_subset_of(&other.pattern)
    }

    /// Renders the rule body as a readable conjunction.
    pub fn render(&self) -> String {
        self.pattern.render()
    }
}

impl Display for MinedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern.render())
    }
}
