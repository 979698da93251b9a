//! Conditions and conjunctive patterns.
//!
//! A [`Condition`] is one `attribute = value` equality constraint. A
//! [`Pattern`] is a conjunction of conditions over distinct attributes --
//! the unit the lattice explores and the body of every mined rule.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::request::AccessRequest;
use crate::schema::Record;

/// Separator used when rendering a pattern as a readable conjunction.
pub const CONJUNCTION: &str = " \u{2227} ";

// ============================================================================
// Condition
// ============================================================================

/// A single `attribute = value` equality constraint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Condition {
    /// The constrained attribute name.
    pub attribute: String,
    /// The value the attribute must equal.
    pub value: String,
}

impl Condition {
    /// Creates a new condition.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.attribute, self.value)
    }
}

// ============================================================================
// Pattern
// ============================================================================

/// A conjunction of conditions over distinct attributes.
///
/// Conditions are keyed by attribute, so a pattern can constrain each
/// attribute at most once and two patterns with the same condition set
/// compare equal regardless of construction order. The derived `Ord` is
/// lexicographic over the (attribute, value) sequence, which is exactly
/// the deterministic processing order the miner requires.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pattern {
    conditions: BTreeMap<String, String>,
}

impl Pattern {
    /// Creates a size-1 pattern from a single condition.
    pub fn single(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        let mut conditions = BTreeMap::new();
        conditions.insert(attribute.into(), value.into());
        Self { conditions }
    }

    /// Returns a copy of this pattern with one more condition.
    ///
    /// The new condition replaces any existing constraint on the same
    /// attribute; the lattice only ever extends with fresh attributes.
    pub fn extended(&self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        let mut conditions = self.conditions.clone();
        conditions.insert(attribute.into(), value.into());
        Self { conditions }
    }

    /// Number of conditions in the conjunction.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Returns true if the pattern has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns true if this pattern constrains the given attribute.
    pub fn constrains(&self, attribute: &str) -> bool {
        self.conditions.contains_key(attribute)
    }

    /// Returns the value this pattern requires for an attribute, if any.
    pub fn value_of(&self, attribute: &str) -> Option<&str> {
        self.conditions.get(attribute).map(String::as_str)
    }

    /// The lexicographically greatest constrained attribute, if any.
    ///
    /// Candidate generation extends a pattern only with attributes beyond
    /// this one, which guarantees each condition set is generated exactly
    /// once.
    pub fn last_attribute(&self) -> Option<&str> {
        self.conditions.keys().next_back().map(String::as_str)
    }

    /// Iterates over the conditions in (attribute, value) order.
    pub fn conditions(&self) -> impl Iterator<Item = Condition> + '_ {
        self.conditions
            .iter()
            .map(|(a, v)| Condition::new(a.clone(), v.clone()))
    }

    /// Returns true if every condition holds in the given record.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(attribute, value)| record.get(attribute) == Some(value.as_str()))
    }

    /// Returns true if every condition is satisfied by the request.
    ///
    /// A missing request attribute is not a wildcard: the condition is
    /// unsatisfied and the pattern cannot match.
    pub fn satisfied_by(&self, request: &AccessRequest) -> bool {
        self.conditions
            .iter()
            .all(|(attribute, value)| request.get(attribute) == Some(value.as_str()))
    }

    /// Returns true if this pattern's condition set is a subset of `other`'s.
    ///
    /// A subset pattern is the more general of the two (it subsumes the
    /// other).
    pub fn is_subset_of(&self, other: &Pattern) -> bool {
        self.conditions
            .iter()
            .all(|(attribute, value)| other.value_of(attribute) == Some(value.as_str()))
    }

    /// Iterates over the immediate generalizations of this pattern.
    ///
    /// Each generalization drops exactly one condition. Size-1 patterns
    /// have no generalization (the empty pattern is not a legal rule).
    pub fn generalizations(&self) -> impl Iterator<Item = Pattern> + '_ {
        let has_parents = self.conditions.len() > 1;
        self.conditions
            .keys()
            .filter(move |_| has_parents)
            .map(move |dropped| {
                let conditions = self
                    .conditions
                    .iter()
                    .filter(|(a, _)| *a != dropped)
                    .map(|(a, v)| (a.clone(), v.clone()))
                    .collect();
                Pattern { conditions }
            })
    }

    /// Renders the pattern as `attr = value ∧ attr = value …`.
    pub fn render(&self) -> String {
        self.conditions
            .iter()
            .map(|(a, v)| format!("{a} = {v}"))
            .collect::<Vec<_>>()
            .join(CONJUNCTION)
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromIterator<Condition> for Pattern {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().map(|c| (c.attribute, c.value)).collect(),
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Pattern {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs
            .into_iter()
            .map(|(a, v)| Condition::new(a, v))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
