//! Attribute schema and observed access events.
//!
//! The schema maps every selected attribute to its domain -- the set of
//! distinct values observed for that column in the loaded data. Domains are
//! discovered once at load time and are immutable thereafter.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

// ============================================================================
// Record
// ============================================================================

/// One observed (granted) access event: attribute name → categorical value.
///
/// Records are immutable once loaded. A `BTreeMap` keeps attribute order
/// canonical so that identical events compare equal regardless of the order
/// their columns arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the value of the given attribute, if present.
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.0.get(attribute).map(String::as_str)
    }

    /// Iterates over (attribute, value) pairs in attribute order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(a, v)| (a.as_str(), v.as_str()))
    }

    /// Number of attributes carried by this record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record carries no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a copy of this record restricted to the given attributes.
    ///
    /// Columns outside the selection are dropped; mining never sees them.
    pub fn restricted_to(&self, attributes: &BTreeSet<String>) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(a, _)| attributes.contains(*a))
                .map(|(a, v)| (a.clone(), v.clone()))
                .collect(),
        )
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Record {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs
            .into_iter()
            .map(|(a, v)| (a.to_string(), v.to_string()))
            .collect()
    }
}

// ============================================================================
// AttributeSchema
// ============================================================================

/// The selected attributes and their observed value domains.
///
/// Discovered once from the loaded records; immutable afterwards. A value
/// outside an attribute's domain can never satisfy any mined condition,
/// which is why evaluation treats unknown values as a normal non-match
/// rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSchema {
    domains: BTreeMap<String, BTreeSet<String>>,
}

impl AttributeSchema {
    /// Discovers the schema for `selected` attributes over `records`.
    ///
    /// Every record must carry a value for every selected attribute.
    ///
    /// # Errors
    ///
    /// * [`SchemaError::EmptySelection`] if `selected` is empty.
    /// * [`SchemaError::MissingAttribute`] if a record lacks a selected
    ///   attribute.
    pub fn discover(records: &[Record], selected: &BTreeSet<String>) -> Result<Self, SchemaError> {
        if selected.is_empty() {
            return Err(SchemaError::EmptySelection);
        }

        let mut domains: BTreeMap<String, BTreeSet<String>> = selected
            .iter()
            .map(|a| (a.clone(), BTreeSet::new()))
            .collect();

        for (index, record) in records.iter().enumerate() {
            for attribute in selected {
                let value =
                    record
                        .get(attribute)
                        .ok_or_else(|| SchemaError::MissingAttribute {
                            attribute: attribute.clone(),
                            record: index,
                        })?;
                if let Some(domain) = domains.get_mut(attribute) {
                    domain.insert(value.to_string());
                }
            }
        }

        Ok(Self { domains })
    }

    /// Iterates over the selected attribute names in lexicographic order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    /// Number of selected attributes.
    pub fn attribute_count(&self) -> usize {
        self.domains.len()
    }

    /// Returns the observed domain of an attribute, if it is selected.
    pub fn domain(&self, attribute: &str) -> Option<&BTreeSet<String>> {
        self.domains.get(attribute)
    }

    /// Returns true if `value` was observed for `attribute`.
    pub fn contains(&self, attribute: &str, value: &str) -> bool {
        self.domains
            .get(attribute)
            .is_some_and(|domain| domain.contains(value))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(attrs: &[&str]) -> BTreeSet<String> {
        attrs.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_discover_domains() {
        let records = vec![
            Record::from([("op", "read"), ("role", "ta")]),
            Record::from([("op", "write"), ("role", "prof")]),
            Record::from([("op", "read"), ("role", "prof")]),
        ];
        let schema = AttributeSchema::discover(&records, &selection(&["op", "role"])).unwrap();

        assert_eq!(schema.attribute_count(), 2);
        assert_eq!(
            schema.domain("op").unwrap().iter().collect::<Vec<_>>(),
            vec!["read", "write"]
        );
        assert!(schema.contains("role", "ta"));
        assert!(!schema.contains("role", "student"));
        assert!(!schema.contains("course", "cs101"));
    }

    #[test]
    fn test_discover_rejects_empty_selection() {
        let records = vec![Record::from([("op", "read")])];
        let err = AttributeSchema::discover(&records, &BTreeSet::new()).unwrap_err();
        assert_eq!(err, SchemaError::EmptySelection);
    }

    #[test]
    fn test_discover_rejects_missing_attribute() {
        let records = vec![
            Record::from([("op", "read"), ("role", "ta")]),
            Record::from([("op", "write")]),
        ];
        let err = AttributeSchema::discover(&records, &selection(&["op", "role"])).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingAttribute {
                attribute: "role".to_string(),
                record: 1,
            }
        );
    }

    #[test]
    fn test_discover_ignores_unselected_columns() {
        let records = vec![Record::from([("op", "read"), ("role", "ta"), ("ip", "10.0.0.1")])];
        let schema = AttributeSchema::discover(&records, &selection(&["op", "role"])).unwrap();
        assert!(schema.domain("ip").is_none());
    }

    #[test]
    fn test_record_restriction() {
        let record = Record::from([("op", "read"), ("role", "ta"), ("ip", "10.0.0.1")]);
        let restricted = record.restricted_to(&selection(&["op", "role"]));

        assert_eq!(restricted.len(), 2);
        assert_eq!(restricted.get("op"), Some("read"));
        assert_eq!(restricted.get("ip"), None);
    }

    #[test]
    fn test_record_canonical_ordering() {
        let a = Record::from([("role", "ta"), ("op", "read")]);
        let b = Record::from([("op", "read"), ("role", "ta")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_schema_serialization_roundtrip() {
        let records = vec![Record::from([("op", "read"), ("role", "ta")])];
        let schema = AttributeSchema::discover(&records, &selection(&["op", "role"])).unwrap();

        let json = serde_json::to_string(&schema).expect("serialize schema");
        let back: AttributeSchema = serde_json::from_str(&json).expect("deserialize schema");
        assert_eq!(schema, back);
    }
}
