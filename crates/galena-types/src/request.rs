//! Access requests submitted for evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// AccessRequest
// ============================================================================

/// An attribute-value assignment submitted for a grant/deny decision.
///
/// Structurally identical to a record but supplied at evaluation time and
/// not necessarily complete. Values outside an attribute's known domain are
/// legal; they simply never satisfy any mined condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest(BTreeMap<String, String>);

impl AccessRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the supplied value for an attribute, if present.
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.0.get(attribute).map(String::as_str)
    }

    /// Iterates over the supplied (attribute, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(a, v)| (a.as_str(), v.as_str()))
    }

    /// Number of attributes supplied.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no attributes were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for AccessRequest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for AccessRequest {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs
            .into_iter()
            .map(|(a, v)| (a.to_string(), v.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let request = AccessRequest::from([("op", "read"), ("role", "ta")]);
        assert_eq!(request.get("op"), Some("read"));
        assert_eq!(request.get("course"), None);
        assert_eq!(request.len(), 2);
    }

    #[test]
    fn test_empty() {
        assert!(AccessRequest::new().is_empty());
    }
}
