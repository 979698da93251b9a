//! The immutable record substrate mining operates over.

use std::collections::BTreeSet;

use galena_types::{AttributeSchema, Record};

use crate::error::MiningResult;

// ============================================================================
// AttributeTable
// ============================================================================

/// An immutable view of the loaded records restricted to the selected
/// attributes, plus the schema discovered from them.
///
/// Built once per upload; read-only for the remainder of that upload's
/// lifetime, so it can be shared across threads without locking. The
/// canonical domain check happens here, not downstream: the lattice and
/// miner trust every record to carry every selected attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTable {
    schema: AttributeSchema,
    records: Vec<Record>,
}

impl AttributeTable {
    /// Builds a table from collaborator-supplied records and the selected
    /// attribute names. Columns outside the selection are dropped.
    ///
    /// # Errors
    ///
    /// Propagates [`SchemaError`](galena_types::SchemaError) when the
    /// selection is empty or a record lacks a selected attribute.
    pub fn from_records(records: &[Record], selected: &BTreeSet<String>) -> MiningResult<Self> {
        let schema = AttributeSchema::discover(records, selected)?;
        let records = records
            .iter()
            .map(|record| record.restricted_to(selected))
            .collect();
        Ok(Self { schema, records })
    }

    /// The discovered schema.
    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    /// The restricted records, in load order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of loaded records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Number of selected attributes; also the maximum lattice depth.
    pub fn attribute_count(&self) -> usize {
        self.schema.attribute_count()
    }

    /// The value of `attribute` in record `row`, if the row exists.
    pub fn value(&self, row: usize, attribute: &str) -> Option<&str> {
        self.records.get(row).and_then(|record| record.get(attribute))
    }
}

// ============================================================================
// Tests
// ============================================================================
