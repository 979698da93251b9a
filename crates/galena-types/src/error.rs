//! Schema validation errors.

use thiserror::Error;

/// Errors raised while discovering a schema or validating records against it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Mining was requested with an empty attribute selection.
    #[error("no attributes selected")]
    EmptySelection,

    /// A record lacks one of the selected attributes.
    ///
    /// Every record must carry a value for every selected attribute;
    /// partial rows are a data-preparation problem, not something the
    /// miner papers over.
    #[error("record {record} is missing selected attribute `{attribute}`")]
    MissingAttribute {
        /// The selected attribute that is absent.
        attribute: String,
        /// Zero-based index of the offending record.
        record: usize,
    },
}
