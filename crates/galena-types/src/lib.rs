//! # galena-types: Core types for Galena
//!
//! Shared vocabulary used across the Galena policy-mining engine:
//!
//! - Attribute schema and observed access events ([`AttributeSchema`], [`Record`])
//! - Conjunctive constraints ([`Condition`], [`Pattern`])
//! - Accepted policy rules ([`MinedRule`])
//! - Runtime evaluation input ([`AccessRequest`])
//!
//! All values are categorical strings keyed by attribute name. Validation
//! against the schema happens once at ingestion; downstream components
//! (the lattice, the miner, the evaluator) trust the types in this crate.

mod error;
mod pattern;
mod request;
mod rule;
mod schema;

pub use error::SchemaError;
pub use pattern::{Condition, Pattern};
pub use request::AccessRequest;
pub use rule::MinedRule;
pub use schema::{AttributeSchema, Record};
