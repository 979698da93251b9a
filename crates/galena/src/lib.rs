//! # Galena: an ABAC policy mining and evaluation engine
//!
//! Galena learns attribute-based access control policies from logs of
//! granted requests and then serves grant/deny decisions against what it
//! learned. There are no negative examples: every loaded record is an
//! access that legitimately happened, and the mined policy generalizes
//! from those observations.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌───────────────────────────────────────────┐
//!                 │               MiningEngine                │
//!                 │                                           │
//!  load_records ─→│  AttributeTable ──→ worker thread         │
//!  start_mining ─→│        │            RuleMiner             │
//!  status      ←──│   JobStatus  ←──── progress events        │
//!                 │        │                │                 │
//!  evaluate    ←──│  PolicyEvaluator ←─ PolicyStore ←─ rules  │
//!                 └───────────────────────────────────────────┘
//! ```
//!
//! Mining runs on a single background thread; the engine refuses a second
//! concurrent job rather than queueing it. The mined rule set is installed
//! atomically and served through [`Arc`](std::sync::Arc) snapshots, so
//! evaluation stays lock-light and always sees a complete policy.
//!
//! ## Example
//!
//! ```no_run
//! use std::collections::BTreeSet;
//!
//! use galena::{AccessRequest, MiningEngine, MiningParams, Record};
//!
//! # fn main() -> Result<(), galena::EngineError> {
//! let engine = MiningEngine::default();
//!
//! let records = vec![
//!     Record::from([("op", "read"), ("role", "ta")]),
//!     Record::from([("op", "read"), ("role", "ta")]),
//!     Record::from([("op", "read"), ("role", "ta")]),
//! ];
//! let selected: BTreeSet<String> =
//!     ["op", "role"].iter().map(ToString::to_string).collect();
//! engine.load_records(&records, &selected)?;
//!
//! engine.start_mining(MiningParams {
//!     support_threshold: 3,
//!     reliability_threshold: 0.5,
//! })?;
//! engine.join()?;
//!
//! let decision = engine.evaluate(&AccessRequest::from([
//!     ("op", "read"),
//!     ("role", "ta"),
//! ]))?;
//! assert!(decision.is_granted());
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod job;

pub use config::EngineConfig;
pub use engine::MiningEngine;
pub use error::{EngineError, EngineResult};
pub use job::{JobState, JobStatus};

// The vocabulary types callers need alongside the engine.
pub use galena_mining::{MiningError, MiningParams};
pub use galena_policy::{
    BatchReport, BatchSummary, CoverageStats, Decision, Evaluation, MiningProvenance, PolicyError,
    PolicyStatus, RuleSetReport, RuleSummary,
};
pub use galena_types::{AccessRequest, AttributeSchema, Condition, MinedRule, Pattern, Record};
