//! # galena-mining: Policy mining core
//!
//! Mines conjunctive ABAC rules from a table of positively-observed access
//! events. The pipeline:
//!
//! ```text
//! ┌────────────────┐   ┌────────────────┐   ┌────────────────┐
//! │ AttributeTable │ → │ PatternLattice │ → │   RuleMiner    │
//! │ (records +     │   │ (level-wise    │   │ (frequent →    │
//! │  domains)      │   │  candidates)   │   │  reliable →    │
//! │                │   │                │   │  non-subsumed) │
//! └────────────────┘   └────────────────┘   └────────────────┘
//! ```
//!
//! The lattice enumerates candidate conjunctions by increasing size,
//! carrying each candidate's supporting record set so support for a
//! size-(n+1) pattern is counted only over its parent's matches
//! (downward-closure pruning). The miner keeps support survivors
//! (`support ≥ T`), drops patterns whose frequent refinements retain at
//! least `K` of their support (over-general rules), prunes subsumed rules,
//! and emits a deterministic, most-general-first rule sequence.

mod error;
mod lattice;
mod miner;
mod table;

pub use error::{MiningError, MiningResult};
pub use lattice::{CountedPattern, PatternLattice};
pub use miner::{MineEvent, MineObserver, MinerOutcome, MiningParams, RuleMiner, SilentObserver};
pub use table::AttributeTable;
