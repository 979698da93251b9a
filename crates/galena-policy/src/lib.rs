//! # galena-policy: Policy storage, evaluation, and reporting
//!
//! Downstream of the miner: holds the active rule set behind a lifecycle
//! state machine ([`PolicyStore`]), decides requests against snapshots of
//! it ([`PolicyEvaluator`]), and exports the policy and its behavior as
//! serializable reports.
//!
//! Evaluation is deny-by-default: a request is granted only when every
//! condition of some mined rule is satisfied, and a request attribute the
//! rule does not mention is simply ignored. Missing attributes never act
//! as wildcards.

mod error;
mod evaluator;
mod report;
mod store;

pub use error::{PolicyError, PolicyResult};
pub use evaluator::{Decision, Evaluation, PolicyEvaluator};
pub use report::{BatchReport, BatchSummary, CoverageStats, RuleSetReport, RuleSummary};
pub use store::{MiningProvenance, PolicyStatus, PolicyStore};
