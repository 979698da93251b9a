//! The policy store: the single slot holding the active rule set.

use std::fmt;
use std::sync::Arc;

use galena_mining::{MinerOutcome, MiningParams};
use galena_types::MinedRule;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PolicyError, PolicyResult};
use crate::report::{RuleSetReport, RuleSummary};

// ============================================================================
// PolicyStatus
// ============================================================================

/// Lifecycle state of the stored policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    /// Nothing has been mined yet, or the store was reset.
    Empty,
    /// A mining run is producing the next rule set.
    Mining,
    /// A mined rule set is available for evaluation.
    Ready,
    /// The last mining run failed; its partial output was discarded.
    Failed,
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Empty => "empty",
            Self::Mining => "mining",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

// ============================================================================
// MiningProvenance
// ============================================================================

/// How the active rule set was produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MiningProvenance {
    /// The thresholds the run used.
    pub params: MiningParams,
    /// Number of records mined over.
    pub record_count: usize,
    /// Frequent patterns the search visited.
    pub frequent_patterns: usize,
    /// Frequent patterns that passed the reliability filter.
    pub reliable_patterns: usize,
}

// ============================================================================
// PolicyStore
// ============================================================================

/// Holds at most one rule set together with its lifecycle state and
/// provenance.
///
/// The store itself carries no locking; callers that share it across
/// threads wrap it in their own synchronization. Evaluation works off the
/// [`Arc`] snapshot from [`snapshot`](Self::snapshot), so a swap of the
/// active rule set never invalidates an in-flight evaluation.
///
/// A failed run leaves nothing behind: the previous rule set is discarded
/// rather than silently served as if it reflected the latest data.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    status: PolicyStatus,
    rules: Arc<[MinedRule]>,
    provenance: Option<MiningProvenance>,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            status: PolicyStatus::Empty,
            rules: Arc::from(Vec::new()),
            provenance: None,
        }
    }

    /// The store's lifecycle state.
    pub fn status(&self) -> PolicyStatus {
        self.status
    }

    /// Marks a mining run as underway. The previous rule set stays in
    /// place until the run completes or fails.
    pub fn begin_mining(&mut self) {
        self.status = PolicyStatus::Mining;
    }

    /// Installs a freshly mined rule set and marks the store ready.
    ///
    /// An empty outcome is a legal policy: the store becomes ready and
    /// every request is denied by default.
    pub fn complete(&mut self, params: MiningParams, outcome: &MinerOutcome) {
        info!(rules = outcome.rules.len(), "installing mined rule set");
        self.rules = Arc::from(outcome.rules.clone());
        self.provenance = Some(MiningProvenance {
            params,
            record_count: outcome.record_count,
            frequent_patterns: outcome.frequent_patterns,
            reliable_patterns: outcome.reliable_patterns,
        });
        self.status = PolicyStatus::Ready;
    }

    /// Records a failed run, discarding any previously active rule set.
    pub fn fail(&mut self) {
        self.rules = Arc::from(Vec::new());
        self.provenance = None;
        self.status = PolicyStatus::Failed;
    }

    /// Returns the store to its initial empty state.
    pub fn reset(&mut self) {
        self.rules = Arc::from(Vec::new());
        self.provenance = None;
        self.status = PolicyStatus::Empty;
    }

    /// A shared handle to the active rule set.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotReady`] unless the store is
    /// [`PolicyStatus::Ready`].
    pub fn snapshot(&self) -> PolicyResult<Arc<[MinedRule]>> {
        match self.status {
            PolicyStatus::Ready => Ok(Arc::clone(&self.rules)),
            status => {
                warn!(%status, "rule set requested while no policy is ready");
                Err(PolicyError::NotReady { status })
            }
        }
    }

    /// A serializable description of the store's contents.
    pub fn report(&self) -> RuleSetReport {
        RuleSetReport {
            status: self.status,
            rule_count: self.rules.len(),
            rules: self.rules.iter().map(RuleSummary::from).collect(),
            provenance: self.provenance,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
