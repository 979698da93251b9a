//! Mining job state shared between the engine and its worker thread.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use galena_mining::{
    AttributeTable, MineEvent, MineObserver, MinerOutcome, MiningError, RuleMiner,
};
use galena_policy::PolicyStore;
use serde::Serialize;
use tracing::{info, warn};

// ============================================================================
// JobState / JobStatus
// ============================================================================

/// Lifecycle state of the most recent mining job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// No job has run since construction or the last reset.
    Idle,
    /// A worker thread is mining.
    Running,
    /// The last job installed a rule set.
    Succeeded,
    /// The last job failed; the error is on the status.
    Failed,
    /// The last job was cancelled by a reset.
    ///
    /// Transient: only a reset requests cancellation, and that same reset
    /// overwrites the status with idle once the worker is joined. A
    /// concurrent `status()` call can observe it in between.
    Cancelled,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        })
    }
}

/// A point-in-time snapshot of job progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    /// Where the job is in its lifecycle.
    pub state: JobState,
    /// The lattice level currently being scanned, 0 before the first.
    pub level: usize,
    /// Total levels the lattice can reach for the loaded schema.
    pub max_levels: usize,
    /// Monotone progress estimate in `[0, 100]`; reaches 100 only on
    /// success.
    pub percent: u8,
    /// Human-readable description of the current activity.
    pub stage: String,
    /// The failure message when the job failed.
    pub error: Option<String>,
}

impl JobStatus {
    /// The status before any job has run.
    pub fn idle() -> Self {
        Self {
            state: JobState::Idle,
            level: 0,
            max_levels: 0,
            percent: 0,
            stage: "idle".to_string(),
            error: None,
        }
    }
}

// ============================================================================
// JobShared
// ============================================================================

/// State shared between the engine front and the worker thread.
///
/// The status and store sit behind separate locks so an evaluation never
/// waits on a progress update. A poisoned lock is recovered rather than
/// propagated: both values stay consistent under panic because every
/// writer completes its mutation in a single critical section.
pub(crate) struct JobShared {
    status: RwLock<JobStatus>,
    store: RwLock<PolicyStore>,
    cancel: AtomicBool,
}

impl JobShared {
    pub(crate) fn new() -> Self {
        Self {
            status: RwLock::new(JobStatus::idle()),
            store: RwLock::new(PolicyStore::new()),
            cancel: AtomicBool::new(false),
        }
    }

    pub(crate) fn status(&self) -> JobStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn update_status(&self, mutate: impl FnOnce(&mut JobStatus)) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        mutate(&mut status);
    }

    /// Runs `check` and, when it returns true, `mutate` under one write
    /// lock acquisition, so the check cannot race another starter.
    pub(crate) fn update_status_if(
        &self,
        check: impl FnOnce(&JobStatus) -> bool,
        mutate: impl FnOnce(&mut JobStatus),
    ) -> bool {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        if check(&status) {
            mutate(&mut status);
            true
        } else {
            false
        }
    }

    pub(crate) fn with_store<T>(&self, read: impl FnOnce(&PolicyStore) -> T) -> T {
        read(&self.store.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn update_store(&self, mutate: impl FnOnce(&mut PolicyStore)) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        mutate(&mut store);
    }

    pub(crate) fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub(crate) fn clear_cancel(&self) {
        self.cancel.store(false, Ordering::Relaxed);
    }

    pub(crate) fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

// ============================================================================
// SharedObserver
// ============================================================================

/// Feeds miner progress into the shared job status.
pub(crate) struct SharedObserver<'a> {
    shared: &'a JobShared,
}

impl<'a> SharedObserver<'a> {
    pub(crate) fn new(shared: &'a JobShared) -> Self {
        Self { shared }
    }
}

impl MineObserver for SharedObserver<'_> {
    fn on_event(&mut self, event: MineEvent) {
        match event {
            MineEvent::LevelStarted {
                level,
                max_levels,
                candidates: _,
            } => {
                // 100 is reserved for completion; a running job caps at 99.
                let estimate = (level.saturating_sub(1) * 100)
                    .checked_div(max_levels)
                    .unwrap_or(0)
                    .min(99) as u8;
                self.shared.update_status(|status| {
                    status.level = level;
                    status.max_levels = max_levels;
                    status.percent = status.percent.max(estimate);
                    status.stage = format!("scanning level {level} of {max_levels}");
                });
            }
            MineEvent::Stage(stage) => {
                self.shared.update_status(|status| {
                    status.stage = stage.to_string();
                });
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.shared.cancel_requested()
    }
}

// ============================================================================
// Worker body
// ============================================================================

/// Runs one mining job to completion and records its outcome.
///
/// The store is updated before the status flips, so a caller that observes
/// a succeeded job always sees the rule set that job installed.
pub(crate) fn run_mining(
    shared: &JobShared,
    table: &AttributeTable,
    miner: &RuleMiner,
    max_rules: Option<usize>,
) {
    let mut observer = SharedObserver::new(shared);
    match miner.mine_observed(table, &mut observer) {
        Ok(mut outcome) => {
            if let Some(max) = max_rules {
                outcome.rules.truncate(max);
            }
            install(shared, miner, &outcome);
        }
        Err(MiningError::Cancelled) => {
            info!("mining job cancelled");
            shared.update_store(PolicyStore::fail);
            shared.update_status(|status| {
                status.state = JobState::Cancelled;
                status.stage = "cancelled".to_string();
            });
        }
        Err(err) => {
            warn!(%err, "mining job failed");
            shared.update_store(PolicyStore::fail);
            shared.update_status(|status| {
                status.state = JobState::Failed;
                status.stage = "failed".to_string();
                status.error = Some(err.to_string());
            });
        }
    }
}

fn install(shared: &JobShared, miner: &RuleMiner, outcome: &MinerOutcome) {
    info!(
        rules = outcome.rules.len(),
        records = outcome.record_count,
        "mining job succeeded"
    );
    shared.update_store(|store| store.complete(miner.params(), outcome));
    shared.update_status(|status| {
        status.state = JobState::Succeeded;
        status.percent = 100;
        status.stage = "complete".to_string();
        status.error = None;
    });
}

// ============================================================================
// Tests
// ============================================================================
