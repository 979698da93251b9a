//! The engine facade: data loading, job control, and evaluation.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use galena_mining::{AttributeTable, MiningError, MiningParams, RuleMiner};
use galena_policy::{
    BatchReport, CoverageStats, Evaluation, PolicyEvaluator, PolicyStore, RuleSetReport,
};
use galena_types::{AccessRequest, MinedRule, Record};
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::job::{self, JobShared, JobState, JobStatus};

// ============================================================================
// MiningEngine
// ============================================================================

/// Owns the loaded records, the policy store, and the single background
/// mining worker.
///
/// All methods take `&self`; the engine is meant to be shared behind an
/// [`Arc`] by any number of callers. At most one mining job runs at a
/// time: a second [`start_mining`](Self::start_mining) while one is
/// underway returns [`EngineError::Conflict`] instead of queueing.
///
/// Evaluation reads a snapshot of the active rule set, so it never blocks
/// on a running job and never observes a half-installed policy.
pub struct MiningEngine {
    config: EngineConfig,
    shared: Arc<JobShared>,
    table: RwLock<Option<Arc<AttributeTable>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for MiningEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl MiningEngine {
    /// Creates an engine with no records and an empty policy.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            shared: Arc::new(JobShared::new()),
            table: RwLock::new(None),
            worker: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Data loading
    // ------------------------------------------------------------------

    /// Loads access records restricted to the selected attributes,
    /// replacing any previously loaded set. Returns the record count.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Conflict`] while a job is running, and
    /// propagates schema validation failures.
    pub fn load_records(
        &self,
        records: &[Record],
        selected: &BTreeSet<String>,
    ) -> EngineResult<usize> {
        if self.shared.status().state == JobState::Running {
            return Err(EngineError::Conflict);
        }
        let table = AttributeTable::from_records(records, selected).map_err(EngineError::Mining)?;
        let count = table.record_count();
        info!(records = count, attributes = table.attribute_count(), "records loaded");
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(table));
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Job control
    // ------------------------------------------------------------------

    /// Starts a background mining job over the loaded records.
    ///
    /// Parameter validation and the running-job check happen before the
    /// worker spawns, so those failures are synchronous. Everything after
    /// the spawn is reported through [`status`](Self::status).
    ///
    /// # Errors
    ///
    /// Returns [`MiningError::InvalidParameter`] for out-of-range
    /// thresholds, [`MiningError::InsufficientData`] when no records are
    /// loaded, and [`EngineError::Conflict`] when a job is already
    /// running.
    pub fn start_mining(&self, params: MiningParams) -> EngineResult<()> {
        let miner = RuleMiner::new(params).map_err(EngineError::Mining)?;
        let table = self
            .table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| {
                EngineError::Mining(MiningError::InsufficientData(
                    "no records loaded".to_string(),
                ))
            })?;

        // The check and the transition to Running share one lock
        // acquisition; two concurrent starters cannot both pass.
        let started = self.shared.update_status_if(
            |status| status.state != JobState::Running,
            |status| {
                *status = JobStatus::idle();
                status.state = JobState::Running;
                status.stage = "starting".to_string();
            },
        );
        if !started {
            return Err(EngineError::Conflict);
        }

        self.shared.clear_cancel();
        self.shared.update_store(PolicyStore::begin_mining);
        self.reap_worker()?;

        let shared = Arc::clone(&self.shared);
        let max_rules = self.config.max_rules;
        let spawned = thread::Builder::new()
            .name(self.config.worker_thread_name.clone())
            .spawn(move || job::run_mining(&shared, &table, &miner, max_rules));
        match spawned {
            Ok(handle) => {
                *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                info!(
                    support = params.support_threshold,
                    reliability = params.reliability_threshold,
                    "mining job started"
                );
                Ok(())
            }
            Err(err) => {
                self.shared.update_store(PolicyStore::fail);
                self.shared.update_status(|status| {
                    status.state = JobState::Failed;
                    status.stage = "failed".to_string();
                    status.error = Some(err.to_string());
                });
                Err(EngineError::internal(format!(
                    "failed to spawn mining worker: {err}"
                )))
            }
        }
    }

    /// A snapshot of the current job's progress.
    pub fn status(&self) -> JobStatus {
        self.shared.status()
    }

    /// Blocks until the current job, if any, has finished.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Internal`] when the worker panicked.
    pub fn join(&self) -> EngineResult<()> {
        self.reap_worker()
    }

    /// Cancels any running job and returns the engine to its initial
    /// state: no records, no policy, idle status. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Internal`] when the worker panicked while
    /// being cancelled.
    pub fn reset(&self) -> EngineResult<()> {
        self.shared.request_cancel();
        let result = self.reap_worker();
        self.shared.clear_cancel();

        *self.table.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.shared.update_store(PolicyStore::reset);
        self.shared.update_status(|status| *status = JobStatus::idle());
        info!("engine reset");
        result
    }

    // ------------------------------------------------------------------
    // Policy access
    // ------------------------------------------------------------------

    /// The active rule set, most general first.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotReady`](galena_policy::PolicyError) while
    /// no mined policy is ready.
    pub fn rules(&self) -> EngineResult<Arc<[MinedRule]>> {
        Ok(self.shared.with_store(PolicyStore::snapshot)?)
    }

    /// A serializable description of the policy store.
    pub fn report(&self) -> RuleSetReport {
        self.shared.with_store(PolicyStore::report)
    }

    /// Decides one request against the active policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotReady`](galena_policy::PolicyError) while
    /// no mined policy is ready.
    pub fn evaluate(&self, request: &AccessRequest) -> EngineResult<Evaluation> {
        Ok(PolicyEvaluator::new(self.rules()?).evaluate(request))
    }

    /// Decides a batch of requests against one consistent policy snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotReady`](galena_policy::PolicyError) while
    /// no mined policy is ready.
    pub fn evaluate_batch(&self, requests: &[AccessRequest]) -> EngineResult<BatchReport> {
        Ok(PolicyEvaluator::new(self.rules()?).evaluate_batch(requests))
    }

    /// Measures how much of the loaded record set the active rules cover.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotReady`](galena_policy::PolicyError) while
    /// no policy is ready, and [`MiningError::InsufficientData`] when the
    /// records were discarded after mining.
    pub fn coverage(&self) -> EngineResult<CoverageStats> {
        let rules = self.rules()?;
        let table = self
            .table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| {
                EngineError::Mining(MiningError::InsufficientData(
                    "no records loaded".to_string(),
                ))
            })?;
        Ok(CoverageStats::compute(&rules, table.records()))
    }

    // ------------------------------------------------------------------

    fn reap_worker(&self) -> EngineResult<()> {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle
                .join()
                .map_err(|_| EngineError::internal("mining worker panicked"))?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MiningParams {
        MiningParams {
            support_threshold: 3,
            reliability_threshold: 0.5,
        }
    }

    fn loaded_engine() -> MiningEngine {
        let engine = MiningEngine::default();
        let records = vec![
            Record::from([("op", "read"), ("role", "ta")]),
            Record::from([("op", "read"), ("role", "ta")]),
            Record::from([("op", "read"), ("role", "ta")]),
            Record::from([("op", "write"), ("role", "prof")]),
        ];
        let selected: BTreeSet<String> =
            ["op", "role"].iter().map(ToString::to_string).collect();
        engine.load_records(&records, &selected).unwrap();
        engine
    }

    #[test]
    fn test_start_while_running_is_a_conflict() {
        let engine = loaded_engine();
        // Pin the status to Running without a worker; the guard must trip
        // regardless of what the thread is doing.
        engine.shared.update_status(|status| {
            status.state = JobState::Running;
        });

        assert_eq!(engine.start_mining(params()).unwrap_err(), EngineError::Conflict);
    }

    #[test]
    fn test_load_while_running_is_a_conflict() {
        let engine = loaded_engine();
        engine.shared.update_status(|status| {
            status.state = JobState::Running;
        });

        let selected: BTreeSet<String> = ["op"].iter().map(ToString::to_string).collect();
        let err = engine
            .load_records(&[Record::from([("op", "read")])], &selected)
            .unwrap_err();
        assert_eq!(err, EngineError::Conflict);
    }

    #[test]
    fn test_reset_overwrites_cancelled_state() {
        let engine = loaded_engine();
        engine.shared.update_status(|status| {
            status.state = JobState::Cancelled;
        });

        engine.reset().unwrap();
        assert_eq!(engine.status().state, JobState::Idle);
    }

    #[test]
    fn test_restart_allowed_after_completion() {
        let engine = loaded_engine();
        engine.start_mining(params()).unwrap();
        engine.join().unwrap();
        assert_eq!(engine.status().state, JobState::Succeeded);

        engine.start_mining(params()).unwrap();
        engine.join().unwrap();
        assert_eq!(engine.status().state, JobState::Succeeded);
    }
}
