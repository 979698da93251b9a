//! The level-wise rule miner.

use std::collections::{BTreeMap, BTreeSet};

use galena_types::{MinedRule, Pattern};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MiningError, MiningResult};
use crate::lattice::{CountedPattern, PatternLattice};
use crate::table::AttributeTable;

// ============================================================================
// MiningParams
// ============================================================================

/// The two thresholds steering a mining run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiningParams {
    /// Minimum number of matching records a pattern needs to stay in the
    /// search (`T`). Must be at least 1.
    pub support_threshold: u64,
    /// Fraction of a pattern's support a frequent refinement may retain
    /// before the pattern is considered over-general (`K`). Must lie in
    /// `[0, 1]`: at `1.0` only closed frequent patterns survive, at `0.0`
    /// only maximal ones.
    pub reliability_threshold: f64,
}

impl MiningParams {
    /// Checks both thresholds against their legal ranges.
    ///
    /// # Errors
    ///
    /// Returns [`MiningError::InvalidParameter`] when a threshold is out
    /// of range, naming the offending parameter.
    pub fn validate(&self) -> MiningResult<()> {
        if self.support_threshold < 1 {
            return Err(MiningError::InvalidParameter(format!(
                "support threshold must be at least 1, got {}",
                self.support_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.reliability_threshold)
            || self.reliability_threshold.is_nan()
        {
            return Err(MiningError::InvalidParameter(format!(
                "reliability threshold must lie in [0, 1], got {}",
                self.reliability_threshold
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Observation
// ============================================================================

/// Progress events emitted while a run advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineEvent {
    /// A lattice level is about to be scanned.
    LevelStarted {
        /// 1-based level number, equal to the candidates' condition count.
        level: usize,
        /// Total number of levels the lattice can reach.
        max_levels: usize,
        /// Number of frequent patterns entering this level.
        candidates: usize,
    },
    /// A post-search stage is starting.
    Stage(&'static str),
}

/// Receives progress events and answers cancellation polls.
///
/// The miner polls [`is_cancelled`](MineObserver::is_cancelled) once per
/// level, so cancellation latency is one level scan.
pub trait MineObserver {
    /// Called at each level boundary and stage transition.
    fn on_event(&mut self, event: MineEvent) {
        let _ = event;
    }

    /// Returns `true` to abort the run with [`MiningError::Cancelled`].
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// An observer that ignores events and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl MineObserver for SilentObserver {}

// ============================================================================
// MinerOutcome
// ============================================================================

/// The result of a completed run, with search statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct MinerOutcome {
    /// The mined rules, most general first.
    pub rules: Vec<MinedRule>,
    /// Number of records the run scanned.
    pub record_count: usize,
    /// Number of frequent patterns found across all levels.
    pub frequent_patterns: usize,
    /// Frequent patterns that also passed the reliability filter.
    pub reliable_patterns: usize,
}

// ============================================================================
// RuleMiner
// ============================================================================

/// Mines conjunctive rules from an [`AttributeTable`] in three stages:
///
/// 1. **Frequency**: level-wise search keeps every pattern matching at
///    least `support_threshold` records, pruning by anti-monotonicity.
/// 2. **Reliability**: a frequent pattern is dropped when some frequent
///    immediate refinement retains at least `reliability_threshold` of its
///    support; such a pattern over-generalizes what the data shows.
/// 3. **Subsumption**: among the survivors, a rule strictly contained in an
///    already-kept more general rule is redundant and dropped.
///
/// The output order is deterministic: ascending condition count, then
/// lexicographic by the rendered conditions.
#[derive(Debug)]
pub struct RuleMiner {
    params: MiningParams,
}

impl RuleMiner {
    /// Creates a miner after validating the thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`MiningError::InvalidParameter`] when a threshold is out
    /// of range.
    pub fn new(params: MiningParams) -> MiningResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The validated thresholds this miner runs with.
    pub fn params(&self) -> MiningParams {
        self.params
    }

    /// Runs a full mining pass without progress reporting.
    ///
    /// # Errors
    ///
    /// See [`mine_observed`](Self::mine_observed).
    pub fn mine(&self, table: &AttributeTable) -> MiningResult<MinerOutcome> {
        self.mine_observed(table, &mut SilentObserver)
    }

    /// Runs a full mining pass, reporting progress to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`MiningError::InsufficientData`] when the table holds no
    /// records, [`MiningError::Cancelled`] when the observer requests an
    /// abort, and [`MiningError::Internal`] on a bookkeeping inconsistency.
    pub fn mine_observed<O: MineObserver>(
        &self,
        table: &AttributeTable,
        observer: &mut O,
    ) -> MiningResult<MinerOutcome> {
        if table.record_count() == 0 {
            return Err(MiningError::InsufficientData(
                "no records loaded".to_string(),
            ));
        }

        let lattice = PatternLattice::new(table);
        let max_levels = lattice.max_depth();

        // Frequent patterns per level, most general level first, plus the
        // set of patterns some frequent refinement proved over-general.
        let mut frequent_levels: Vec<Vec<CountedPattern>> = Vec::new();
        let mut unreliable: BTreeSet<Pattern> = BTreeSet::new();
        let mut frequent_count = 0usize;

        let mut level = self.frequent(lattice.seed_level());
        let mut depth = 1usize;
        while !level.is_empty() {
            if observer.is_cancelled() {
                return Err(MiningError::Cancelled);
            }
            observer.on_event(MineEvent::LevelStarted {
                level: depth,
                max_levels,
                candidates: level.len(),
            });
            debug!(level = depth, candidates = level.len(), "scanning lattice level");

            frequent_count += level.len();
            let mut next: Vec<CountedPattern> = level
                .iter()
                .flat_map(|parent| self.frequent(lattice.extend(parent)))
                .collect();
            next.sort_by(|a, b| a.pattern.cmp(&b.pattern));

            {
                let supports: BTreeMap<&Pattern, u64> = level
                    .iter()
                    .map(|counted| (&counted.pattern, counted.support()))
                    .collect();

                // Every generalization of a frequent child is itself
                // frequent, so each lookup must land in this level's
                // support map.
                for child in &next {
                    for parent in child.pattern.generalizations() {
                        let parent_support = supports.get(&parent).copied().ok_or_else(|| {
                            MiningError::internal(format!(
                                "frequent pattern `{child_pattern}` has an uncounted \
                                 generalization `{parent}`",
                                child_pattern = child.pattern
                            ))
                        })?;
                        if child.support() as f64
                            >= self.params.reliability_threshold * parent_support as f64
                        {
                            unreliable.insert(parent);
                        }
                    }
                }
            }

            frequent_levels.push(level);
            level = next;
            depth += 1;
        }

        observer.on_event(MineEvent::Stage("filtering unreliable patterns"));
        let reliable: Vec<CountedPattern> = frequent_levels
            .into_iter()
            .flatten()
            .filter(|counted| !unreliable.contains(&counted.pattern))
            .collect();
        let reliable_count = reliable.len();

        observer.on_event(MineEvent::Stage("pruning subsumed rules"));
        let mut rules: Vec<MinedRule> = Vec::new();
        for counted in reliable {
            let support = counted.support();
            let rule = MinedRule::new(counted.pattern, support, table.record_count() as u64);
            if !rules.iter().any(|kept| kept.subsumes(&rule)) {
                rules.push(rule);
            }
        }

        debug!(
            rules = rules.len(),
            frequent = frequent_count,
            reliable = reliable_count,
            "mining complete"
        );
        Ok(MinerOutcome {
            rules,
            record_count: table.record_count(),
            frequent_patterns: frequent_count,
            reliable_patterns: reliable_count,
        })
    }

    fn frequent(&self, candidates: Vec<CountedPattern>) -> Vec<CountedPattern> {
        candidates
            .into_iter()
            .filter(|counted| counted.support() >= self.params.support_threshold)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use galena_types::Record;
    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;

    fn table(records: Vec<Record>, attrs: &[&str]) -> AttributeTable {
        let selected: BTreeSet<String> = attrs.iter().map(ToString::to_string).collect();
        AttributeTable::from_records(&records, &selected).unwrap()
    }

    fn miner(support: u64, reliability: f64) -> RuleMiner {
        RuleMiner::new(MiningParams {
            support_threshold: support,
            reliability_threshold: reliability,
        })
        .unwrap()
    }

    fn rendered(outcome: &MinerOutcome) -> Vec<String> {
        outcome.rules.iter().map(MinedRule::render).collect()
    }

    fn course_records() -> Vec<Record> {
        vec![
            Record::from([("op", "read"), ("role", "ta")]),
            Record::from([("op", "read"), ("role", "ta")]),
            Record::from([("op", "read"), ("role", "ta")]),
            Record::from([("op", "write"), ("role", "prof")]),
        ]
    }

    #[test_case(0, 0.5; "zero support")]
    fn test_invalid_support_threshold(support: u64, reliability: f64) {
        let err = RuleMiner::new(MiningParams {
            support_threshold: support,
            reliability_threshold: reliability,
        })
        .unwrap_err();
        assert!(matches!(err, MiningError::InvalidParameter(_)));
    }

    #[test_case(-0.1; "below range")]
    #[test_case(1.5; "above range")]
    #[test_case(f64::NAN; "not a number")]
    fn test_invalid_reliability_threshold(reliability: f64) {
        let err = RuleMiner::new(MiningParams {
            support_threshold: 1,
            reliability_threshold: reliability,
        })
        .unwrap_err();
        assert!(matches!(err, MiningError::InvalidParameter(_)));
    }

    #[test]
    fn test_empty_table_is_insufficient() {
        let table = table(vec![], &["op"]);
        let err = miner(1, 0.5).mine(&table).unwrap_err();
        assert!(matches!(err, MiningError::InsufficientData(_)));
    }

    #[test]
    fn test_mines_single_specific_rule() {
        // Three identical read/ta events plus one write/prof outlier. With
        // T=3 the outlier's patterns never become frequent; with K=0.5 the
        // size-1 survivors are over-general because their refinement keeps
        // all of their support. Exactly one rule remains.
        let table = table(course_records(), &["op", "role"]);
        let outcome = miner(3, 0.5).mine(&table).unwrap();

        assert_eq!(rendered(&outcome), vec!["op = read \u{2227} role = ta"]);
        assert_eq!(outcome.rules[0].support, 3);
        assert_eq!(outcome.record_count, 4);
        assert_eq!(outcome.frequent_patterns, 3);
        assert_eq!(outcome.reliable_patterns, 1);
    }

    #[test]
    fn test_general_rule_subsumes_refinements() {
        // `a = 1` matches ten records split evenly over `b`, so neither
        // refinement retains 80% of its support and it stays reliable. The
        // `b` singletons lose all of their support to a refinement and
        // drop out. The surviving refinements are subsumed by `a = 1`.
        let mut records = Vec::new();
        for i in 0..10 {
            let b = if i < 5 { "1" } else { "2" };
            records.push(Record::from([("a", "1"), ("b", b)]));
        }
        let table = table(records, &["a", "b"]);
        let outcome = miner(2, 0.8).mine(&table).unwrap();

        assert_eq!(rendered(&outcome), vec!["a = 1"]);
    }

    #[test]
    fn test_reliability_one_keeps_closed_patterns() {
        // At K=1 a pattern only drops when a refinement keeps its entire
        // support. `op = read` always co-occurs with `role = ta`, so it is
        // not closed; `role = ta` has an extra supporting record and is.
        let mut records = course_records();
        records.push(Record::from([("op", "delete"), ("role", "ta")]));
        let table = table(records, &["op", "role"]);
        let outcome = miner(3, 1.0).mine(&table).unwrap();

        assert_eq!(rendered(&outcome), vec!["role = ta"]);
        assert_eq!(outcome.rules[0].support, 4);
    }

    #[test]
    fn test_reliability_zero_keeps_maximal_patterns() {
        // At K=0 any frequent refinement sinks its generalizations, so only
        // patterns with no frequent refinement at all survive.
        let table = table(course_records(), &["op", "role"]);
        let outcome = miner(1, 0.0).mine(&table).unwrap();

        assert_eq!(
            rendered(&outcome),
            vec![
                "op = read \u{2227} role = ta",
                "op = write \u{2227} role = prof",
            ]
        );
    }

    #[test]
    fn test_threshold_above_data_yields_no_rules() {
        let table = table(course_records(), &["op", "role"]);
        let outcome = miner(10, 0.5).mine(&table).unwrap();

        assert!(outcome.rules.is_empty());
        assert_eq!(outcome.frequent_patterns, 0);
    }

    #[test]
    fn test_output_is_most_general_first() {
        // Two independent clusters plus a shared attribute value: the size-1
        // rule must precede every size-2 rule it does not subsume.
        let records = vec![
            Record::from([("dept", "cs"), ("op", "read"), ("role", "ta")]),
            Record::from([("dept", "cs"), ("op", "read"), ("role", "ta")]),
            Record::from([("dept", "cs"), ("op", "write"), ("role", "prof")]),
            Record::from([("dept", "cs"), ("op", "write"), ("role", "prof")]),
        ];
        let table = table(records, &["dept", "op", "role"]);
        let outcome = miner(2, 0.9).mine(&table).unwrap();

        let sizes: Vec<usize> = outcome.rules.iter().map(MinedRule::condition_count).collect();
        let mut sorted = sizes.clone();
        sorted.sort_unstable();
        assert_eq!(sizes, sorted, "rules must be ordered most general first");
        assert!(rendered(&outcome).contains(&"dept = cs".to_string()));
    }

    struct CancelAfter {
        levels: usize,
        seen: usize,
    }

    impl MineObserver for CancelAfter {
        fn on_event(&mut self, event: MineEvent) {
            if matches!(event, MineEvent::LevelStarted { .. }) {
                self.seen += 1;
            }
        }

        fn is_cancelled(&self) -> bool {
            self.seen >= self.levels
        }
    }

    #[test]
    fn test_cancellation_aborts_between_levels() {
        let table = table(course_records(), &["op", "role"]);
        let mut observer = CancelAfter { levels: 1, seen: 0 };
        let err = miner(1, 0.5)
            .mine_observed(&table, &mut observer)
            .unwrap_err();

        assert_eq!(err, MiningError::Cancelled);
        assert_eq!(observer.seen, 1);
    }

    #[test]
    fn test_observer_sees_levels_and_stages() {
        struct Collect(Vec<String>);
        impl MineObserver for Collect {
            fn on_event(&mut self, event: MineEvent) {
                self.0.push(match event {
                    MineEvent::LevelStarted { level, .. } => format!("level {level}"),
                    MineEvent::Stage(stage) => stage.to_string(),
                });
            }
        }

        let table = table(course_records(), &["op", "role"]);
        let mut observer = Collect(Vec::new());
        miner(3, 0.5).mine_observed(&table, &mut observer).unwrap();

        assert_eq!(
            observer.0,
            vec![
                "level 1",
                "level 2",
                "filtering unreliable patterns",
                "pruning subsumed rules",
            ]
        );
    }

    fn arb_records() -> impl Strategy<Value = Vec<Record>> {
        proptest::collection::vec((0u8..3, 0u8..3, 0u8..2), 1..24).prop_map(|rows| {
            rows.into_iter()
                .map(|(a, b, c)| {
                    Record::from([
                        ("a", a.to_string().as_str()),
                        ("b", b.to_string().as_str()),
                        ("c", c.to_string().as_str()),
                    ])
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_mining_is_deterministic(records in arb_records(), support in 1u64..4, reliability in 0.0f64..=1.0) {
            let table = table(records, &["a", "b", "c"]);
            let miner = miner(support, reliability);
            prop_assert_eq!(miner.mine(&table).unwrap(), miner.mine(&table).unwrap());
        }

        #[test]
        fn prop_rule_supports_are_exact_and_frequent(records in arb_records(), support in 1u64..4, reliability in 0.0f64..=1.0) {
            let table = table(records, &["a", "b", "c"]);
            let lattice = PatternLattice::new(&table);
            let outcome = miner(support, reliability).mine(&table).unwrap();
            for rule in &outcome.rules {
                prop_assert!(rule.support >= support);
                prop_assert_eq!(rule.support, lattice.support(&rule.pattern));
            }
        }

        #[test]
        fn prop_no_rule_subsumes_another(records in arb_records(), support in 1u64..4, reliability in 0.0f64..=1.0) {
            let table = table(records, &["a", "b", "c"]);
            let outcome = miner(support, reliability).mine(&table).unwrap();
            for (i, general) in outcome.rules.iter().enumerate() {
                for specific in &outcome.rules[i + 1..] {
                    prop_assert!(!general.subsumes(specific));
                }
            }
        }
    }
}
