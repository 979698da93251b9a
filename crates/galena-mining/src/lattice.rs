//! Level-wise candidate generation over the attribute-value lattice.

use std::collections::BTreeMap;

use galena_types::Pattern;

use crate::table::AttributeTable;

// ============================================================================
// CountedPattern
// ============================================================================

/// A candidate pattern together with the indices of the records that
/// satisfy it.
///
/// Carrying the supporting rows makes extension incremental: a child's
/// support is counted only over its parent's matches, never by re-scanning
/// the whole table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountedPattern {
    /// The candidate conjunction.
    pub pattern: Pattern,
    /// Indices of the records matching every condition, ascending.
    pub rows: Vec<u32>,
}

impl CountedPattern {
    /// The pattern's support: the number of matching records.
    pub fn support(&self) -> u64 {
        self.rows.len() as u64
    }
}

// ============================================================================
// PatternLattice
// ============================================================================

/// Generates and counts candidate conjunctions level by level.
///
/// Two guarantees hold by construction:
///
/// - **No duplicates**: a pattern is only ever extended with attributes
///   lexicographically beyond its last constrained attribute, so each
///   distinct condition set is generated exactly once.
/// - **No zero-support candidates**: extension values are taken from the
///   parent's supporting records, so every generated candidate co-occurs
///   with its parent in at least one record.
pub struct PatternLattice<'a> {
    table: &'a AttributeTable,
}

impl<'a> PatternLattice<'a> {
    /// Creates a lattice over the given table.
    pub fn new(table: &'a AttributeTable) -> Self {
        Self { table }
    }

    /// Maximum number of levels: one condition per selected attribute.
    pub fn max_depth(&self) -> usize {
        self.table.attribute_count()
    }

    /// All size-1 patterns occurring in the data, in lexicographic order,
    /// each with its supporting record set.
    pub fn seed_level(&self) -> Vec<CountedPattern> {
        let mut groups: BTreeMap<(String, String), Vec<u32>> = BTreeMap::new();
        for (row, record) in self.table.records().iter().enumerate() {
            for (attribute, value) in record.iter() {
                groups
                    .entry((attribute.to_string(), value.to_string()))
                    .or_default()
                    .push(row as u32);
            }
        }
        groups
            .into_iter()
            .map(|((attribute, value), rows)| CountedPattern {
                pattern: Pattern::single(attribute, value),
                rows,
            })
            .collect()
    }

    /// Size-(n+1) candidates formed by adding one condition to `parent`.
    ///
    /// Only attributes beyond the parent's last constrained attribute are
    /// considered, and only values observed among the parent's supporting
    /// records. Candidates come out sorted by (attribute, value).
    pub fn extend(&self, parent: &CountedPattern) -> Vec<CountedPattern> {
        let Some(last) = parent.pattern.last_attribute() else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for attribute in self.table.schema().attributes() {
            if attribute <= last {
                continue;
            }
            let mut groups: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
            for &row in &parent.rows {
                if let Some(value) = self.table.value(row as usize, attribute) {
                    groups.entry(value).or_default().push(row);
                }
            }
            for (value, rows) in groups {
                candidates.push(CountedPattern {
                    pattern: parent.pattern.extended(attribute, value),
                    rows,
                });
            }
        }
        candidates
    }

    /// Counts a pattern's support with a full table scan.
    ///
    /// The miner never needs this (it counts incrementally); it exists as
    /// the reference implementation the incremental path is tested against.
    pub fn support(&self, pattern: &Pattern) -> u64 {
        self.table
            .records()
            .iter()
            .filter(|record| pattern.matches(record))
            .count() as u64
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use galena_types::Record;
    use proptest::prelude::*;

    use super::*;

    fn table(records: Vec<Record>, attrs: &[&str]) -> AttributeTable {
        let selected: BTreeSet<String> = attrs.iter().map(ToString::to_string).collect();
        AttributeTable::from_records(&records, &selected).unwrap()
    }

    fn course_table() -> AttributeTable {
        table(
            vec![
                Record::from([("op", "read"), ("role", "ta")]),
                Record::from([("op", "read"), ("role", "ta")]),
                Record::from([("op", "read"), ("role", "ta")]),
                Record::from([("op", "write"), ("role", "prof")]),
            ],
            &["op", "role"],
        )
    }

    #[test]
    fn test_seed_level_counts() {
        let table = course_table();
        let lattice = PatternLattice::new(&table);
        let seeds = lattice.seed_level();

        let rendered: Vec<(String, u64)> = seeds
            .iter()
            .map(|c| (c.pattern.render(), c.support()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("op = read".to_string(), 3),
                ("op = write".to_string(), 1),
                ("role = prof".to_string(), 1),
                ("role = ta".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_extend_counts_over_parent_rows_only() {
        let table = course_table();
        let lattice = PatternLattice::new(&table);
        let seeds = lattice.seed_level();

        let read = seeds
            .iter()
            .find(|c| c.pattern.render() == "op = read")
            .unwrap();
        let children = lattice.extend(read);

        assert_eq!(children.len(), 1, "only co-occurring values generated");
        assert_eq!(children[0].pattern.render(), "op = read \u{2227} role = ta");
        assert_eq!(children[0].support(), 3);
    }

    #[test]
    fn test_extend_only_moves_forward() {
        let table = course_table();
        let lattice = PatternLattice::new(&table);

        // `role` is the last attribute, so a role-seeded pattern has no
        // extensions; {op, role} sets are generated from `op` seeds only.
        let seeds = lattice.seed_level();
        let role_ta = seeds
            .iter()
            .find(|c| c.pattern.render() == "role = ta")
            .unwrap();
        assert!(lattice.extend(role_ta).is_empty());
    }

    #[test]
    fn test_no_duplicate_condition_sets() {
        let table = table(
            vec![
                Record::from([("a", "1"), ("b", "1"), ("c", "1")]),
                Record::from([("a", "1"), ("b", "2"), ("c", "1")]),
                Record::from([("a", "2"), ("b", "1"), ("c", "2")]),
            ],
            &["a", "b", "c"],
        );
        let lattice = PatternLattice::new(&table);

        let mut seen = BTreeSet::new();
        let mut level = lattice.seed_level();
        while !level.is_empty() {
            for counted in &level {
                assert!(
                    seen.insert(counted.pattern.clone()),
                    "duplicate candidate {}",
                    counted.pattern
                );
            }
            level = level.iter().flat_map(|c| lattice.extend(c)).collect();
        }
    }

    #[test]
    fn test_incremental_support_matches_full_scan() {
        let table = table(
            vec![
                Record::from([("a", "1"), ("b", "1"), ("c", "2")]),
                Record::from([("a", "1"), ("b", "2"), ("c", "2")]),
                Record::from([("a", "2"), ("b", "1"), ("c", "1")]),
                Record::from([("a", "1"), ("b", "1"), ("c", "1")]),
            ],
            &["a", "b", "c"],
        );
        let lattice = PatternLattice::new(&table);

        let mut level = lattice.seed_level();
        while !level.is_empty() {
            for counted in &level {
                assert_eq!(counted.support(), lattice.support(&counted.pattern));
            }
            level = level.iter().flat_map(|c| lattice.extend(c)).collect();
        }
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
        fn prop_support_is_antimonotone(records in arb_records()) {
            let table = table(records, &["a", "b", "c"]);
            let lattice = PatternLattice::new(&table);

            // Adding a condition can only shrink the matching record set,
            // on every parent-to-child edge of the lattice.
            let mut level = lattice.seed_level();
            while !level.is_empty() {
                let mut next = Vec::new();
                for parent in &level {
                    for child in lattice.extend(parent) {
                        prop_assert!(child.support() <= parent.support());
                        next.push(child);
                    }
                }
                level = next;
            }
        }
    }
}
