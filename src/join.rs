// 🔗 Join Engine - left-join the three reports on entry_number
//
// The entry summary decides which rows exist. Secondary reports only add
// columns: one output row per primary row, matched or not.
//
// Collision policy: a non-key column that already exists in the joined
// table keeps the existing (primary-side) value. The secondary copy is
// dropped, never merged and never kept under a renamed header.

use crate::normalize::{SourceTable, KEY_COLUMN};
use crate::value::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, warn};

// ============================================================================
// JOINED TABLE
// ============================================================================

#[derive(Debug, Clone)]
pub struct JoinedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    key_index: usize,
}

impl JoinedTable {
    /// Start a join from the authoritative table.
    pub fn from_primary(primary: SourceTable) -> Self {
        let key_index = primary.key_index();
        JoinedTable {
            columns: primary.columns,
            rows: primary.rows,
            key_index,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn key(&self, row: usize) -> &str {
        self.rows[row][self.key_index].as_str().unwrap_or("")
    }
}

/// Outcome counters for one left join, used for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub matched: usize,
    pub unmatched: usize,
    pub duplicate_keys: usize,
    pub dropped_columns: Vec<String>,
}

// ============================================================================
// JOIN
// ============================================================================

/// Join the primary table with each secondary table in the order given.
///
/// The pipeline passes liquidation status first, then importer statement.
pub fn join(primary: SourceTable, secondaries: &[SourceTable]) -> JoinedTable {
    let mut joined = JoinedTable::from_primary(primary);
    for secondary in secondaries {
        let (next, _) = left_join(joined, secondary);
        joined = next;
    }
    joined
}

/// Left outer join of `base` with one secondary table.
///
/// When the secondary table repeats a key, the first occurrence wins so the
/// row count of `base` never changes.
pub fn left_join(mut base: JoinedTable, other: &SourceTable) -> (JoinedTable, JoinStats) {
    let mut stats = JoinStats::default();

    let mut carried: Vec<usize> = Vec::new();
    for (i, name) in other.columns.iter().enumerate() {
        if i == other.key_index() {
            continue;
        }
        if base.columns.iter().any(|c| c == name) {
            stats.dropped_columns.push(name.clone());
        } else {
            carried.push(i);
        }
    }

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(other.len());
    for row in 0..other.len() {
        match index.entry(other.key(row)) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(_) => stats.duplicate_keys += 1,
        }
    }

    let key_index = base.key_index;
    for row in base.rows.iter_mut() {
        let hit = row[key_index].as_str().and_then(|k| index.get(k).copied());
        match hit {
            Some(source_row) => {
                stats.matched += 1;
                row.extend(carried.iter().map(|&c| other.rows[source_row][c].clone()));
            }
            None => {
                stats.unmatched += 1;
                row.extend(carried.iter().map(|_| Value::Null));
            }
        }
    }

    base.columns
        .extend(carried.iter().map(|&c| other.columns[c].clone()));

    if stats.duplicate_keys > 0 {
        warn!(
            source = other.kind.name(),
            duplicates = stats.duplicate_keys,
            "repeated {} values; first occurrence used",
            KEY_COLUMN
        );
    }
    if !stats.dropped_columns.is_empty() {
        debug!(
            source = other.kind.name(),
            columns = ?stats.dropped_columns,
            "dropped colliding columns"
        );
    }
    debug!(
        source = other.kind.name(),
        matched = stats.matched,
        unmatched = stats.unmatched,
        "left join complete"
    );

    (base, stats)
}
