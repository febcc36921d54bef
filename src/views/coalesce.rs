//! Coalescing of half-events into one record per `(rid, op)`.

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::warn;

use crate::model::{EpochMs, EventRow};

/// One request record produced by merging all half-events of a `(rid, op)`
/// group.
///
/// The merge is a null-tolerant max per column: a start row contributes
/// `st`, an end row contributes `et`, and both carry the same dimensions.
/// Extra duplicates are tolerated and folded in the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoalescedRecord {
    /// Request id (group key).
    pub rid: String,
    /// Operation name (group key).
    pub op: String,
    /// Shard identifier.
    pub shard: Option<String>,
    /// Index name.
    pub index: Option<String>,
    /// Thread id.
    pub tid: Option<String>,
    /// Shard role.
    pub role: Option<String>,
    /// Start timestamp, if any half-event carried one.
    pub st: Option<EpochMs>,
    /// End timestamp, if any half-event carried one.
    pub et: Option<EpochMs>,
    /// Documents processed, if any half-event carried a count.
    pub doc_count: Option<i64>,
}

impl CoalescedRecord {
    fn seed(rid: String, op: String, row: &EventRow) -> Self {
        Self {
            rid,
            op,
            shard: row.dims.shard.clone(),
            index: row.dims.index.clone(),
            tid: row.dims.tid.clone(),
            role: row.dims.role.clone(),
            st: row.st,
            et: row.et,
            doc_count: row.dims.doc_count,
        }
    }

    fn absorb(&mut self, row: &EventRow) {
        merge_dim(&mut self.shard, &row.dims.shard, "shard", &self.rid);
        merge_dim(&mut self.index, &row.dims.index, "index", &self.rid);
        merge_dim(&mut self.tid, &row.dims.tid, "tid", &self.rid);
        merge_dim(&mut self.role, &row.dims.role, "role", &self.rid);
        self.st = max_opt(self.st, row.st);
        self.et = max_opt(self.et, row.et);
        self.doc_count = max_opt(self.doc_count, row.dims.doc_count);
    }
}

/// Groups buffer rows by `(rid, op)` and merges each group into a single
/// [`CoalescedRecord`].
///
/// Rows missing a request id or operation cannot be attributed to any
/// request and are skipped. Output is sorted by `(rid, op)` so repeated
/// evaluation over the same snapshot yields identical rows.
pub fn group_by_rid_op(rows: &[EventRow]) -> Vec<CoalescedRecord> {
    let mut groups: FxHashMap<(String, String), CoalescedRecord> = FxHashMap::default();
    let mut unattributed = 0u64;
    for row in rows {
        let (Some(rid), Some(op)) = (row.dims.rid.as_ref(), row.dims.op.as_ref()) else {
            unattributed += 1;
            continue;
        };
        match groups.entry((rid.clone(), op.clone())) {
            std::collections::hash_map::Entry::Occupied(mut entry) => entry.get_mut().absorb(row),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(CoalescedRecord::seed(rid.clone(), op.clone(), row));
            }
        }
    }
    if unattributed > 0 {
        warn!(unattributed, "rows without rid/op skipped by coalescer");
    }
    let mut records: Vec<CoalescedRecord> = groups.into_values().collect();
    records.sort_by(|a, b| (&a.rid, &a.op).cmp(&(&b.rid, &b.op)));
    records
}

/// Null-tolerant max: `max(NULL, x) = x`.
fn max_opt<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Merges a dimension column. All non-null values within a group are
/// expected equal; a conflict is reconciled by lexical max and logged.
fn merge_dim(current: &mut Option<String>, incoming: &Option<String>, column: &str, rid: &str) {
    match (current.as_ref(), incoming.as_ref()) {
        (None, Some(value)) => *current = Some(value.clone()),
        (Some(held), Some(value)) if held != value => {
            warn!(rid, column, held = %held, value = %value, "conflicting dimension in group, keeping max");
            if value > held {
                *current = Some(value.clone());
            }
        }
        _ => {}
    }
}
