//! Per-thread utilization ratios.

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::warn;

use crate::model::EpochMs;
use crate::views::ClippedRecord;

/// One request's share of its thread's busy time within the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationRecord {
    /// Request id.
    pub rid: String,
    /// Operation name.
    pub op: String,
    /// Thread id.
    pub tid: String,
    /// Time the request spent inside the window.
    pub lat: EpochMs,
    /// Total time its thread spent inside the window.
    pub thread_time: EpochMs,
    /// `lat / thread_time`.
    pub util: f64,
}

/// Joins clipped records with their per-thread totals and computes the
/// utilization ratio.
///
/// Rows without a thread id cannot be attributed and are skipped. Threads
/// whose total clipped time is zero (every contributing request collapsed
/// to a zero-length stay) are degenerate and excluded rather than emitting
/// NaN; for every remaining thread the ratios sum to 1.
pub fn thread_utilization(clipped: &[ClippedRecord]) -> Vec<UtilizationRecord> {
    let mut totals: FxHashMap<&str, EpochMs> = FxHashMap::default();
    let mut unattributed = 0u64;
    for row in clipped {
        match row.tid.as_deref() {
            Some(tid) => *totals.entry(tid).or_insert(0) += row.lat,
            None => unattributed += 1,
        }
    }
    if unattributed > 0 {
        warn!(unattributed, "rows without tid skipped by utilization view");
    }
    let mut rows: Vec<UtilizationRecord> = clipped
        .iter()
        .filter_map(|row| {
            let tid = row.tid.as_deref()?;
            let thread_time = *totals.get(tid)?;
            if thread_time == 0 {
                return None;
            }
            Some(UtilizationRecord {
                rid: row.rid.clone(),
                op: row.op.clone(),
                tid: tid.to_owned(),
                lat: row.lat,
                thread_time,
                util: row.lat as f64 / thread_time as f64,
            })
        })
        .collect();
    rows.sort_by(|a, b| (&a.tid, &a.rid, &a.op).cmp(&(&b.tid, &b.rid, &b.op)));
    rows
}
