//! Clamping of request intervals to the window bounds.

use serde::Serialize;
use tracing::warn;

use crate::model::EpochMs;
use crate::views::CoalescedRecord;

/// A request interval clamped to `[W, W+interval]`, with the time spent
/// inside the window attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClippedRecord {
    /// Request id.
    pub rid: String,
    /// Operation name.
    pub op: String,
    /// Shard identifier.
    pub shard: Option<String>,
    /// Index name.
    pub index: Option<String>,
    /// Thread id.
    pub tid: Option<String>,
    /// Shard role.
    pub role: Option<String>,
    /// Documents processed.
    pub doc_count: Option<i64>,
    /// Clamped start, `>= W`.
    pub st: EpochMs,
    /// Clamped end, `<= W + interval`.
    pub et: EpochMs,
    /// Time spent inside the window, `et - st`.
    pub lat: EpochMs,
}

/// Clamps every coalesced record to the window `[window_start,
/// window_start + interval]`.
///
/// A missing start means the request was already running when the window
/// opened and clamps to `window_start`; a missing end means it was still
/// running when the window closed and clamps to the window end. An interval
/// that lies entirely outside the window collapses to a zero-length stay at
/// the nearer bound. Records with an observed `et < st` are malformed and
/// skipped.
pub fn clipped_window(
    records: &[CoalescedRecord],
    window_start: EpochMs,
    interval: EpochMs,
) -> Vec<ClippedRecord> {
    let window_end = window_start + interval;
    let mut malformed = 0u64;
    let mut clipped: Vec<ClippedRecord> = records
        .iter()
        .filter_map(|record| {
            if let (Some(st), Some(et)) = (record.st, record.et) {
                if et < st {
                    malformed += 1;
                    return None;
                }
            }
            let st = record.st.unwrap_or(window_start).clamp(window_start, window_end);
            let et = record.et.unwrap_or(window_end).clamp(window_start, window_end);
            Some(ClippedRecord {
                rid: record.rid.clone(),
                op: record.op.clone(),
                shard: record.shard.clone(),
                index: record.index.clone(),
                tid: record.tid.clone(),
                role: record.role.clone(),
                doc_count: record.doc_count,
                st,
                et,
                lat: et - st,
            })
        })
        .collect();
    if malformed > 0 {
        warn!(malformed, window_start, "records with et < st skipped by clipper");
    }
    clipped.sort_by(|a, b| (&a.rid, &a.op).cmp(&(&b.rid, &b.op)));
    clipped
}
