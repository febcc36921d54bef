//! Detection of genuinely inflight requests at window close.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::warn;

use crate::model::EpochMs;
use crate::views::CoalescedRecord;

/// Selects the open records that should be carried into the next window.
///
/// A record is a carry-over candidate when a start was observed but no end,
/// and the start is younger than the expiry horizon. Candidates are then
/// disambiguated per thread: a thread runs one request at a time, so among
/// all records of a thread only the one bearing the newest observed start
/// can still be running. Older open starts lost their end event and are
/// dropped as orphans, as is any open start superseded by a newer record
/// that already completed on the same thread.
///
/// The output carries the original dimensions with `et` unset, ready to be
/// re-inserted into the successor buffer as start-only events. At most one
/// record per thread is returned.
pub fn inflight(
    records: &[CoalescedRecord],
    window_start: EpochMs,
    expiry_horizon: EpochMs,
) -> Vec<CoalescedRecord> {
    let stale_floor = window_start - expiry_horizon;

    // Newest start observed per thread, across open and completed records.
    let mut latest: FxHashMap<&str, EpochMs> = FxHashMap::default();
    for record in records {
        if let (Some(tid), Some(st)) = (record.tid.as_deref(), record.st) {
            let newest = latest.entry(tid).or_insert(st);
            *newest = (*newest).max(st);
        }
    }

    let mut per_thread: FxHashMap<&str, SmallVec<[&CoalescedRecord; 2]>> = FxHashMap::default();
    let mut expired = 0u64;
    for record in records {
        let (Some(st), None) = (record.st, record.et) else {
            continue;
        };
        let Some(tid) = record.tid.as_deref() else {
            warn!(rid = %record.rid, "open record without tid dropped at rollover");
            continue;
        };
        if st <= stale_floor {
            expired += 1;
            continue;
        }
        if latest.get(tid) == Some(&st) {
            per_thread.entry(tid).or_default().push(record);
        }
    }
    if expired > 0 {
        warn!(expired, window_start, "stale open records expired at rollover");
    }

    let mut carried: Vec<CoalescedRecord> = per_thread
        .into_iter()
        .filter_map(|(tid, candidates)| {
            if candidates.len() > 1 {
                warn!(
                    tid,
                    candidates = candidates.len(),
                    "multiple open starts share a thread's newest instant, keeping one"
                );
            }
            candidates
                .into_iter()
                .max_by(|a, b| (&a.rid, &a.op).cmp(&(&b.rid, &b.op)))
                .cloned()
        })
        .collect();
    carried.sort_by(|a, b| (&a.rid, &a.op).cmp(&(&b.rid, &b.op)));
    carried
}
