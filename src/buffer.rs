//! Append-only event buffer for one sampling window.

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{Result, SnapshotError};
use crate::model::{EpochMs, EventDims, EventRow, HalfEvent, Stamp};
use crate::views::{
    self, ClippedRecord, CoalescedRecord, LatencyRecord, OpAggregate, UtilizationRecord,
};

/// Event storage for the window `[window_start, window_start + interval)`.
///
/// Producers append half-events concurrently; a mutex serializes appends
/// and nothing else. Readers clone the row vector under the same mutex and
/// evaluate views over that snapshot, so a view never observes a torn batch
/// and concurrent inserts after the snapshot are not reflected.
///
/// A buffer lives for exactly one window: the engine creates it at the
/// window start, carries its inflight records into the successor at the
/// boundary, and drops it once its views have been published.
#[derive(Debug)]
pub struct WindowBuffer {
    window_start: EpochMs,
    interval: EpochMs,
    expiry_horizon: EpochMs,
    max_rows: Option<usize>,
    rows: Mutex<Vec<EventRow>>,
}

impl WindowBuffer {
    /// Creates an empty buffer for the window starting at `window_start`.
    ///
    /// `window_start` must be a multiple of `interval`.
    pub fn new(
        window_start: EpochMs,
        interval: EpochMs,
        expiry_horizon: EpochMs,
        max_rows: Option<usize>,
    ) -> Result<Self> {
        if interval <= 0 {
            return Err(SnapshotError::InvalidArgument(
                "window interval must be positive".into(),
            ));
        }
        if window_start.rem_euclid(interval) != 0 {
            return Err(SnapshotError::InvalidArgument(format!(
                "window start {window_start} is not aligned to {interval}"
            )));
        }
        Ok(Self {
            window_start,
            interval,
            expiry_horizon,
            max_rows,
            rows: Mutex::new(Vec::new()),
        })
    }

    /// The window start `W`.
    pub fn window_start(&self) -> EpochMs {
        self.window_start
    }

    /// The exclusive window end `W + interval`.
    pub fn window_end(&self) -> EpochMs {
        self.window_start + self.interval
    }

    /// Display name of the buffer, used in logs and the replay tool.
    pub fn table_name(&self) -> String {
        format!("shard_rq_{}", self.window_start)
    }

    /// Appends a start marker.
    pub fn put_start(&self, st: EpochMs, dims: EventDims) -> Result<()> {
        self.append(&[HalfEvent::new(Stamp::Start(st), dims)])
    }

    /// Appends an end marker.
    pub fn put_end(&self, et: EpochMs, dims: EventDims) -> Result<()> {
        self.append(&[HalfEvent::new(Stamp::End(et), dims)])
    }

    /// Appends a batch of half-events under a single lock acquisition.
    ///
    /// The batch is all-or-nothing: when the row cap would be exceeded the
    /// whole batch is rejected and the buffer is unchanged.
    pub fn put_batch(&self, events: &[HalfEvent]) -> Result<()> {
        self.append(events)
    }

    fn append(&self, events: &[HalfEvent]) -> Result<()> {
        let mut rows = self.rows.lock();
        if let Some(cap) = self.max_rows {
            if rows.len() + events.len() > cap {
                return Err(SnapshotError::Ingest(format!(
                    "row cap {cap} reached on {}",
                    self.table_name()
                )));
            }
        }
        rows.extend(events.iter().cloned().map(EventRow::from_event));
        Ok(())
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    /// Whether the buffer holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    /// Raw dump of the stored rows, in insertion order. Debug surface.
    pub fn fetch_all(&self) -> Vec<EventRow> {
        self.rows.lock().clone()
    }

    /// One merged record per `(rid, op)`.
    pub fn fetch_coalesced(&self) -> Vec<CoalescedRecord> {
        views::group_by_rid_op(&self.fetch_all())
    }

    /// Unclipped latency of completed requests.
    pub fn fetch_latency(&self) -> Vec<LatencyRecord> {
        views::latency(&self.fetch_coalesced())
    }

    /// Latency aggregated per `(shard, index, op, role)`.
    pub fn fetch_latency_by_op(&self) -> Vec<OpAggregate> {
        views::latency_by_op(&self.fetch_latency())
    }

    /// Time spent inside this window, per request.
    pub fn fetch_time_spent(&self) -> Vec<ClippedRecord> {
        views::clipped_window(&self.fetch_coalesced(), self.window_start, self.interval)
    }

    /// Per-request share of its thread's busy time inside this window.
    pub fn fetch_thread_utilization_ratio(&self) -> Vec<UtilizationRecord> {
        views::thread_utilization(&self.fetch_time_spent())
    }

    /// Open records that should be carried into the next window.
    pub fn fetch_inflight(&self) -> Vec<CoalescedRecord> {
        views::inflight(
            &self.fetch_coalesced(),
            self.window_start,
            self.expiry_horizon,
        )
    }

    /// Copies `prev`'s inflight records into this buffer as start-only
    /// events, preserving their original start timestamps and dimensions.
    ///
    /// Returns the number of carried records. On failure this buffer may
    /// hold none of the batch but never part of it.
    pub fn rollover_inflight(&self, prev: &WindowBuffer) -> Result<usize> {
        let carried = prev.fetch_inflight();
        if carried.is_empty() {
            return Ok(0);
        }
        let events: Vec<HalfEvent> = carried
            .iter()
            .filter_map(|record| {
                let Some(st) = record.st else {
                    warn!(rid = %record.rid, "inflight record without st skipped");
                    return None;
                };
                Some(HalfEvent::new(
                    Stamp::Start(st),
                    EventDims {
                        shard: record.shard.clone(),
                        index: record.index.clone(),
                        rid: Some(record.rid.clone()),
                        tid: record.tid.clone(),
                        op: Some(record.op.clone()),
                        role: record.role.clone(),
                        doc_count: record.doc_count,
                    },
                ))
            })
            .collect();
        let count = events.len();
        self.put_batch(&events)
            .map_err(|e| SnapshotError::Rollover(format!("inflight carry-over failed: {e}")))?;
        Ok(count)
    }
}
