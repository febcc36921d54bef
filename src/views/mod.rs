//! Derived views over a window buffer.
//!
//! Each view is a pure function over an immutable row snapshot, composed in
//! the same order the engine publishes them: raw rows are coalesced per
//! `(rid, op)`, the coalesced records feed the latency and clipping views,
//! and the clipped records feed the thread-utilization view. The inflight
//! view runs at rollover time only.

mod clip;
mod coalesce;
mod inflight;
mod latency;
mod utilization;

pub use clip::{clipped_window, ClippedRecord};
pub use coalesce::{group_by_rid_op, CoalescedRecord};
pub use inflight::inflight;
pub use latency::{latency, latency_by_op, LatencyRecord, OpAggregate};
pub use utilization::{thread_utilization, UtilizationRecord};
