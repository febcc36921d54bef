//! Property tests over randomly generated half-event streams.

use std::collections::HashSet;

use proptest::prelude::*;
use shardpulse::{EventDims, HalfEvent, Stamp, WindowBuffer};

const W: i64 = 1_535_065_340_000;
const DELTA: i64 = 5_000;
const HORIZON: i64 = 600_000;

fn arb_event() -> impl Strategy<Value = HalfEvent> {
    (
        "[a-e]",
        "[w-z]",
        prop_oneof![
            Just("shardquery"),
            Just("shardfetch"),
            Just("shardbulk"),
        ],
        -700_000i64..2 * DELTA,
        any::<bool>(),
        proptest::option::of(0i64..500),
    )
        .prop_map(|(rid, tid, op, offset, is_start, doc_count)| {
            let dims = EventDims {
                shard: Some("1".to_owned()),
                index: Some("metricbeat".to_owned()),
                rid: Some(rid),
                tid: Some(tid),
                op: Some(op.to_owned()),
                role: Some("Primary".to_owned()),
                doc_count,
            };
            let stamp = if is_start {
                Stamp::Start(W + offset)
            } else {
                Stamp::End(W + offset)
            };
            HalfEvent::new(stamp, dims)
        })
}

fn filled_buffer(events: &[HalfEvent]) -> WindowBuffer {
    let buffer = WindowBuffer::new(W, DELTA, HORIZON, None).unwrap();
    buffer.put_batch(events).unwrap();
    buffer
}

proptest! {
    #[test]
    fn coalescing_yields_one_record_per_rid_op(events in prop::collection::vec(arb_event(), 0..120)) {
        let buffer = filled_buffer(&events);
        let records = buffer.fetch_coalesced();
        let mut keys = HashSet::new();
        for record in &records {
            prop_assert!(keys.insert((record.rid.clone(), record.op.clone())));
        }
    }

    #[test]
    fn latency_is_never_negative(events in prop::collection::vec(arb_event(), 0..120)) {
        let buffer = filled_buffer(&events);
        for row in buffer.fetch_latency() {
            prop_assert!(row.lat >= 0);
        }
    }

    #[test]
    fn clipped_intervals_stay_inside_the_window(events in prop::collection::vec(arb_event(), 0..120)) {
        let buffer = filled_buffer(&events);
        for row in buffer.fetch_time_spent() {
            prop_assert!(W <= row.st);
            prop_assert!(row.st <= row.et);
            prop_assert!(row.et <= W + DELTA);
        }
    }

    #[test]
    fn utilization_sums_to_one_per_thread(events in prop::collection::vec(arb_event(), 0..120)) {
        let buffer = filled_buffer(&events);
        let rows = buffer.fetch_thread_utilization_ratio();
        let tids: HashSet<&str> = rows.iter().map(|row| row.tid.as_str()).collect();
        for tid in tids {
            let sum: f64 = rows
                .iter()
                .filter(|row| row.tid == tid)
                .map(|row| row.util)
                .sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "thread {} sums to {}", tid, sum);
        }
    }

    #[test]
    fn inflight_keeps_at_most_one_fresh_row_per_thread(events in prop::collection::vec(arb_event(), 0..120)) {
        let buffer = filled_buffer(&events);
        let mut tids = HashSet::new();
        for record in buffer.fetch_inflight() {
            prop_assert!(record.st.is_some());
            prop_assert!(record.et.is_none());
            prop_assert!(record.st.unwrap_or(i64::MIN) > W - HORIZON);
            let tid = record.tid.clone().unwrap_or_default();
            prop_assert!(tids.insert(tid));
        }
    }

    #[test]
    fn views_are_idempotent(events in prop::collection::vec(arb_event(), 0..60)) {
        let buffer = filled_buffer(&events);
        prop_assert_eq!(buffer.fetch_coalesced(), buffer.fetch_coalesced());
        prop_assert_eq!(buffer.fetch_latency(), buffer.fetch_latency());
        prop_assert_eq!(buffer.fetch_latency_by_op(), buffer.fetch_latency_by_op());
        prop_assert_eq!(buffer.fetch_time_spent(), buffer.fetch_time_spent());
        prop_assert_eq!(
            buffer.fetch_thread_utilization_ratio(),
            buffer.fetch_thread_utilization_ratio()
        );
        prop_assert_eq!(buffer.fetch_inflight(), buffer.fetch_inflight());
    }

    #[test]
    fn rollover_preserves_the_inflight_set(events in prop::collection::vec(arb_event(), 0..120)) {
        let buffer = filled_buffer(&events);
        let inflight = buffer.fetch_inflight();
        let next = WindowBuffer::new(W + DELTA, DELTA, HORIZON, None).unwrap();
        let carried = next.rollover_inflight(&buffer).unwrap();
        prop_assert_eq!(carried, inflight.len());
        let rows = next.fetch_all();
        prop_assert_eq!(rows.len(), inflight.len());
        for record in &inflight {
            prop_assert!(rows.iter().any(|row| {
                row.st == record.st
                    && row.et.is_none()
                    && row.dims.rid.as_deref() == Some(record.rid.as_str())
                    && row.dims.op.as_deref() == Some(record.op.as_str())
                    && row.dims.tid == record.tid
                    && row.dims.shard == record.shard
                    && row.dims.index == record.index
                    && row.dims.role == record.role
                    && row.dims.doc_count == record.doc_count
            }), "carried inflight record not found in rolled-over view");
        }
    }
}
