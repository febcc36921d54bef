//! Ingest and view-evaluation benchmarks.
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shardpulse::{EventDims, HalfEvent, Stamp, WindowBuffer};

const W: i64 = 1_535_065_340_000;
const DELTA: i64 = 5_000;
const HORIZON: i64 = 600_000;

fn workload(pairs: usize) -> Vec<HalfEvent> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let ops = ["shardquery", "shardfetch", "shardbulk"];
    let mut events = Vec::with_capacity(pairs * 2);
    for pair in 0..pairs {
        let dims = EventDims {
            shard: Some(format!("{}", rng.gen_range(0..4))),
            index: Some("metricbeat".to_owned()),
            rid: Some(format!("r{pair}")),
            tid: Some(format!("t{}", rng.gen_range(0..16))),
            op: Some(ops[rng.gen_range(0..ops.len())].to_owned()),
            role: Some("Primary".to_owned()),
            doc_count: None,
        };
        let st = W + rng.gen_range(0..DELTA - 500);
        let et = st + rng.gen_range(0..500);
        events.push(HalfEvent::new(Stamp::Start(st), dims.clone()));
        events.push(HalfEvent::new(Stamp::End(et), dims));
    }
    events
}

fn filled(events: &[HalfEvent]) -> WindowBuffer {
    let buffer = WindowBuffer::new(W, DELTA, HORIZON, None).unwrap();
    buffer.put_batch(events).unwrap();
    buffer
}

fn bench_ingest(c: &mut Criterion) {
    let events = workload(5_000);
    let mut group = c.benchmark_group("ingest");
    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("put_batch_10k", |b| {
        b.iter(|| {
            let buffer = filled(black_box(&events));
            black_box(buffer.len())
        })
    });
    group.bench_function("put_start_singly_10k", |b| {
        b.iter(|| {
            let buffer = WindowBuffer::new(W, DELTA, HORIZON, None).unwrap();
            for event in &events {
                match event.stamp {
                    Stamp::Start(st) => buffer.put_start(st, event.dims.clone()).unwrap(),
                    Stamp::End(et) => buffer.put_end(et, event.dims.clone()).unwrap(),
                }
            }
            black_box(buffer.len())
        })
    });
    group.finish();
}

fn bench_views(c: &mut Criterion) {
    let buffer = filled(&workload(5_000));
    let mut group = c.benchmark_group("views");
    group.bench_function("coalesce_10k", |b| {
        b.iter(|| black_box(buffer.fetch_coalesced().len()))
    });
    group.bench_function("latency_by_op_10k", |b| {
        b.iter(|| black_box(buffer.fetch_latency_by_op().len()))
    });
    group.bench_function("thread_utilization_10k", |b| {
        b.iter(|| black_box(buffer.fetch_thread_utilization_ratio().len()))
    });
    group.bench_function("inflight_10k", |b| {
        b.iter(|| black_box(buffer.fetch_inflight().len()))
    });
    group.finish();
}

criterion_group!(benches, bench_ingest, bench_views);
criterion_main!(benches);
