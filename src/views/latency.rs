//! Per-request latency and per-operation aggregates.

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::warn;

use crate::model::EpochMs;
use crate::views::CoalescedRecord;

/// Latency of one completed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatencyRecord {
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
    /// End-to-end latency, `et - st`.
    pub lat: EpochMs,
}

/// Aggregated latency for one `(shard, index, op, role)` group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpAggregate {
    /// Shard identifier.
    pub shard: Option<String>,
    /// Index name.
    pub index: Option<String>,
    /// Operation name.
    pub op: String,
    /// Shard role.
    pub role: Option<String>,
    /// Sum of latencies in the group.
    pub sum_lat: EpochMs,
    /// Mean latency in the group.
    pub avg_lat: f64,
    /// Minimum latency in the group.
    pub min_lat: EpochMs,
    /// Maximum latency in the group.
    pub max_lat: EpochMs,
    /// Number of contributing requests.
    pub count: u64,
    /// Total documents processed by the group.
    pub doc_count: i64,
}

/// Selects completed records and attaches `lat = et - st`.
///
/// Records missing either timestamp are still inflight or orphaned and do
/// not contribute; records with `et < st` are malformed and skipped.
pub fn latency(records: &[CoalescedRecord]) -> Vec<LatencyRecord> {
    let mut malformed = 0u64;
    let rows: Vec<LatencyRecord> = records
        .iter()
        .filter_map(|record| {
            let (st, et) = (record.st?, record.et?);
            if et < st {
                malformed += 1;
                return None;
            }
            Some(LatencyRecord {
                rid: record.rid.clone(),
                op: record.op.clone(),
                shard: record.shard.clone(),
                index: record.index.clone(),
                tid: record.tid.clone(),
                role: record.role.clone(),
                doc_count: record.doc_count,
                lat: et - st,
            })
        })
        .collect();
    if malformed > 0 {
        warn!(malformed, "records with et < st excluded from latency");
    }
    rows
}

type OpKey = (Option<String>, Option<String>, String, Option<String>);

/// Groups latency rows by `(shard, index, op, role)`.
///
/// Groups are only emitted for contributing requests, so every aggregate
/// has `count >= 1`.
pub fn latency_by_op(rows: &[LatencyRecord]) -> Vec<OpAggregate> {
    let mut groups: FxHashMap<OpKey, OpAggregate> = FxHashMap::default();
    for row in rows {
        let key = (
            row.shard.clone(),
            row.index.clone(),
            row.op.clone(),
            row.role.clone(),
        );
        let entry = groups.entry(key).or_insert_with(|| OpAggregate {
            shard: row.shard.clone(),
            index: row.index.clone(),
            op: row.op.clone(),
            role: row.role.clone(),
            sum_lat: 0,
            avg_lat: 0.0,
            min_lat: EpochMs::MAX,
            max_lat: EpochMs::MIN,
            count: 0,
            doc_count: 0,
        });
        entry.sum_lat += row.lat;
        entry.min_lat = entry.min_lat.min(row.lat);
        entry.max_lat = entry.max_lat.max(row.lat);
        entry.count += 1;
        entry.doc_count += row.doc_count.unwrap_or(0);
    }
    let mut aggregates: Vec<OpAggregate> = groups
        .into_values()
        .map(|mut agg| {
            agg.avg_lat = agg.sum_lat as f64 / agg.count as f64;
            agg
        })
        .collect();
    aggregates.sort_by(|a, b| {
        (&a.shard, &a.index, &a.op, &a.role).cmp(&(&b.shard, &b.index, &b.op, &b.role))
    });
    aggregates
}
