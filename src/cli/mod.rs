//! Offline replay of recorded event logs.
//!
//! The replay tool feeds half-events from a CSV or JSON-lines file through
//! a [`SnapshotEngine`], window by window, and reports the views each
//! window would have published. It stands in for the downstream metrics
//! writer as a debugging surface.
//!
//! Input columns/fields use the producer vocabulary: `kind`
//! (`start`/`end`), `ts` (epoch-ms), then any of `ShardID`, `IndexName`,
//! `rid`, `tid`, `Operation`, `ShardRole`, `DocCount`.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use nu_ansi_term::{Color, Style};
use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;

use crate::config::Config;
use crate::engine::SnapshotEngine;
use crate::error::{Result, SnapshotError};
use crate::metrics::StatsSnapshot;
use crate::model::{EpochMs, EventDims, HalfEvent, Stamp};
use crate::views::{CoalescedRecord, LatencyRecord, OpAggregate, UtilizationRecord};

const WINDOW_FMT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");

/// Input file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Pick by file extension (`.csv` vs anything else).
    Auto,
    /// Comma-separated values with a header row.
    Csv,
    /// One JSON object per line.
    JsonLines,
}

/// Which views to print in text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Every view.
    All,
    /// Per-request latency.
    Latency,
    /// Per-operation aggregates.
    LatencyByOp,
    /// Per-thread utilization ratios.
    Utilization,
    /// Records carried into the successor window.
    Inflight,
}

/// Replay parameters.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Event log to replay.
    pub path: PathBuf,
    /// Input layout.
    pub input: InputFormat,
    /// Engine configuration.
    pub config: Config,
}

/// Views published by one closed window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowReport {
    /// Window start, epoch-ms.
    pub window_start: EpochMs,
    /// Buffer display name.
    pub table: String,
    /// Rows stored in the window.
    pub rows: usize,
    /// Per-request latency.
    pub latency: Vec<LatencyRecord>,
    /// Per-operation aggregates.
    pub latency_by_op: Vec<OpAggregate>,
    /// Per-thread utilization ratios.
    pub utilization: Vec<UtilizationRecord>,
    /// Records carried into the successor window.
    pub inflight: Vec<CoalescedRecord>,
}

/// Outcome of a full replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// One report per closed window, oldest first.
    pub windows: Vec<WindowReport>,
    /// Input lines that failed to parse and were skipped.
    pub skipped_lines: u64,
    /// Engine counters at end of replay.
    pub stats: StatsSnapshot,
}

/// Replays an event log through a fresh engine.
///
/// Events are routed by their own timestamps, so the log's ordering
/// reproduces the live arrival order. Unparseable lines are skipped with a
/// warning; ingest failures are dropped by the engine as they would be
/// live.
pub fn run_replay(options: &ReplayOptions) -> Result<ReplayReport> {
    let events = read_events(&options.path, options.input)?;
    let mut skipped = events.skipped;
    let Some(first) = events.rows.first() else {
        return Err(SnapshotError::InvalidArgument(format!(
            "{} holds no parseable events",
            options.path.display()
        )));
    };

    let engine = SnapshotEngine::new(options.config.clone(), first.0)?;
    let mut windows: Vec<WindowReport> = Vec::new();
    let mut last_ts = first.0;
    for (ts, event) in &events.rows {
        let outcome = match event.stamp {
            Stamp::Start(st) => engine.put_start_at(*ts, st, event.dims.clone()),
            Stamp::End(et) => engine.put_end_at(*ts, et, event.dims.clone()),
        };
        if outcome.is_err() {
            skipped += 1;
        }
        last_ts = last_ts.max(*ts);
        drain(&engine, &mut windows);
    }
    // Close the final window.
    engine.advance_to(last_ts + options.config.sampling_interval_ms)?;
    drain(&engine, &mut windows);

    Ok(ReplayReport {
        windows,
        skipped_lines: skipped,
        stats: engine.stats(),
    })
}

fn drain(engine: &SnapshotEngine, windows: &mut Vec<WindowReport>) {
    for sealed in engine.take_sealed() {
        let buffer = sealed.buffer();
        windows.push(WindowReport {
            window_start: buffer.window_start(),
            table: buffer.table_name(),
            rows: buffer.len(),
            latency: buffer.fetch_latency(),
            latency_by_op: buffer.fetch_latency_by_op(),
            utilization: buffer.fetch_thread_utilization_ratio(),
            inflight: buffer.fetch_inflight(),
        });
    }
}

struct ParsedEvents {
    rows: Vec<(EpochMs, HalfEvent)>,
    skipped: u64,
}

fn read_events(path: &Path, input: InputFormat) -> Result<ParsedEvents> {
    let format = match input {
        InputFormat::Auto => {
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                InputFormat::Csv
            } else {
                InputFormat::JsonLines
            }
        }
        other => other,
    };
    match format {
        InputFormat::Csv => read_csv(path),
        _ => read_json_lines(path),
    }
}

fn stamp_for(kind: &str, ts: EpochMs) -> Option<Stamp> {
    match kind {
        "start" => Some(Stamp::Start(ts)),
        "end" => Some(Stamp::End(ts)),
        _ => None,
    }
}

fn read_csv(path: &Path) -> Result<ParsedEvents> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| SnapshotError::InvalidArgument(format!("cannot read csv: {e}")))?;
    let headers = reader
        .headers()
        .map_err(|e| SnapshotError::InvalidArgument(format!("bad csv header: {e}")))?
        .clone();
    let mut rows = Vec::new();
    let mut skipped = 0u64;
    for (line, record) in reader.records().enumerate() {
        let Ok(record) = record else {
            warn!(line, "unreadable csv record skipped");
            skipped += 1;
            continue;
        };
        let mut kind = None;
        let mut ts = None;
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            match header {
                "kind" => kind = Some(value),
                "ts" => ts = value.parse::<EpochMs>().ok(),
                _ => pairs.push((header, value)),
            }
        }
        let stamp = kind.zip(ts).and_then(|(kind, ts)| stamp_for(kind, ts));
        match stamp {
            Some(stamp) => rows.push((
                stamp.start().or(stamp.end()).unwrap_or_default(),
                HalfEvent::new(stamp, EventDims::from_pairs(pairs)),
            )),
            None => {
                warn!(line, "csv record without valid kind/ts skipped");
                skipped += 1;
            }
        }
    }
    Ok(ParsedEvents { rows, skipped })
}

#[derive(Debug, Deserialize)]
struct JsonEvent {
    kind: String,
    ts: EpochMs,
    #[serde(rename = "ShardID", default)]
    shard: Option<String>,
    #[serde(rename = "IndexName", default)]
    index: Option<String>,
    #[serde(default)]
    rid: Option<String>,
    #[serde(default)]
    tid: Option<String>,
    #[serde(rename = "Operation", default)]
    op: Option<String>,
    #[serde(rename = "ShardRole", default)]
    role: Option<String>,
    #[serde(rename = "DocCount", default)]
    doc_count: Option<i64>,
}

fn read_json_lines(path: &Path) -> Result<ParsedEvents> {
    let file = File::open(path)?;
    let mut rows = Vec::new();
    let mut skipped = 0u64;
    for (line, text) in BufReader::new(file).lines().enumerate() {
        let text = text?;
        if text.trim().is_empty() {
            continue;
        }
        let parsed: std::result::Result<JsonEvent, _> = serde_json::from_str(&text);
        let event = match parsed {
            Ok(event) => event,
            Err(e) => {
                warn!(line, error = %e, "unreadable json line skipped");
                skipped += 1;
                continue;
            }
        };
        let Some(stamp) = stamp_for(&event.kind, event.ts) else {
            warn!(line, kind = %event.kind, "json line with unknown kind skipped");
            skipped += 1;
            continue;
        };
        let dims = EventDims {
            shard: event.shard,
            index: event.index,
            rid: event.rid,
            tid: event.tid,
            op: event.op,
            role: event.role,
            doc_count: event.doc_count,
        };
        rows.push((event.ts, HalfEvent::new(stamp, dims)));
    }
    Ok(ParsedEvents { rows, skipped })
}

/// Serializes the full report as pretty JSON.
pub fn render_json(report: &ReplayReport, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)
        .map_err(|e| SnapshotError::View(format!("cannot serialize report: {e}")))?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Prints the selected views of every window as text tables.
pub fn render_text(
    report: &ReplayReport,
    view: ViewKind,
    color: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    let heading = if color {
        Style::new().bold()
    } else {
        Style::new()
    };
    let dim = if color {
        Style::new().fg(Color::DarkGray)
    } else {
        Style::new()
    };
    for window in &report.windows {
        writeln!(
            out,
            "{} {}",
            heading.paint(window.table.as_str()),
            dim.paint(format!(
                "({}, {} rows)",
                format_window(window.window_start),
                window.rows
            ))
        )?;
        if matches!(view, ViewKind::All | ViewKind::Latency) {
            writeln!(out, "  latency:")?;
            for row in &window.latency {
                writeln!(
                    out,
                    "    {:<12} {:<12} {:>8} ms  docs={}",
                    row.rid,
                    row.op,
                    row.lat,
                    row.doc_count.unwrap_or(0)
                )?;
            }
        }
        if matches!(view, ViewKind::All | ViewKind::LatencyByOp) {
            writeln!(out, "  latency by op:")?;
            for agg in &window.latency_by_op {
                writeln!(
                    out,
                    "    {:<12} shard={:<4} index={:<12} role={:<8} \
                     count={} sum={} avg={:.1} min={} max={} docs={}",
                    agg.op,
                    agg.shard.as_deref().unwrap_or("-"),
                    agg.index.as_deref().unwrap_or("-"),
                    agg.role.as_deref().unwrap_or("-"),
                    agg.count,
                    agg.sum_lat,
                    agg.avg_lat,
                    agg.min_lat,
                    agg.max_lat,
                    agg.doc_count
                )?;
            }
        }
        if matches!(view, ViewKind::All | ViewKind::Utilization) {
            writeln!(out, "  thread utilization:")?;
            for row in &window.utilization {
                writeln!(
                    out,
                    "    {:<12} {:<12} {:<12} {:>8} / {:<8} = {:.4}",
                    row.tid, row.rid, row.op, row.lat, row.thread_time, row.util
                )?;
            }
        }
        if matches!(view, ViewKind::All | ViewKind::Inflight) {
            writeln!(out, "  inflight:")?;
            for record in &window.inflight {
                writeln!(
                    out,
                    "    {:<12} {:<12} tid={:<12} st={}",
                    record.rid,
                    record.op,
                    record.tid.as_deref().unwrap_or("-"),
                    record.st.unwrap_or_default()
                )?;
            }
        }
    }
    writeln!(
        out,
        "{}",
        dim.paint(format!(
            "{} windows, {} events ingested, {} dropped, {} lines skipped",
            report.windows.len(),
            report.stats.events_ingested,
            report.stats.events_dropped,
            report.skipped_lines
        ))
    )?;
    Ok(())
}

fn format_window(ms: EpochMs) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
        .ok()
        .and_then(|instant| instant.format(WINDOW_FMT).ok())
        .unwrap_or_else(|| ms.to_string())
}
