//! # Shardpulse - Shard-Request Metrics Snapshots
//!
//! Shardpulse turns per-shard request events (start and end markers) into
//! per-window aggregated metrics: request latency, per-operation
//! aggregates, and a per-thread utilization ratio.
//!
//! Events arrive as half-events (a start or an end, never both) out of
//! order and possibly across window boundaries. Each sampling window owns
//! an append-only buffer; derived views coalesce the halves into request
//! records, clamp them to the window, and aggregate. At each window flip
//! the engine carries genuinely inflight requests into the next window and
//! discards orphans whose end event was lost, using the fact that a thread
//! runs one request at a time.
//!
//! ## Quick Start
//!
//! ```rust
//! use shardpulse::{Config, EventDims, SnapshotEngine};
//!
//! let engine = SnapshotEngine::new(Config::default(), 1_535_065_340_000)?;
//!
//! let dims = EventDims {
//!     rid: Some("a1".into()),
//!     tid: Some("search-3".into()),
//!     op: Some("shardquery".into()),
//!     ..EventDims::default()
//! };
//!
//! // A request observed twice, 295 ms apart.
//! engine.put_start_at(1_535_065_340_330, 1_535_065_340_330, dims.clone())?;
//! engine.put_end_at(1_535_065_340_625, 1_535_065_340_625, dims)?;
//!
//! let latency = engine.current().fetch_latency();
//! assert_eq!(latency[0].lat, 295);
//! # Ok::<(), shardpulse::SnapshotError>(())
//! ```
//!
//! ## Architecture
//!
//! - **Buffer layer**: per-window append-only row storage with serialized
//!   ingest ([`WindowBuffer`])
//! - **View layer**: pure relational-style operators over a row snapshot
//!   ([`views`])
//! - **Engine layer**: wall-clock window routing, rollover and buffer
//!   lifetime ([`SnapshotEngine`])
//! - **Tooling**: event-log replay CLI ([`cli`])

pub mod buffer;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod views;

// Re-export the main public API
pub use crate::buffer::WindowBuffer;
pub use crate::config::Config;
pub use crate::engine::{SealedWindow, SnapshotEngine};
pub use crate::error::{Result, SnapshotError};
pub use crate::metrics::{EngineStats, StatsSnapshot};
pub use crate::model::{EpochMs, EventDims, EventRow, HalfEvent, Stamp};
