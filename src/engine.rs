//! Window routing and rollover control.

use std::mem;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::buffer::WindowBuffer;
use crate::config::Config;
use crate::error::Result;
use crate::metrics::{EngineStats, StatsSnapshot};
use crate::model::{EpochMs, EventDims, HalfEvent};

/// A buffer whose window has closed, retained until its views are
/// published.
///
/// Dropping the sealed window destroys the buffer. Sealed windows that stay
/// unconsumed past the rotation deadline are destroyed by the engine at the
/// next boundary, accepting a metric gap.
#[derive(Debug)]
pub struct SealedWindow {
    buffer: Arc<WindowBuffer>,
}

impl SealedWindow {
    /// Read-only access to the closed buffer and its views.
    pub fn buffer(&self) -> &WindowBuffer {
        &self.buffer
    }
}

struct EngineState {
    current: Arc<WindowBuffer>,
    sealed: Vec<SealedWindow>,
}

/// Entry point for producers and the analysis path.
///
/// The engine owns the active window buffer. Events are routed to a buffer
/// by the wall-clock instant of arrival: at each window boundary the engine
/// seals the closing buffer, copies its inflight records into a fresh
/// successor, and retains the sealed buffer for consumers to publish. The
/// swap is performed under the routing lock, so an event targets either the
/// old window or the new one, never both.
pub struct SnapshotEngine {
    config: Config,
    stats: EngineStats,
    state: Mutex<EngineState>,
}

impl SnapshotEngine {
    /// Creates an engine whose first window contains `now_ms`.
    pub fn new(config: Config, now_ms: EpochMs) -> Result<Self> {
        config.validate()?;
        let current = Arc::new(new_buffer(&config, config.window_start_for(now_ms))?);
        Ok(Self {
            config,
            stats: EngineStats::default(),
            state: Mutex::new(EngineState {
                current,
                sealed: Vec::new(),
            }),
        })
    }

    /// The engine configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current counter values.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// The buffer owning the active window.
    pub fn current(&self) -> Arc<WindowBuffer> {
        self.state.lock().current.clone()
    }

    /// Records a start marker, routed by the wall clock.
    pub fn put_start(&self, st: EpochMs, dims: EventDims) -> Result<()> {
        self.put_start_at(wall_clock_ms(), st, dims)
    }

    /// Records a start marker, routed by an explicit arrival instant.
    pub fn put_start_at(&self, now_ms: EpochMs, st: EpochMs, dims: EventDims) -> Result<()> {
        let buffer = self.route(now_ms)?;
        self.count(buffer.put_start(st, dims), 1)
    }

    /// Records an end marker, routed by the wall clock.
    pub fn put_end(&self, et: EpochMs, dims: EventDims) -> Result<()> {
        self.put_end_at(wall_clock_ms(), et, dims)
    }

    /// Records an end marker, routed by an explicit arrival instant.
    pub fn put_end_at(&self, now_ms: EpochMs, et: EpochMs, dims: EventDims) -> Result<()> {
        let buffer = self.route(now_ms)?;
        self.count(buffer.put_end(et, dims), 1)
    }

    /// Records a batch of half-events, routed by the wall clock.
    pub fn put_batch(&self, events: &[HalfEvent]) -> Result<()> {
        self.put_batch_at(wall_clock_ms(), events)
    }

    /// Records a batch of half-events, routed by an explicit arrival
    /// instant. The whole batch targets one buffer.
    pub fn put_batch_at(&self, now_ms: EpochMs, events: &[HalfEvent]) -> Result<()> {
        let buffer = self.route(now_ms)?;
        self.count(buffer.put_batch(events), events.len() as u64)
    }

    /// Processes any window boundary crossed by `now_ms` without ingesting
    /// an event.
    pub fn advance_to(&self, now_ms: EpochMs) -> Result<()> {
        self.route(now_ms).map(|_| ())
    }

    /// Drains the sealed windows awaiting publication, oldest first.
    pub fn take_sealed(&self) -> Vec<SealedWindow> {
        mem::take(&mut self.state.lock().sealed)
    }

    fn count(&self, outcome: Result<()>, events: u64) -> Result<()> {
        match &outcome {
            Ok(()) => self.stats.record_ingested(events),
            Err(e) => {
                warn!(error = %e, events, "ingest failed, dropping");
                self.stats.record_dropped(events);
            }
        }
        outcome
    }

    fn route(&self, now_ms: EpochMs) -> Result<Arc<WindowBuffer>> {
        let target = self.config.window_start_for(now_ms);
        let mut state = self.state.lock();
        if target > state.current.window_start() {
            self.rollover_locked(&mut state, target)?;
        }
        Ok(state.current.clone())
    }

    fn rollover_locked(&self, state: &mut EngineState, target: EpochMs) -> Result<()> {
        let mut next = Arc::new(new_buffer(&self.config, target)?);
        match next.rollover_inflight(&state.current) {
            Ok(carried) => {
                self.stats.record_inflight_carried(carried as u64);
                debug!(
                    from = %state.current.table_name(),
                    to = %next.table_name(),
                    carried,
                    "window rollover"
                );
            }
            Err(e) => {
                // Inflight loss is acceptable; a half-populated buffer is not.
                warn!(error = %e, "inflight carry-over failed, starting the window empty");
                self.stats.record_rollover_failure();
                next = Arc::new(new_buffer(&self.config, target)?);
            }
        }
        let prev = mem::replace(&mut state.current, next);
        state.sealed.push(SealedWindow { buffer: prev });
        self.stats.record_rollover();

        let deadline = target - self.config.rotation_interval_ms;
        let before = state.sealed.len();
        state
            .sealed
            .retain(|sealed| sealed.buffer.window_start() > deadline);
        let expired = (before - state.sealed.len()) as u64;
        if expired > 0 {
            warn!(expired, "sealed windows destroyed unpublished past the rotation deadline");
            self.stats.record_sealed_dropped(expired);
        }
        Ok(())
    }
}

fn new_buffer(config: &Config, window_start: EpochMs) -> Result<WindowBuffer> {
    WindowBuffer::new(
        window_start,
        config.sampling_interval_ms,
        config.expiry_horizon_ms,
        config.max_buffer_rows,
    )
}

fn wall_clock_ms() -> EpochMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as EpochMs)
        .unwrap_or(0)
}
