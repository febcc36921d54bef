//! Data model for shard-request half-events.
//!
//! Upstream collectors observe a request twice: once when a shard operation
//! starts and once when it ends. Each observation arrives as a *half-event*
//! carrying one timestamp and whatever dimensions the producer knows. The
//! two halves are only joined later, by the coalescing view of a window
//! buffer.
//!
//! # Key Types
//!
//! - [`HalfEvent`] - One observation: a [`Stamp`] plus [`EventDims`]
//! - [`EventDims`] - The fixed set of request dimensions
//! - [`EventRow`] - A stored buffer row (start or end timestamp, never both)
//!
//! # Examples
//!
//! ```rust
//! use shardpulse::model::{EventDims, HalfEvent, Stamp};
//!
//! let dims = EventDims::from_pairs([
//!     ("rid", "b34a"),
//!     ("tid", "search-7"),
//!     ("Operation", "shardquery"),
//!     ("ShardID", "2"),
//! ]);
//! let event = HalfEvent::new(Stamp::Start(1_535_065_340_330), dims);
//! assert!(event.stamp.start().is_some());
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Milliseconds since the Unix epoch.
pub type EpochMs = i64;

/// Producer-facing dimension key for the shard identifier.
pub const DIM_SHARD_ID: &str = "ShardID";
/// Producer-facing dimension key for the index name.
pub const DIM_INDEX_NAME: &str = "IndexName";
/// Producer-facing dimension key for the request id.
pub const DIM_RID: &str = "rid";
/// Producer-facing dimension key for the thread id.
pub const DIM_TID: &str = "tid";
/// Producer-facing dimension key for the operation name.
pub const DIM_OPERATION: &str = "Operation";
/// Producer-facing dimension key for the shard role.
pub const DIM_SHARD_ROLE: &str = "ShardRole";
/// Producer-facing dimension key for the bulk document count.
pub const DIM_DOC_COUNT: &str = "DocCount";

/// Dimensions attached to a half-event.
///
/// Any subset may be present; views that group rows require `rid` and the
/// operation, and the thread-scoped views additionally require `tid`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDims {
    /// Shard identifier.
    pub shard: Option<String>,
    /// Index name.
    pub index: Option<String>,
    /// Request id.
    pub rid: Option<String>,
    /// Thread id.
    pub tid: Option<String>,
    /// Operation name, e.g. `shardquery`, `shardfetch`, `shardbulk`.
    pub op: Option<String>,
    /// Shard role, e.g. `Primary`, `Replica`, `NA`.
    pub role: Option<String>,
    /// Documents processed, populated for bulk operations.
    pub doc_count: Option<i64>,
}

impl EventDims {
    /// Builds dimensions from producer key/value pairs.
    ///
    /// Keys use the producer vocabulary ([`DIM_SHARD_ID`], [`DIM_RID`], ...).
    /// Empty values are treated as absent. Unknown keys are logged and
    /// dropped; they never reach a view.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut dims = Self::default();
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match key {
                DIM_SHARD_ID => dims.shard = Some(value.to_owned()),
                DIM_INDEX_NAME => dims.index = Some(value.to_owned()),
                DIM_RID => dims.rid = Some(value.to_owned()),
                DIM_TID => dims.tid = Some(value.to_owned()),
                DIM_OPERATION => dims.op = Some(value.to_owned()),
                DIM_SHARD_ROLE => dims.role = Some(value.to_owned()),
                DIM_DOC_COUNT => match value.parse::<i64>() {
                    Ok(count) => dims.doc_count = Some(count),
                    Err(_) => warn!(value, "unparseable {DIM_DOC_COUNT}, dropping"),
                },
                other => warn!(key = other, "unknown dimension key, dropping"),
            }
        }
        dims
    }
}

/// The single timestamp carried by a half-event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stamp {
    /// The request started at this instant.
    Start(EpochMs),
    /// The request ended at this instant.
    End(EpochMs),
}

impl Stamp {
    /// The start timestamp, if this is a start marker.
    pub fn start(&self) -> Option<EpochMs> {
        match self {
            Stamp::Start(ms) => Some(*ms),
            Stamp::End(_) => None,
        }
    }

    /// The end timestamp, if this is an end marker.
    pub fn end(&self) -> Option<EpochMs> {
        match self {
            Stamp::Start(_) => None,
            Stamp::End(ms) => Some(*ms),
        }
    }
}

/// A complete producer observation: one timestamp plus dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfEvent {
    /// Start or end marker.
    pub stamp: Stamp,
    /// Request dimensions known to the producer.
    pub dims: EventDims,
}

impl HalfEvent {
    /// Creates a half-event.
    pub fn new(stamp: Stamp, dims: EventDims) -> Self {
        Self { stamp, dims }
    }
}

/// One stored row of a window buffer.
///
/// Exactly one of `st` / `et` is set on any ingested row; rows carried over
/// by a rollover are start-only as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRow {
    /// Start timestamp, if this row is a start marker.
    pub st: Option<EpochMs>,
    /// End timestamp, if this row is an end marker.
    pub et: Option<EpochMs>,
    /// Dimensions carried by the row.
    pub dims: EventDims,
}

impl EventRow {
    /// Builds the stored row for a half-event.
    pub fn from_event(event: HalfEvent) -> Self {
        Self {
            st: event.stamp.start(),
            et: event.stamp.end(),
            dims: event.dims,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_fills_known_keys() {
        let dims = EventDims::from_pairs([
            (DIM_SHARD_ID, "0"),
            (DIM_INDEX_NAME, "sonested"),
            (DIM_RID, "A"),
            (DIM_TID, "T1"),
            (DIM_OPERATION, "shardquery"),
            (DIM_SHARD_ROLE, "NA"),
            (DIM_DOC_COUNT, "12"),
        ]);
        assert_eq!(dims.shard.as_deref(), Some("0"));
        assert_eq!(dims.index.as_deref(), Some("sonested"));
        assert_eq!(dims.rid.as_deref(), Some("A"));
        assert_eq!(dims.tid.as_deref(), Some("T1"));
        assert_eq!(dims.op.as_deref(), Some("shardquery"));
        assert_eq!(dims.role.as_deref(), Some("NA"));
        assert_eq!(dims.doc_count, Some(12));
    }

    #[test]
    fn from_pairs_drops_unknown_and_empty() {
        let dims = EventDims::from_pairs([("Wombat", "1"), (DIM_RID, ""), (DIM_TID, "T1")]);
        assert_eq!(dims, EventDims {
            tid: Some("T1".to_owned()),
            ..EventDims::default()
        });
    }

    #[test]
    fn from_pairs_tolerates_bad_doc_count() {
        let dims = EventDims::from_pairs([(DIM_DOC_COUNT, "not-a-number")]);
        assert_eq!(dims.doc_count, None);
    }

    #[test]
    fn event_row_keeps_exactly_one_timestamp() {
        let start = EventRow::from_event(HalfEvent::new(Stamp::Start(10), EventDims::default()));
        assert_eq!((start.st, start.et), (Some(10), None));
        let end = EventRow::from_event(HalfEvent::new(Stamp::End(20), EventDims::default()));
        assert_eq!((end.st, end.et), (None, Some(20)));
    }
}
