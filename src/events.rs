//! Audit event log
//!
//! An append-only, bounded sequence of [`VersioningEvent`]s. Every append is
//! stamped with a fresh id and the current time. Once the log grows past its
//! high-water mark it keeps only the most recent `retain` entries.
//!
//! The log has no query capability of its own; readers take a snapshot of the
//! raw sequence.

use crate::sources::{Clock, IdGenerator};
use crate::types::{EventType, Metadata, VersioningEvent};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Default length above which the log is truncated
pub const DEFAULT_HIGH_WATER: usize = 10_000;

/// Default number of entries kept after truncation
pub const DEFAULT_RETAIN: usize = 5_000;

/// Bounded append-only event log
#[derive(Debug)]
pub struct EventLog {
    events: RwLock<Vec<VersioningEvent>>,
    high_water: usize,
    retain: usize,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl EventLog {
    /// Create a log with the default bounds
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self::with_bounds(clock, ids, DEFAULT_HIGH_WATER, DEFAULT_RETAIN)
    }

    /// Create a log that keeps `retain` entries once it exceeds `high_water`
    ///
    /// `retain` is clamped to `high_water`.
    pub fn with_bounds(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        high_water: usize,
        retain: usize,
    ) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            high_water,
            retain: retain.min(high_water),
            clock,
            ids,
        }
    }

    /// Append an event and return the stored record
    pub fn append(
        &self,
        event_type: EventType,
        file_id: &str,
        version_id: Option<&str>,
        user_id: Option<&str>,
        details: Metadata,
    ) -> VersioningEvent {
        let event = VersioningEvent {
            id: self.ids.generate(),
            event_type,
            file_id: file_id.to_string(),
            version_id: version_id.map(str::to_string),
            user_id: user_id.map(str::to_string),
            timestamp: self.clock.now(),
            details,
        };

        let mut events = self.events.write();
        events.push(event.clone());
        if events.len() > self.high_water {
            let drop_count = events.len() - self.retain;
            events.drain(..drop_count);
            debug!("Event log truncated: dropped {} oldest entries", drop_count);
        }
        event
    }

    /// Copy of the full sequence, oldest first
    pub fn snapshot(&self) -> Vec<VersioningEvent> {
        self.events.read().clone()
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}
