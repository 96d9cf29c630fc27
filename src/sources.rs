//! Time and identifier sources
//!
//! Timestamps and ids are injected so that version chains can be replayed
//! deterministically. Production code uses [`SystemClock`] and
//! [`UuidGenerator`]; simulations and tests can swap in [`SteppingClock`].

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::fmt::Debug;
use uuid::Uuid;

/// Source of the current time
pub trait Clock: Send + Sync + Debug {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// Source of unique identifiers for versions and events
pub trait IdGenerator: Send + Sync + Debug {
    /// A fresh identifier, never returned before
    fn generate(&self) -> String;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random UUIDv4 identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Clock that starts at a fixed instant and advances by `step` on every read
///
/// ```rust
/// use verchain::sources::{Clock, SteppingClock};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let clock = SteppingClock::new(start, Duration::seconds(1));
/// assert_eq!(clock.now(), start);
/// assert_eq!(clock.now(), start + Duration::seconds(1));
/// ```
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    /// Create a clock whose first reading is `start`
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }

    /// Move the clock forward without reading it
    pub fn advance(&self, by: Duration) {
        let mut next = self.next.lock();
        *next += by;
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock();
        let current = *next;
        *next += self.step;
        current
    }
}
