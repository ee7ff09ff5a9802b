//! Time source for simulated job maturation.
//!
//! Simulated clients derive job state lazily from elapsed time. Production
//! code uses [`SystemClock`]; tests drive a [`ManualClock`] so maturation
//! thresholds can be crossed without sleeping.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Monotonic plus wall-clock time source.
pub trait Clock: Send + Sync {
    /// Monotonic instant used for elapsed-time comparisons.
    fn now(&self) -> Instant;

    /// Wall-clock time used for reported timestamps.
    fn wall(&self) -> DateTime<Utc>;
}

/// Real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Starts at the real time of construction and never goes backwards. An
/// advance that would overflow either reading is ignored.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    base_wall: DateTime<Utc>,
    offset: Mutex<Duration>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            base_wall: Utc::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock();
        let next = offset.saturating_add(by);
        if self.is_representable(next) {
            *offset = next;
        }
    }

    /// Total time advanced since construction.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }

    fn instant_at(&self, offset: Duration) -> Option<Instant> {
        self.base.checked_add(offset)
    }

    fn wall_at(&self, offset: Duration) -> Option<DateTime<Utc>> {
        chrono::Duration::from_std(offset)
            .ok()
            .and_then(|delta| self.base_wall.checked_add_signed(delta))
    }

    fn is_representable(&self, offset: Duration) -> bool {
        self.instant_at(offset).is_some() && self.wall_at(offset).is_some()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.instant_at(*self.offset.lock()).unwrap_or(self.base)
    }

    fn wall(&self) -> DateTime<Utc> {
        self.wall_at(*self.offset.lock()).unwrap_or(self.base_wall)
    }
}

/// Converts a std duration into a chrono delta for wall-clock arithmetic.
///
/// Saturates at zero for durations chrono cannot represent.
#[must_use]
pub fn to_wall_delta(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero())
}
