use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Source of call timestamps for donation receipts and event records.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests and scripted simulations.
///
/// Each reading returns the current instant and then advances it by
/// `step_ms`. A step of zero freezes time.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
    step_ms: i64,
}

impl FixedClock {
    /// A frozen clock at `start_ms` milliseconds since the Unix epoch.
    pub fn at_millis(start_ms: i64) -> Self {
        Self::stepping(start_ms, 0)
    }

    /// A clock that advances by `step_ms` after every reading.
    pub fn stepping(start_ms: i64, step_ms: i64) -> Self {
        Self {
            millis: AtomicI64::new(start_ms),
            step_ms,
        }
    }

    pub fn set_millis(&self, ms: i64) {
        self.millis.store(ms, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, ms: i64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.millis.fetch_add(self.step_ms, Ordering::SeqCst);
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_clock_repeats() {
        let clock = FixedClock::at_millis(1_700_000_000_000);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn stepping_clock_advances_per_reading() {
        let clock = FixedClock::stepping(1_000, 10);
        assert_eq!(clock.now().timestamp_millis(), 1_000);
        assert_eq!(clock.now().timestamp_millis(), 1_010);
        clock.advance_millis(5);
        assert_eq!(clock.now().timestamp_millis(), 1_025);
        clock.set_millis(0);
        assert_eq!(clock.now().timestamp_millis(), 0);
    }
}
