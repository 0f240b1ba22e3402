//! # Clock Module
//!
//! Injectable time source.
//!
//! Overdue aging compares credit due dates against "today", and tests must
//! be able to pin "today" down. Engines therefore never call `Utc::now()`
//! directly; they hold a `Clock` and ask it.

use chrono::{DateTime, NaiveDate, Utc};

/// Supplies the current instant to the engines.
///
/// Implementations must be cheap to call; engines consult the clock once
/// per operation and reuse the value for every row written in that
/// operation, so a single sale carries a single timestamp.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current calendar date (UTC), used for due-date comparisons.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock pinned to a fixed instant.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use kasuwa_core::clock::{Clock, FixedClock};
///
/// let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap());
/// assert_eq!(clock.today().to_string(), "2026-08-15");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        FixedClock(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_is_pinned() {
        let instant = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let clock = FixedClock::new(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.today(), instant.date_naive());
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
