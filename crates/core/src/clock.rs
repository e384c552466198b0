//! Time source for ledger operations.
//!
//! Every operation reads the clock once and derives both the movement
//! timestamp and the calendar "today" from that single reading.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Source of the current instant plus the fixed offset used for calendar dates.
pub trait Clock: Send + Sync + core::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;

    /// Offset applied when turning an instant into a calendar date.
    fn offset(&self) -> FixedOffset {
        utc_offset()
    }

    /// Calendar date of `at` under this clock's offset.
    fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset()).date_naive()
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Wall clock with a configurable offset (UTC unless told otherwise).
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn utc() -> Self {
        Self {
            offset: utc_offset(),
        }
    }

    /// Clock whose calendar dates are taken at `minutes` east of UTC.
    ///
    /// Returns `None` when the offset is out of range (more than a day).
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(minutes.checked_mul(60)?)?;
        Some(Self { offset })
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Clock frozen at one instant. Tests move it forward explicitly.
#[derive(Debug)]
pub struct FixedClock {
    now: std::sync::RwLock<DateTime<Utc>>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::RwLock::new(now),
            offset: utc_offset(),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_of_uses_the_configured_offset() {
        let late_evening_utc = Utc.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap();

        let utc = SystemClock::utc();
        assert_eq!(
            utc.date_of(late_evening_utc),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );

        let cet = SystemClock::with_offset_minutes(60).unwrap();
        assert_eq!(
            cet.date_of(late_evening_utc),
            NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()
        );
    }

    #[test]
    fn out_of_range_offsets_are_rejected() {
        assert!(SystemClock::with_offset_minutes(24 * 60).is_none());
        assert!(SystemClock::with_offset_minutes(-90).is_some());
    }

    #[test]
    fn fixed_clock_only_moves_when_told() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.now(), start + chrono::Duration::minutes(5));
    }
}
