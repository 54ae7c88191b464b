//! The canonical timestamp representation.
//!
//! Timestamps are truncated to microseconds once, when they are created.
//! Storage keeps microseconds, so a truncated value survives a round trip unchanged.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};

pub type Timestamp = DateTime<Utc>;

/// Number of fractional second digits kept
pub const PRECISION: u16 = 6;

/// The current time, truncated to the canonical precision
pub fn now() -> Timestamp {
    truncate(Utc::now())
}

/// The current calendar date in UTC
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn truncate(timestamp: Timestamp) -> Timestamp {
    timestamp.trunc_subsecs(PRECISION)
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Timelike, Utc};

    use super::truncate;

    #[test]
    fn truncates_to_microseconds() {
        let precise = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();

        assert_eq!(truncate(precise).nanosecond(), 123_456_000);
        assert_eq!(truncate(truncate(precise)), truncate(precise));
    }
}
