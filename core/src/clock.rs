//! Engine clock — the single source of "now" and all window math.
//!
//! RULE: Nothing in the engine reads the platform clock directly.
//! Production wires `EngageClock::System`; tests pin `Fixed` so every
//! window calculation is reproducible.

use crate::error::{EngageError, EngageResult};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};

#[derive(Debug, Clone)]
pub enum EngageClock {
    System,
    Fixed(DateTime<Utc>),
}

impl EngageClock {
    pub fn system() -> Self {
        Self::System
    }

    /// Pin the clock to a fixed instant (tests and replay tooling).
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(at) => *at,
        }
    }

    /// The current UTC calendar day.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Most recent start-of-week: day index 0 is Sunday, at 00:00:00 UTC.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    let back = day.weekday().num_days_from_sunday() as u64;
    day.checked_sub_days(Days::new(back)).unwrap_or(day)
}

/// Day 1 of the month containing `day`.
pub fn start_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Unix timestamp of `day` at 00:00:00 UTC.
pub fn day_start_ts(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Parse a client-supplied `YYYY-MM-DD` day string. Malformed input is a
/// validation error, rejected before any write.
pub fn parse_day(s: &str) -> EngageResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| EngageError::InvalidDate {
        value: s.to_string(),
    })
}
