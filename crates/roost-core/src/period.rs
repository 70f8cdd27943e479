//! # Calendar Periods
//!
//! Operational dates are grouped into UTC calendar days.
//!
//! ```text
//!   2026-03-14                     2026-03-15
//!   ├──────────── window ─────────┤
//!   00:00:00 (inclusive)          00:00:00 (exclusive)
//! ```

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// `[start, end)` instant bounds of a UTC calendar day.
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// The calendar day an instant falls on.
pub fn day_of(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Parses a `YYYY-MM-DD` day, or the date part of an RFC 3339 timestamp.
///
/// ```rust
/// use roost_core::period::parse_day;
///
/// assert_eq!(parse_day("2026-03-14").unwrap().to_string(), "2026-03-14");
/// assert_eq!(parse_day("2026-03-14T23:10:00Z").unwrap().to_string(), "2026-03-14");
/// assert!(parse_day("14/03/2026").is_err());
/// ```
pub fn parse_day(value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        })
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `end` before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> ValidationResult<Self> {
        if end < start {
            return Err(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: format!("end {} is before start {}", end, start),
            });
        }
        Ok(DateRange { start, end })
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        DateRange {
            start: date,
            end: date,
        }
    }

    /// Seven days ending on `end`.
    pub fn week_ending(end: NaiveDate) -> Self {
        DateRange {
            start: end - Duration::days(6),
            end,
        }
    }

    /// `[start of first day, start of the day after the last)`.
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let (from, _) = day_window(self.start);
        let (_, to) = day_window(self.end);
        (from, to)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every day in the range, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}
