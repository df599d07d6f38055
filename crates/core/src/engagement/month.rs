//! Calendar month references and reporting-timezone windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::error::EngagementError;

/// Earliest year the subsystem reports on.
const MIN_YEAR: i32 = 1970;
/// Latest year the subsystem reports on.
const MAX_YEAR: i32 = 9999;

/// A validated (year, month) pair.
///
/// All presence and leaderboard queries are scoped to one of these; the
/// constructor is the single place year/month input is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthRef {
    year: i32,
    month: u32,
}

impl MonthRef {
    /// Creates a month reference, validating both components.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::MonthOutOfRange`] or
    /// [`EngagementError::YearOutOfRange`] for values outside the calendar.
    pub const fn new(year: i32, month: u32) -> Result<Self, EngagementError> {
        if month == 0 || month > 12 {
            return Err(EngagementError::MonthOutOfRange { month });
        }
        if year < MIN_YEAR || year > MAX_YEAR {
            return Err(EngagementError::YearOutOfRange { year });
        }
        Ok(Self { year, month })
    }

    /// Returns the month containing the given local date.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The year component.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// The month component (1-12).
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The month immediately after this one.
    #[must_use]
    pub const fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The month immediately before this one.
    #[must_use]
    pub const fn pred(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// First calendar day of the month.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Last calendar day of the month.
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.succ().first_day() - Duration::days(1)
    }

    /// Number of days in the month.
    #[must_use]
    pub fn days_in_month(self) -> u32 {
        self.last_day().day()
    }

    /// Returns true if the given local date falls within this month.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Resolves the half-open UTC window `[first-of-month 00:00,
    /// first-of-next-month 00:00)` local to the reporting timezone.
    #[must_use]
    pub fn utc_bounds(self, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            local_midnight_utc(tz, self.first_day()),
            local_midnight_utc(tz, self.succ().first_day()),
        )
    }

    /// Iterates months from `self` through `end`, inclusive.
    pub fn months_through(self, end: Self) -> impl Iterator<Item = Self> {
        let mut current = self;
        let mut done = self > end;
        std::iter::from_fn(move || {
            if done {
                return None;
            }
            let item = current;
            if current == end {
                done = true;
            } else {
                current = current.succ();
            }
            Some(item)
        })
    }
}

impl std::fmt::Display for MonthRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Converts a local midnight to UTC.
///
/// Timezones where a DST jump swallows midnight have no local 00:00 on the
/// transition day; the first valid instant after it is used instead.
fn local_midnight_utc(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let mut naive = date.and_time(NaiveTime::MIN);
    for _ in 0..8 {
        if let Some(local) = tz.from_local_datetime(&naive).earliest() {
            return local.with_timezone(&Utc);
        }
        naive += Duration::minutes(30);
    }
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{America::Sao_Paulo, Europe::Berlin, UTC};

    #[test]
    fn test_new_validates_month() {
        assert!(MonthRef::new(2026, 0).is_err());
        assert!(MonthRef::new(2026, 13).is_err());
        assert!(MonthRef::new(2026, 12).is_ok());
    }

    #[test]
    fn test_new_validates_year() {
        assert!(MonthRef::new(1969, 6).is_err());
        assert!(MonthRef::new(10_000, 6).is_err());
    }

    #[test]
    fn test_succ_and_pred_wrap_year() {
        let dec = MonthRef::new(2025, 12).unwrap();
        assert_eq!(dec.succ(), MonthRef::new(2026, 1).unwrap());
        assert_eq!(MonthRef::new(2026, 1).unwrap().pred(), dec);
    }

    #[test]
    fn test_days_in_month_leap_year() {
        assert_eq!(MonthRef::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(MonthRef::new(2025, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthRef::new(2026, 7).unwrap().days_in_month(), 31);
    }

    #[test]
    fn test_utc_bounds_utc() {
        let (start, end) = MonthRef::new(2026, 3).unwrap().utc_bounds(UTC);
        assert_eq!(start.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-04-01T00:00:00+00:00");
    }

    #[test]
    fn test_utc_bounds_offset_timezone() {
        // Berlin is UTC+1 in March, so local midnight is 23:00 UTC the day before.
        let (start, _) = MonthRef::new(2026, 3).unwrap().utc_bounds(Berlin);
        assert_eq!(start.to_rfc3339(), "2026-02-28T23:00:00+00:00");
    }

    #[test]
    fn test_utc_bounds_survive_midnight_dst_gap() {
        // Sao Paulo's 2018 DST jump skipped midnight on Nov 4.
        let (start, end) = MonthRef::new(2018, 11).unwrap().utc_bounds(Sao_Paulo);
        assert!(start < end);
    }

    #[test]
    fn test_months_through() {
        let from = MonthRef::new(2025, 11).unwrap();
        let to = MonthRef::new(2026, 2).unwrap();
        let months: Vec<String> = from.months_through(to).map(|m| m.to_string()).collect();
        assert_eq!(months, ["2025-11", "2025-12", "2026-01", "2026-02"]);
    }

    #[test]
    fn test_months_through_empty_when_reversed() {
        let from = MonthRef::new(2026, 2).unwrap();
        let to = MonthRef::new(2026, 1).unwrap();
        assert_eq!(from.months_through(to).count(), 0);
    }
}
