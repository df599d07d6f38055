//! Consecutive-day streak computation.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// A user's activity streaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streak {
    /// Consecutive present days ending today or yesterday.
    pub current: u32,
    /// Longest consecutive run across all history.
    pub longest: u32,
}

/// Computes streaks from distinct present days in ascending order.
///
/// `current` counts the run ending on the most recent present day if that
/// day is `as_of` or the day before - a user active yesterday but not yet
/// today keeps the streak alive until the day fully elapses. A most recent
/// present day older than that yields `current = 0`. Days after `as_of`
/// are ignored.
#[must_use]
pub fn compute(days: &[NaiveDate], as_of: NaiveDate) -> Streak {
    let mut longest: u32 = 0;
    let mut run: u32 = 0;
    let mut prev: Option<NaiveDate> = None;

    for &day in days.iter().filter(|&&d| d <= as_of) {
        run = match prev {
            Some(p) if day - p == Duration::days(1) => run + 1,
            Some(p) if day == p => run,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    let current = match prev {
        Some(last) if as_of - last <= Duration::days(1) => run,
        _ => 0,
    };

    Streak { current, longest }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn test_gap_breaks_run() {
        // Present on {1,2,3,5,6}, asked as of the 6th.
        let days = [d(1), d(2), d(3), d(5), d(6)];
        let streak = compute(&days, d(6));
        assert_eq!(streak.current, 2);
        assert_eq!(streak.longest, 3);
    }

    #[test]
    fn test_yesterday_keeps_streak_alive() {
        let days = [d(4), d(5), d(6)];
        let streak = compute(&days, d(7));
        assert_eq!(streak.current, 3);
    }

    #[test]
    fn test_stale_presence_zeroes_current() {
        let days = [d(1), d(2), d(3)];
        let streak = compute(&days, d(10));
        assert_eq!(streak.current, 0);
        assert_eq!(streak.longest, 3);
    }

    #[test]
    fn test_no_history() {
        assert_eq!(compute(&[], d(6)), Streak::default());
    }

    #[test]
    fn test_single_day_today() {
        let streak = compute(&[d(6)], d(6));
        assert_eq!(streak.current, 1);
        assert_eq!(streak.longest, 1);
    }

    #[test]
    fn test_days_after_as_of_are_ignored() {
        let days = [d(5), d(6), d(20)];
        let streak = compute(&days, d(6));
        assert_eq!(streak.current, 2);
        assert_eq!(streak.longest, 2);
    }

    #[test]
    fn test_runs_across_month_boundary() {
        let days = [
            NaiveDate::from_ymd_opt(2026, 2, 27).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        ];
        let streak = compute(&days, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(streak.current, 3);
        assert_eq!(streak.longest, 3);
    }

    #[test]
    fn test_duplicate_days_do_not_inflate() {
        let days = [d(5), d(5), d(6)];
        let streak = compute(&days, d(6));
        assert_eq!(streak.current, 2);
        assert_eq!(streak.longest, 2);
    }
}
