//! Presence calendar derivation.
//!
//! A user is "present" on every local calendar day touched by one of their
//! activity sessions. Sessions carry only their login instant and the
//! instant of the most recent activity ping, so a session marks every day
//! in that inclusive range - which is what makes a session spanning
//! midnight count on both days it touches.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::month::MonthRef;

/// The two instants of a session relevant to presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStamp {
    /// When the session was opened.
    pub login_at: DateTime<Utc>,
    /// Most recent activity ping (equals `login_at` when never pinged).
    pub last_entry_at: DateTime<Utc>,
}

/// Derives the set of present days-of-month for one user and month.
///
/// Pure and order-independent: replaying the same stamps in any order
/// yields the same set. A month with no sessions yields an empty set.
#[must_use]
pub fn present_days(stamps: &[SessionStamp], month: MonthRef, tz: Tz) -> BTreeSet<u32> {
    let mut days = BTreeSet::new();

    for stamp in stamps {
        let first = stamp.login_at.with_timezone(&tz).date_naive();
        let last = stamp.last_entry_at.with_timezone(&tz).date_naive().max(first);

        // Clip the session's day range to the queried month.
        let from = first.max(month.first_day());
        let to = last.min(month.last_day());

        let mut day = from;
        while day <= to {
            if month.contains(day) {
                days.insert(chrono::Datelike::day(&day));
            }
            let Some(next) = day.succ_opt() else { break };
            day = next;
        }
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{Europe::Berlin, UTC};

    fn month(year: i32, month: u32) -> MonthRef {
        MonthRef::new(year, month).unwrap()
    }

    fn stamp(login: &str, last_entry: &str) -> SessionStamp {
        SessionStamp {
            login_at: login.parse().unwrap(),
            last_entry_at: last_entry.parse().unwrap(),
        }
    }

    #[test]
    fn test_single_day_session() {
        let stamps = [stamp("2026-03-10T08:00:00Z", "2026-03-10T09:30:00Z")];
        let days = present_days(&stamps, month(2026, 3), UTC);
        assert_eq!(days.into_iter().collect::<Vec<_>>(), [10]);
    }

    #[test]
    fn test_session_spanning_midnight_touches_both_days() {
        let stamps = [stamp("2026-03-10T23:40:00Z", "2026-03-11T00:20:00Z")];
        let days = present_days(&stamps, month(2026, 3), UTC);
        assert_eq!(days.into_iter().collect::<Vec<_>>(), [10, 11]);
    }

    #[test]
    fn test_empty_month_yields_empty_set() {
        let stamps = [stamp("2026-03-10T08:00:00Z", "2026-03-10T09:00:00Z")];
        assert!(present_days(&stamps, month(2026, 4), UTC).is_empty());
        assert!(present_days(&[], month(2026, 3), UTC).is_empty());
    }

    #[test]
    fn test_order_independent() {
        let a = stamp("2026-03-05T10:00:00Z", "2026-03-05T11:00:00Z");
        let b = stamp("2026-03-20T10:00:00Z", "2026-03-21T02:00:00Z");
        assert_eq!(
            present_days(&[a, b], month(2026, 3), UTC),
            present_days(&[b, a], month(2026, 3), UTC)
        );
    }

    #[test]
    fn test_session_clipped_to_month_boundary() {
        // Session runs from March 31 into April 1: only the 31st counts in March.
        let stamps = [stamp("2026-03-31T22:00:00Z", "2026-04-01T01:00:00Z")];
        let days = present_days(&stamps, month(2026, 3), UTC);
        assert_eq!(days.into_iter().collect::<Vec<_>>(), [31]);
        let days = present_days(&stamps, month(2026, 4), UTC);
        assert_eq!(days.into_iter().collect::<Vec<_>>(), [1]);
    }

    #[test]
    fn test_reporting_timezone_shifts_the_day() {
        // 23:30 UTC on the 10th is already the 11th in Berlin (UTC+1).
        let stamps = [stamp("2026-03-10T23:30:00Z", "2026-03-10T23:45:00Z")];
        let days = present_days(&stamps, month(2026, 3), Berlin);
        assert_eq!(days.into_iter().collect::<Vec<_>>(), [11]);
    }

    #[test]
    fn test_duplicate_sessions_same_day_collapse() {
        let stamps = [
            stamp("2026-03-10T08:00:00Z", "2026-03-10T08:30:00Z"),
            stamp("2026-03-10T19:00:00Z", "2026-03-10T19:05:00Z"),
        ];
        let days = present_days(&stamps, month(2026, 3), UTC);
        assert_eq!(days.len(), 1);
    }
}
