//! Leaderboard ordering and the rank-loss notification policy.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One user's aggregate for a month, as read from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankSource {
    /// The user being ranked.
    pub user_id: Uuid,
    /// Total recorded activity for the month.
    pub total_entries: i64,
    /// Most recent activity instant within the month.
    pub last_entry_at: Option<DateTime<Utc>>,
}

/// One position in the computed leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    /// The ranked user.
    pub user_id: Uuid,
    /// Total recorded activity for the month.
    pub total_entries: i64,
    /// 1-based leaderboard position.
    pub rank: u32,
}

/// Orders aggregates into a deterministic leaderboard.
///
/// Higher totals rank first. Ties break on the earlier `last_entry_at`
/// (earlier activity wins the better rank), then on `user_id`, so the
/// ordering is total and repeated calls agree.
#[must_use]
pub fn rank_rows(mut rows: Vec<RankSource>) -> Vec<RankedEntry> {
    rows.sort_by_key(|row| {
        (
            Reverse(row.total_entries),
            row.last_entry_at.unwrap_or(DateTime::<Utc>::MAX_UTC),
            row.user_id,
        )
    });

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| RankedEntry {
            user_id: row.user_id,
            total_entries: row.total_entries,
            rank: u32::try_from(i + 1).unwrap_or(u32::MAX),
        })
        .collect()
}

/// How a user's rank moved relative to the last acknowledged baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankTransition {
    /// No prior baseline - the user's first ranked appearance.
    FirstAppearance,
    /// Numerically smaller rank (better position).
    Improved,
    /// Same rank, or a drop below the notification threshold.
    Unchanged,
    /// Position worsened by at least the configured threshold.
    Loss {
        /// How many positions were lost relative to the baseline.
        drop: u32,
    },
}

/// Configurable rank-loss notification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankLossPolicy {
    /// Minimum rank drop before a loss is notifiable (1 = any drop).
    pub min_drop: u32,
}

impl Default for RankLossPolicy {
    fn default() -> Self {
        Self { min_drop: 1 }
    }
}

impl RankLossPolicy {
    /// Classifies a newly computed rank against the acknowledged baseline.
    ///
    /// A drop smaller than `min_drop` is reported as `Unchanged` so the
    /// baseline holds and later drops accumulate against it.
    #[must_use]
    pub fn classify(&self, previous: Option<u32>, new: u32) -> RankTransition {
        let Some(previous) = previous else {
            return RankTransition::FirstAppearance;
        };

        if new < previous {
            return RankTransition::Improved;
        }

        let drop = new - previous;
        if drop >= self.min_drop.max(1) {
            RankTransition::Loss { drop }
        } else {
            RankTransition::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(user_id: Uuid, total: i64, last_entry: Option<&str>) -> RankSource {
        RankSource {
            user_id,
            total_entries: total,
            last_entry_at: last_entry.map(|s| s.parse().unwrap()),
        }
    }

    #[test]
    fn test_orders_by_total_descending() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let ranked = rank_rows(vec![row(a, 3, None), row(b, 10, None)]);
        assert_eq!(ranked[0].user_id, b);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].user_id, a);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_tie_breaks_on_earlier_last_entry() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![
            row(a, 10, Some("2026-03-20T10:00:00Z")),
            row(b, 10, Some("2026-03-05T10:00:00Z")),
        ];
        let ranked = rank_rows(rows.clone());
        assert_eq!(ranked[0].user_id, b, "earlier activity wins the tie");

        // Deterministic across repeated calls with no data change.
        assert_eq!(rank_rows(rows.clone()), rank_rows(rows));
    }

    #[test]
    fn test_tie_falls_back_to_user_id() {
        let mut ids = [Uuid::new_v4(), Uuid::new_v4()];
        ids.sort();
        let rows = vec![row(ids[1], 5, None), row(ids[0], 5, None)];
        let ranked = rank_rows(rows);
        assert_eq!(ranked[0].user_id, ids[0]);
    }

    #[test]
    fn test_missing_last_entry_ranks_after_recorded_one() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let ranked = rank_rows(vec![
            row(a, 5, None),
            row(b, 5, Some("2026-03-05T10:00:00Z")),
        ]);
        assert_eq!(ranked[0].user_id, b);
    }

    #[rstest]
    #[case(None, 3, RankTransition::FirstAppearance)]
    #[case(Some(3), 1, RankTransition::Improved)]
    #[case(Some(3), 3, RankTransition::Unchanged)]
    #[case(Some(1), 3, RankTransition::Loss { drop: 2 })]
    fn test_classify_default_policy(
        #[case] previous: Option<u32>,
        #[case] new: u32,
        #[case] expected: RankTransition,
    ) {
        assert_eq!(RankLossPolicy::default().classify(previous, new), expected);
    }

    #[test]
    fn test_classify_threshold_holds_baseline() {
        let policy = RankLossPolicy { min_drop: 3 };
        // A 2-position drop stays below the threshold...
        assert_eq!(policy.classify(Some(1), 3), RankTransition::Unchanged);
        // ...so the next drop still compares against the original baseline.
        assert_eq!(
            policy.classify(Some(1), 4),
            RankTransition::Loss { drop: 3 }
        );
    }

    #[test]
    fn test_zero_min_drop_behaves_like_any_drop() {
        let policy = RankLossPolicy { min_drop: 0 };
        assert_eq!(policy.classify(Some(2), 3), RankTransition::Loss { drop: 1 });
        assert_eq!(policy.classify(Some(2), 2), RankTransition::Unchanged);
    }
}
