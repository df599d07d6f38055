//! Monthly leaderboard repository: aggregate recomputation, rank reads,
//! and the notify-once rank-loss pass.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, QueryFilter, QuerySelect, Set, Statement, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use cadence_core::engagement::{
    MonthRef, RankLossPolicy, RankSource, RankTransition, RankedEntry, rank_rows,
};
use cadence_core::inbox::{ENTITY_RANK, NotificationPayload};
use cadence_shared::AppError;

use crate::entities::monthly_entry_ranks;
use crate::repositories::notification::{CreateNotificationInput, NotificationRepository};

/// Error types for leaderboard operations.
#[derive(Debug, thiserror::Error)]
pub enum EntryRankError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<EntryRankError> for AppError {
    fn from(err: EntryRankError) -> Self {
        match err {
            EntryRankError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Outcome of one leaderboard pass.
#[derive(Debug, Clone, Copy)]
pub struct RankPassSummary {
    /// Users holding a rank row for the month after the pass.
    pub users_ranked: u64,
    /// Rank-loss notifications emitted by this pass.
    pub notifications_sent: u64,
}

/// Single-statement aggregate upsert: every user with a session in the
/// month gets their total and latest activity cached on the rank row.
/// One statement sees one consistent snapshot, so a pass abandoned
/// mid-flight rolls back whole and the next run redoes it idempotently.
const UPSERT_TOTALS_SQL: &str = r"
INSERT INTO monthly_entry_ranks
    (id, user_id, year, month, total_entries, last_entry_at, updated_at)
SELECT gen_random_uuid(), s.user_id, $1, $2, SUM(s.entry_count), MAX(s.last_entry_at), $5
FROM activity_sessions s
WHERE s.login_at >= $3 AND s.login_at < $4
GROUP BY s.user_id
ON CONFLICT (user_id, year, month) DO UPDATE SET
    total_entries = EXCLUDED.total_entries,
    last_entry_at = EXCLUDED.last_entry_at,
    updated_at = EXCLUDED.updated_at
";

/// Monthly entry rank repository.
#[derive(Debug, Clone)]
pub struct EntryRankRepository {
    db: DatabaseConnection,
    reporting_tz: Tz,
}

impl EntryRankRepository {
    /// Creates a new entry rank repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, reporting_tz: Tz) -> Self {
        Self { db, reporting_tz }
    }

    /// Advisory lock key serializing recompute passes per month.
    fn lock_key(month: MonthRef) -> i64 {
        i64::from(month.year()) * 100 + i64::from(month.month())
    }

    /// The month number as stored in the rank table.
    fn month_column(month: MonthRef) -> i32 {
        i32::try_from(month.month()).unwrap_or_default()
    }

    /// Recomputes `total_entries` for every user active in the month.
    ///
    /// Overlapping passes for the same month serialize on a transaction-
    /// scoped advisory lock; the upsert itself is a single statement, so
    /// readers never observe a partially-summed month.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; nothing is committed in
    /// that case.
    pub async fn recompute_month(&self, month: MonthRef) -> Result<u64, EntryRankError> {
        let (start, end) = month.utc_bounds(self.reporting_tz);

        let txn = self.db.begin().await?;

        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock($1)",
            [Self::lock_key(month).into()],
        ))
        .await?;

        let result = txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                UPSERT_TOTALS_SQL,
                [
                    month.year().into(),
                    Self::month_column(month).into(),
                    start.into(),
                    end.into(),
                    Utc::now().into(),
                ],
            ))
            .await?;

        txn.commit().await?;

        debug!(%month, rows = result.rows_affected(), "recomputed monthly totals");
        Ok(result.rows_affected())
    }

    /// Computes the full deterministic ranking for a month.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn ranking(&self, month: MonthRef) -> Result<Vec<RankedEntry>, EntryRankError> {
        let rows = monthly_entry_ranks::Entity::find()
            .filter(monthly_entry_ranks::Column::Year.eq(month.year()))
            .filter(monthly_entry_ranks::Column::Month.eq(Self::month_column(month)))
            .all(&self.db)
            .await?;

        let sources = rows
            .into_iter()
            .map(|row| RankSource {
                user_id: row.user_id,
                total_entries: row.total_entries,
                last_entry_at: row.last_entry_at.map(|t| t.with_timezone(&Utc)),
            })
            .collect();

        Ok(rank_rows(sources))
    }

    /// The top `n` leaderboard entries for a month.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn top(
        &self,
        month: MonthRef,
        n: usize,
    ) -> Result<Vec<RankedEntry>, EntryRankError> {
        let mut ranking = self.ranking(month).await?;
        ranking.truncate(n);
        Ok(ranking)
    }

    /// A single user's leaderboard entry, or `None` if the user has no
    /// rank row for the month.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn user_rank(
        &self,
        user_id: Uuid,
        month: MonthRef,
    ) -> Result<Option<RankedEntry>, EntryRankError> {
        let ranking = self.ranking(month).await?;
        Ok(ranking.into_iter().find(|entry| entry.user_id == user_id))
    }

    /// Runs one full leaderboard pass: recompute, rank, notify.
    ///
    /// This is the only supported way to drive the notifier, so it can
    /// never run against a stale aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails; notification state for users
    /// already processed is kept (each user commits independently) and the
    /// next pass resumes safely.
    pub async fn run_pass(
        &self,
        month: MonthRef,
        inbox: &NotificationRepository,
        policy: &RankLossPolicy,
    ) -> Result<RankPassSummary, EntryRankError> {
        let pass_started_at = Utc::now();

        self.recompute_month(month).await?;
        let ranking = self.ranking(month).await?;
        let notifications_sent = self
            .notify_rank_losses(month, pass_started_at, &ranking, inbox, policy)
            .await?;

        let summary = RankPassSummary {
            users_ranked: u64::try_from(ranking.len()).unwrap_or(u64::MAX),
            notifications_sent,
        };
        info!(
            %month,
            users = summary.users_ranked,
            notified = summary.notifications_sent,
            "leaderboard pass complete"
        );
        Ok(summary)
    }

    /// Emits at most one notification per distinct rank degradation.
    ///
    /// Each user's check-and-notify runs in its own transaction: the rank
    /// row is re-read under a row lock, so two concurrent passes cannot
    /// both observe the not-yet-notified state. The baseline rank is
    /// seeded silently on first appearance and re-baselined silently on
    /// improvement; only a degradation at or above the policy threshold
    /// writes a notification and stamps `last_position_loss_notified_at`.
    async fn notify_rank_losses(
        &self,
        month: MonthRef,
        pass_started_at: DateTime<Utc>,
        ranking: &[RankedEntry],
        inbox: &NotificationRepository,
        policy: &RankLossPolicy,
    ) -> Result<u64, EntryRankError> {
        let mut notified: u64 = 0;

        for entry in ranking {
            let txn = self.db.begin().await?;

            let Some(row) = monthly_entry_ranks::Entity::find()
                .filter(monthly_entry_ranks::Column::UserId.eq(entry.user_id))
                .filter(monthly_entry_ranks::Column::Year.eq(month.year()))
                .filter(monthly_entry_ranks::Column::Month.eq(Self::month_column(month)))
                .lock_exclusive()
                .one(&txn)
                .await?
            else {
                txn.commit().await?;
                continue;
            };

            // Another pass already handled this degradation.
            if row
                .last_position_loss_notified_at
                .is_some_and(|t| t.with_timezone(&Utc) >= pass_started_at)
            {
                txn.commit().await?;
                continue;
            }

            let previous = row.last_notified_rank.and_then(|r| u32::try_from(r).ok());

            match policy.classify(previous, entry.rank) {
                RankTransition::Loss { drop } => {
                    let previous_rank = entry.rank - drop;
                    inbox
                        .create_in(
                            &txn,
                            CreateNotificationInput {
                                user_id: entry.user_id,
                                title: format!(
                                    "You dropped from rank {previous_rank} to rank {} on the {month} leaderboard",
                                    entry.rank
                                ),
                                entity: ENTITY_RANK.to_string(),
                                entity_id: Some(row.id),
                                type_of_action: None,
                                path: Some("/leaderboard".to_string()),
                                payload: Some(NotificationPayload::RankLoss {
                                    previous_rank,
                                    new_rank: entry.rank,
                                    year: month.year(),
                                    month: month.month(),
                                }),
                            },
                        )
                        .await?;

                    let mut active: monthly_entry_ranks::ActiveModel = row.into();
                    active.last_notified_rank =
                        Set(Some(i32::try_from(entry.rank).unwrap_or(i32::MAX)));
                    active.last_position_loss_notified_at = Set(Some(Utc::now().into()));
                    active.update(&txn).await?;
                    notified += 1;
                }
                RankTransition::FirstAppearance | RankTransition::Improved => {
                    let mut active: monthly_entry_ranks::ActiveModel = row.into();
                    active.last_notified_rank =
                        Set(Some(i32::try_from(entry.rank).unwrap_or(i32::MAX)));
                    active.update(&txn).await?;
                }
                RankTransition::Unchanged => {}
            }

            txn.commit().await?;
        }

        Ok(notified)
    }
}
