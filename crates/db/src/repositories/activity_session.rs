//! Activity session repository: login/logout tracking and the presence
//! and streak derivations built on top of the raw session log.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use uuid::Uuid;

use cadence_core::engagement::{MonthRef, SessionStamp, Streak, compute_streak, present_days};
use cadence_shared::AppError;

use crate::entities::activity_sessions;

/// Error types for session operations.
#[derive(Debug, thiserror::Error)]
pub enum ActivitySessionError {
    /// No session (open or closed) matches the token.
    #[error("Session not found for token: {0}")]
    SessionNotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ActivitySessionError> for AppError {
    fn from(err: ActivitySessionError) -> Self {
        match err {
            ActivitySessionError::SessionNotFound(token) => {
                Self::NotFound(format!("session {token}"))
            }
            ActivitySessionError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Activity session repository.
///
/// All calendar-day reckoning happens in the reporting timezone handed in
/// at construction.
#[derive(Debug, Clone)]
pub struct ActivitySessionRepository {
    db: DatabaseConnection,
    reporting_tz: Tz,
}

impl ActivitySessionRepository {
    /// Creates a new activity session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, reporting_tz: Tz) -> Self {
        Self { db, reporting_tz }
    }

    /// Generates an opaque session correlation token.
    ///
    /// Tokens carry no uniqueness guarantee across time; resolution always
    /// picks the newest open session for a token.
    #[must_use]
    pub fn generate_token() -> String {
        let mut bytes = [0u8; 24];
        rand::rng().fill_bytes(&mut bytes);
        base64_url::encode(&bytes)
    }

    /// Records a login: a fresh session with the login counted as the
    /// first entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn start(
        &self,
        user_id: Uuid,
    ) -> Result<activity_sessions::Model, ActivitySessionError> {
        let now = Utc::now();

        let session = activity_sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_token: Set(Self::generate_token()),
            user_id: Set(user_id),
            login_at: Set(now.into()),
            logout_at: Set(None),
            entry_count: Set(1),
            last_entry_at: Set(now.into()),
        };

        Ok(session.insert(&self.db).await?)
    }

    /// Finds the newest open session for a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_newest_open(
        &self,
        token: &str,
    ) -> Result<Option<activity_sessions::Model>, DbErr> {
        activity_sessions::Entity::find()
            .filter(activity_sessions::Column::SessionToken.eq(token))
            .filter(activity_sessions::Column::LogoutAt.is_null())
            .order_by_desc(activity_sessions::Column::LoginAt)
            .one(&self.db)
            .await
    }

    /// Records an activity ping on the open session matching the token.
    ///
    /// The increment runs as a single guarded SQL update, so concurrent
    /// pings from multiple devices never lose counts. If the session is
    /// closed between resolution and the update, resolution is retried
    /// once before the token is reported missing.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` if no open session matches the token.
    pub async fn record_activity(
        &self,
        token: &str,
    ) -> Result<activity_sessions::Model, ActivitySessionError> {
        for _ in 0..2 {
            let Some(session) = self.find_newest_open(token).await? else {
                break;
            };

            let updated = activity_sessions::Entity::update_many()
                .col_expr(
                    activity_sessions::Column::EntryCount,
                    Expr::col(activity_sessions::Column::EntryCount).add(1),
                )
                .col_expr(
                    activity_sessions::Column::LastEntryAt,
                    Expr::value(Utc::now()),
                )
                .filter(activity_sessions::Column::Id.eq(session.id))
                .filter(activity_sessions::Column::LogoutAt.is_null())
                .exec(&self.db)
                .await?;

            if updated.rows_affected == 1 {
                return activity_sessions::Entity::find_by_id(session.id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(|| ActivitySessionError::SessionNotFound(token.to_string()));
            }
        }

        Err(ActivitySessionError::SessionNotFound(token.to_string()))
    }

    /// Records a logout on the newest open session for the token.
    ///
    /// Idempotent: if the token only matches sessions that are already
    /// closed, the newest one is returned unchanged. Only a token that
    /// never existed is an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` if the token matches no session at all.
    pub async fn end(
        &self,
        token: &str,
    ) -> Result<activity_sessions::Model, ActivitySessionError> {
        if let Some(session) = self.find_newest_open(token).await? {
            let updated = activity_sessions::Entity::update_many()
                .col_expr(
                    activity_sessions::Column::LogoutAt,
                    Expr::value(Some(Utc::now())),
                )
                .filter(activity_sessions::Column::Id.eq(session.id))
                .filter(activity_sessions::Column::LogoutAt.is_null())
                .exec(&self.db)
                .await?;

            if updated.rows_affected == 1 {
                if let Some(closed) = activity_sessions::Entity::find_by_id(session.id)
                    .one(&self.db)
                    .await?
                {
                    return Ok(closed);
                }
            }
            // Lost the race to another logout; fall through to the
            // already-closed lookup.
        }

        activity_sessions::Entity::find()
            .filter(activity_sessions::Column::SessionToken.eq(token))
            .order_by_desc(activity_sessions::Column::LoginAt)
            .one(&self.db)
            .await?
            .ok_or_else(|| ActivitySessionError::SessionNotFound(token.to_string()))
    }

    /// Fetches the session stamps overlapping a month window.
    async fn stamps_for_month(
        &self,
        user_id: Uuid,
        month: MonthRef,
    ) -> Result<Vec<SessionStamp>, DbErr> {
        let (start, end) = month.utc_bounds(self.reporting_tz);

        let sessions = activity_sessions::Entity::find()
            .filter(activity_sessions::Column::UserId.eq(user_id))
            .filter(activity_sessions::Column::LoginAt.lt(end))
            .filter(activity_sessions::Column::LastEntryAt.gte(start))
            .all(&self.db)
            .await?;

        Ok(sessions
            .into_iter()
            .map(|s| SessionStamp {
                login_at: s.login_at.with_timezone(&Utc),
                last_entry_at: s.last_entry_at.with_timezone(&Utc),
            })
            .collect())
    }

    /// Derives the set of calendar days with at least one recorded
    /// activity for the user in the given month.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn present_days(
        &self,
        user_id: Uuid,
        month: MonthRef,
    ) -> Result<BTreeSet<u32>, ActivitySessionError> {
        let stamps = self.stamps_for_month(user_id, month).await?;
        Ok(present_days(&stamps, month, self.reporting_tz))
    }

    /// The month of the user's first login, if any.
    async fn first_month(&self, user_id: Uuid) -> Result<Option<MonthRef>, DbErr> {
        let first = activity_sessions::Entity::find()
            .filter(activity_sessions::Column::UserId.eq(user_id))
            .order_by_asc(activity_sessions::Column::LoginAt)
            .limit(1)
            .one(&self.db)
            .await?;

        Ok(first.map(|s| {
            MonthRef::containing(s.login_at.with_timezone(&self.reporting_tz).date_naive())
        }))
    }

    /// Computes the user's current and longest consecutive-day streak.
    ///
    /// Presence is pulled one month at a time from the first login month
    /// through the month containing `as_of`, rather than loading the full
    /// session history in one query.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn streak(
        &self,
        user_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> Result<Streak, ActivitySessionError> {
        let today =
            as_of.unwrap_or_else(|| Utc::now().with_timezone(&self.reporting_tz).date_naive());

        let Some(first) = self.first_month(user_id).await? else {
            return Ok(Streak::default());
        };

        let mut days: Vec<NaiveDate> = Vec::new();
        for month in first.months_through(MonthRef::containing(today)) {
            for day in self.present_days(user_id, month).await? {
                if let Some(date) = NaiveDate::from_ymd_opt(month.year(), month.month(), day) {
                    days.push(date);
                }
            }
        }

        Ok(compute_streak(&days, today))
    }
}
