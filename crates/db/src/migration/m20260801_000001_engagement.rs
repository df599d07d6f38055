//! Engagement schema migration.
//!
//! Creates the activity session log, the monthly leaderboard aggregates,
//! and the notification inbox.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ENGAGEMENT_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS notifications CASCADE;
             DROP TABLE IF EXISTS monthly_entry_ranks CASCADE;
             DROP TABLE IF EXISTS activity_sessions CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const ENGAGEMENT_SQL: &str = r"
-- Activity sessions: one row per login, never deleted
CREATE TABLE activity_sessions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    session_token VARCHAR(64) NOT NULL,
    user_id UUID NOT NULL,
    login_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    logout_at TIMESTAMPTZ,
    entry_count BIGINT NOT NULL DEFAULT 1,
    last_entry_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_entry_count_positive CHECK (entry_count >= 1),
    CONSTRAINT chk_last_entry_not_before_login CHECK (last_entry_at >= login_at)
);

-- Token lookup resolves the newest open session; tokens are NOT unique
CREATE INDEX idx_activity_sessions_open_token
    ON activity_sessions(session_token, login_at DESC) WHERE logout_at IS NULL;

-- Presence/streak scans walk a user's sessions month by month
CREATE INDEX idx_activity_sessions_user_login ON activity_sessions(user_id, login_at);
CREATE INDEX idx_activity_sessions_user_last_entry ON activity_sessions(user_id, last_entry_at);

-- Monthly leaderboard aggregates, upserted by the recompute pass
CREATE TABLE monthly_entry_ranks (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    year INT NOT NULL,
    month INT NOT NULL,
    total_entries BIGINT NOT NULL DEFAULT 0,
    last_entry_at TIMESTAMPTZ,
    last_notified_rank INT,
    last_position_loss_notified_at TIMESTAMPTZ,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_month_range CHECK (month BETWEEN 1 AND 12),
    CONSTRAINT uq_entry_ranks_user_month UNIQUE (user_id, year, month)
);

-- Ranking reads one month ordered by total
CREATE INDEX idx_entry_ranks_month ON monthly_entry_ranks(year, month, total_entries DESC);

-- Notification inbox, producer-agnostic
CREATE TABLE notifications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    title VARCHAR(255) NOT NULL,
    entity VARCHAR(64) NOT NULL,
    entity_id UUID,
    type_of_action VARCHAR(64),
    path VARCHAR(255),
    payload JSONB,
    is_read BOOLEAN NOT NULL DEFAULT FALSE,
    is_new BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Inbox listing (most recent first)
CREATE INDEX idx_notifications_user_created ON notifications(user_id, created_at DESC);

-- Unseen badge count
CREATE INDEX idx_notifications_user_new ON notifications(user_id) WHERE is_new;
";
