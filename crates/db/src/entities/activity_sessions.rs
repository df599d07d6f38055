//! `SeaORM` Entity for the activity_sessions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per login. Rows are never deleted; presence and streaks are
/// derived from the full history.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Opaque correlation token issued at login. Deliberately NOT unique
    /// across time; lookups resolve the newest open session for a token.
    pub session_token: String,
    pub user_id: Uuid,
    pub login_at: DateTimeWithTimeZone,
    /// Set once on logout, immutable afterwards.
    pub logout_at: Option<DateTimeWithTimeZone>,
    /// Login counts as the first entry; pings increment from there.
    pub entry_count: i64,
    pub last_entry_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
