//! `SeaORM` Entity for the monthly_entry_ranks table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One aggregate row per (user, year, month), upserted by the leaderboard
/// pass. `total_entries` is derivable from activity_sessions but cached
/// here so rank reads are O(rows-in-month).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "monthly_entry_ranks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub year: i32,
    pub month: i32,
    pub total_entries: i64,
    /// Most recent activity within the month; the leaderboard tie-break.
    pub last_entry_at: Option<DateTimeWithTimeZone>,
    /// Baseline rank the user was last acknowledged at.
    pub last_notified_rank: Option<i32>,
    /// Stamped only when a rank-loss notification is actually emitted.
    pub last_position_loss_notified_at: Option<DateTimeWithTimeZone>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
