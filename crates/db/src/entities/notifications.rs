//! `SeaORM` Entity for the notifications table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Generic inbox entry, producer-agnostic.
///
/// `is_read` and `is_new` are independent flags: `is_new` backs the unseen
/// badge count and is cleared in bulk, `is_read` is per-item.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Logical source type, e.g. "RANK".
    pub entity: String,
    pub entity_id: Option<Uuid>,
    /// Free-form classification, e.g. "RANK_LOSS".
    pub type_of_action: Option<String>,
    /// Optional deep link into the client.
    pub path: Option<String>,
    pub payload: Option<Json>,
    pub is_read: bool,
    pub is_new: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
