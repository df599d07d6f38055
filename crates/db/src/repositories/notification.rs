//! Notification inbox repository.
//!
//! Producer-agnostic: anything in the application can insert here; the
//! inbox itself knows nothing about what produced an entry.

use chrono::Utc;
use sea_orm::sea_query::{Expr, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use cadence_core::inbox::NotificationPayload;
use cadence_shared::AppError;
use cadence_shared::types::{PageRequest, SortOrder};

use crate::entities::notifications;

/// Error types for inbox operations.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a notification.
#[derive(Debug, Clone)]
pub struct CreateNotificationInput {
    /// Recipient.
    pub user_id: Uuid,
    /// Human-readable title.
    pub title: String,
    /// Logical source type, e.g. "RANK".
    pub entity: String,
    /// Source row, when the notification is tied to one.
    pub entity_id: Option<Uuid>,
    /// Classification; derived from the payload when omitted.
    pub type_of_action: Option<String>,
    /// Optional deep link.
    pub path: Option<String>,
    /// Structured payload.
    pub payload: Option<NotificationPayload>,
}

/// Sort key for inbox listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSortBy {
    /// Sort by creation time.
    #[default]
    CreatedAt,
    /// Sort by title.
    Title,
}

/// Filters for inbox listings.
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    /// Only read (true) or unread (false) entries.
    pub is_read: Option<bool>,
    /// Only entries with this classification.
    pub type_of_action: Option<String>,
    /// Case-insensitive title substring.
    pub search: Option<String>,
    /// Sort key.
    pub sort_by: NotificationSortBy,
    /// Sort direction.
    pub order: SortOrder,
}

/// Notification inbox repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        input: CreateNotificationInput,
    ) -> Result<notifications::Model, NotificationError> {
        Ok(self.create_in(&self.db, input).await?)
    }

    /// Inserts a notification through an existing connection or
    /// transaction, so producers can persist alongside their own writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        input: CreateNotificationInput,
    ) -> Result<notifications::Model, DbErr> {
        let type_of_action = input.type_of_action.or_else(|| {
            input
                .payload
                .as_ref()
                .and_then(|p| p.type_of_action().map(String::from))
        });

        let payload = input
            .payload
            .map(|p| serde_json::to_value(&p).map_err(|e| DbErr::Custom(e.to_string())))
            .transpose()?;

        let notification = notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            title: Set(input.title),
            entity: Set(input.entity),
            entity_id: Set(input.entity_id),
            type_of_action: Set(type_of_action),
            path: Set(input.path),
            payload: Set(payload),
            is_read: Set(false),
            is_new: Set(true),
            created_at: Set(Utc::now().into()),
        };

        notification.insert(conn).await
    }

    /// Lists a user's notifications with filters and pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> Result<(Vec<notifications::Model>, u64), NotificationError> {
        let mut query =
            notifications::Entity::find().filter(notifications::Column::UserId.eq(user_id));

        if let Some(is_read) = filter.is_read {
            query = query.filter(notifications::Column::IsRead.eq(is_read));
        }
        if let Some(action) = &filter.type_of_action {
            query = query.filter(notifications::Column::TypeOfAction.eq(action));
        }
        if let Some(search) = &filter.search
            && !search.is_empty()
        {
            query = query
                .filter(Expr::col(notifications::Column::Title).ilike(format!("%{search}%")));
        }

        let total = query.clone().count(&self.db).await?;

        let column = match filter.sort_by {
            NotificationSortBy::CreatedAt => notifications::Column::CreatedAt,
            NotificationSortBy::Title => notifications::Column::Title,
        };
        query = match filter.order {
            SortOrder::Asc => query.order_by_asc(column),
            SortOrder::Desc => query.order_by_desc(column),
        };

        let items = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    /// Counts a user's unseen notifications (the badge count).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_new(&self, user_id: Uuid) -> Result<u64, NotificationError> {
        Ok(notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsNew.eq(true))
            .count(&self.db)
            .await?)
    }

    /// Marks the given notifications as read.
    ///
    /// Only rows owned by the user are touched; ids belonging to another
    /// user are silently skipped, not errored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_read(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, NotificationError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::Id.is_in(ids.to_vec()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Clears the unseen flag on all of a user's notifications.
    ///
    /// Read state is not touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_all_seen(&self, user_id: Uuid) -> Result<u64, NotificationError> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsNew, Expr::value(false))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsNew.eq(true))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
