//! Notification inbox routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use cadence_db::repositories::notification::{
    NotificationFilter, NotificationRepository, NotificationSortBy,
};
use cadence_db::entities::notifications;
use cadence_shared::types::{PageRequest, PageResponse, SortOrder};

/// Creates the notification routes (requires auth middleware to be
/// applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/new-count", get(count_new))
        .route("/notifications/mark-read", post(mark_read))
        .route("/notifications/mark-all-seen", post(mark_all_seen))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing notifications.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Only read (true) or unread (false) entries.
    pub is_read: Option<bool>,
    /// Only entries with this classification.
    pub type_of_action: Option<String>,
    /// Case-insensitive title substring.
    pub search: Option<String>,
    /// Sort key.
    #[serde(default)]
    pub sort_by: NotificationSortBy,
    /// Sort direction.
    #[serde(default)]
    pub order: SortOrder,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

impl ListQuery {
    /// Pagination parameters with defaults applied.
    fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Request body for marking notifications read.
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    /// Ids to mark read; ids owned by other users are skipped silently.
    pub ids: Vec<Uuid>,
}

/// Response for a notification.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    /// Notification id.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Logical source type.
    pub entity: String,
    /// Source row id, when tied to one.
    pub entity_id: Option<Uuid>,
    /// Classification.
    pub type_of_action: Option<String>,
    /// Deep link.
    pub path: Option<String>,
    /// Structured payload.
    pub payload: Option<serde_json::Value>,
    /// Whether the user opened this entry.
    pub is_read: bool,
    /// Whether the entry still counts toward the unseen badge.
    pub is_new: bool,
    /// Creation timestamp.
    pub created_at: String,
}

impl From<notifications::Model> for NotificationResponse {
    fn from(model: notifications::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            entity: model.entity,
            entity_id: model.entity_id,
            type_of_action: model.type_of_action,
            path: model.path,
            payload: model.payload,
            is_read: model.is_read,
            is_new: model.is_new,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Response for count and bulk-update endpoints.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// Affected or counted rows.
    pub count: u64,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/notifications` - Paginated, filterable inbox listing.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let page = query.page_request();
    if let Err(e) = page.validate() {
        return error_response(e);
    }

    let filter = NotificationFilter {
        is_read: query.is_read,
        type_of_action: query.type_of_action,
        search: query.search,
        sort_by: query.sort_by,
        order: query.order,
    };

    let repo = NotificationRepository::new((*state.db).clone());

    match repo.list(auth.user_id(), &filter, &page).await {
        Ok((items, total)) => {
            let data: Vec<NotificationResponse> =
                items.into_iter().map(NotificationResponse::from).collect();
            Json(PageResponse::new(data, page.page, page.per_page, total)).into_response()
        }
        Err(e) => error_response(e.into()),
    }
}

/// GET `/notifications/new-count` - Unseen badge count.
async fn count_new(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.count_new(auth.user_id()).await {
        Ok(count) => Json(CountResponse { count }).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// POST `/notifications/mark-read` - Mark the given entries read.
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<MarkReadRequest>,
) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.mark_read(auth.user_id(), &body.ids).await {
        Ok(count) => Json(CountResponse { count }).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// POST `/notifications/mark-all-seen` - Clear the unseen flag on every
/// entry; read state is untouched.
async fn mark_all_seen(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.mark_all_seen(auth.user_id()).await {
        Ok(count) => Json(CountResponse { count }).into_response(),
        Err(e) => error_response(e.into()),
    }
}
