//! Session tracking routes: login, activity ping, logout.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use cadence_db::ActivitySessionRepository;
use cadence_db::entities::activity_sessions;

/// Creates the session routes (requires auth middleware to be applied
/// externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(start_session))
        .route("/sessions/{token}/activity", post(record_activity))
        .route("/sessions/{token}", delete(end_session))
}

// ============================================================================
// Response Types
// ============================================================================

/// Response for a session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Session row id.
    pub id: Uuid,
    /// Opaque correlation token for pings and logout.
    pub session_token: String,
    /// Login timestamp.
    pub login_at: String,
    /// Logout timestamp, once ended.
    pub logout_at: Option<String>,
    /// Recorded activity count (login included).
    pub entry_count: i64,
    /// Most recent activity timestamp.
    pub last_entry_at: String,
}

impl From<activity_sessions::Model> for SessionResponse {
    fn from(model: activity_sessions::Model) -> Self {
        Self {
            id: model.id,
            session_token: model.session_token,
            login_at: model.login_at.to_rfc3339(),
            logout_at: model.logout_at.map(|t| t.to_rfc3339()),
            entry_count: model.entry_count,
            last_entry_at: model.last_entry_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/sessions` - Record a login and issue a session token.
async fn start_session(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = ActivitySessionRepository::new((*state.db).clone(), state.reporting_tz);

    match repo.start(auth.user_id()).await {
        Ok(session) => {
            (StatusCode::CREATED, Json(SessionResponse::from(session))).into_response()
        }
        Err(e) => error_response(e.into()),
    }
}

/// POST `/sessions/{token}/activity` - Record an activity ping.
async fn record_activity(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(token): Path<String>,
) -> impl IntoResponse {
    let repo = ActivitySessionRepository::new((*state.db).clone(), state.reporting_tz);

    match repo.record_activity(&token).await {
        Ok(session) => Json(SessionResponse::from(session)).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// DELETE `/sessions/{token}` - Record a logout.
///
/// Idempotent: ending an already-ended session returns its persisted
/// state rather than erroring.
async fn end_session(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(token): Path<String>,
) -> impl IntoResponse {
    let repo = ActivitySessionRepository::new((*state.db).clone(), state.reporting_tz);

    match repo.end(&token).await {
        Ok(session) => Json(SessionResponse::from(session)).into_response(),
        Err(e) => error_response(e.into()),
    }
}
