//! API route definitions.

use axum::{
    Json, Router, middleware,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::auth::auth_middleware};
use cadence_shared::AppError;

pub mod engagement;
pub mod health;
pub mod notifications;
pub mod sessions;

/// Creates the API router with protected routes behind the identity
/// middleware.
pub fn api_routes() -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(sessions::routes())
        .merge(engagement::routes())
        .merge(notifications::routes())
        .layer(middleware::from_fn(auth_middleware));

    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Maps an application error to a JSON response.
///
/// Validation and not-found details are surfaced verbatim; everything
/// else is logged and replaced with a generic message so storage errors
/// never leak to callers.
pub(crate) fn error_response(err: AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = if err.is_internal() {
        error!(error = %err, "request failed");
        "An error occurred".to_string()
    } else {
        err.to_string()
    };

    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": message
        })),
    )
        .into_response()
}
