//! Identity middleware for protected routes.
//!
//! Credential issuance and verification live in an external
//! authenticator; by the time a request reaches this service the gateway
//! has already verified the caller and forwards the identity in the
//! `x-user-id` header. This middleware rejects requests without one and
//! makes the identity available to handlers.

use axum::{
    Json,
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

/// Header carrying the gateway-verified user identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Verified identity stored in request extensions.
#[derive(Debug, Clone, Copy)]
struct VerifiedUser(Uuid);

/// Identity middleware.
///
/// 1. Reads the `x-user-id` header set by the authenticating gateway
/// 2. Rejects requests without a parseable identity
/// 3. Stores the identity in request extensions for handlers to access
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok());

    let Some(user_id) = header.and_then(|value| Uuid::parse_str(value).ok()) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "missing_identity",
                "message": "A verified x-user-id header is required"
            })),
        )
            .into_response();
    };

    request.extensions_mut().insert(VerifiedUser(user_id));
    next.run(request).await
}

/// Extractor for the verified user identity.
///
/// Use this in handlers to get the calling user:
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.user_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(Uuid);

impl AuthUser {
    /// Returns the verified user id.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedUser>()
            .map(|v| Self(v.0))
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "unauthorized",
                        "message": "Authentication required"
                    })),
                )
            })
    }
}
