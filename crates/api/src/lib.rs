//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for sessions, engagement reads, and the inbox
//! - Identity middleware (the verified user id comes from the gateway)
//! - Response types

pub mod middleware;
pub mod routes;

use axum::Router;
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cadence_core::engagement::RankLossPolicy;
use cadence_shared::EngagementConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Fixed reporting timezone for all calendar-day reckoning.
    pub reporting_tz: Tz,
    /// Rank-loss notification policy.
    pub rank_policy: RankLossPolicy,
    /// Number of entries in the leaderboard top list.
    pub leaderboard_size: usize,
}

impl AppState {
    /// Builds application state from a connection and engagement config.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured reporting timezone is unknown.
    pub fn new(
        db: Arc<DatabaseConnection>,
        engagement: &EngagementConfig,
    ) -> cadence_shared::AppResult<Self> {
        Ok(Self {
            db,
            reporting_tz: engagement.reporting_tz()?,
            rank_policy: RankLossPolicy {
                min_drop: engagement.rank_loss_min_drop,
            },
            leaderboard_size: usize::try_from(engagement.leaderboard_size).unwrap_or(10),
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
