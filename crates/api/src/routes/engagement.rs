//! Engagement read routes: presence calendar, streaks, leaderboard.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, middleware::AuthUser, routes::error_response};
use cadence_core::engagement::{MonthRef, RankedEntry};
use cadence_db::{ActivitySessionRepository, EntryRankRepository};

/// Creates the engagement routes (requires auth middleware to be applied
/// externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/engagement/presence", get(get_presence))
        .route("/engagement/streak", get(get_streak))
        .route("/engagement/rank", get(get_rank))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters selecting a leaderboard month.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
}

/// Response for the presence calendar.
#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    /// Queried year.
    pub year: i32,
    /// Queried month.
    pub month: u32,
    /// Days of the month with at least one recorded activity.
    pub present_days: Vec<u32>,
}

/// Response for the monthly leaderboard.
#[derive(Debug, Serialize)]
pub struct RankResponse {
    /// Queried year.
    pub year: i32,
    /// Queried month.
    pub month: u32,
    /// Top leaderboard entries.
    pub top: Vec<RankedEntry>,
    /// The calling user's entry, absent when they have no activity that
    /// month.
    pub my_rank: Option<RankedEntry>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/engagement/presence?year&month` - Present days for one month.
async fn get_presence(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    let month = match MonthRef::new(query.year, query.month) {
        Ok(month) => month,
        Err(e) => return error_response(e.into()),
    };

    let repo = ActivitySessionRepository::new((*state.db).clone(), state.reporting_tz);

    match repo.present_days(auth.user_id(), month).await {
        Ok(days) => Json(PresenceResponse {
            year: month.year(),
            month: month.month(),
            present_days: days.into_iter().collect(),
        })
        .into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// GET `/engagement/streak` - Current and longest consecutive-day streak.
async fn get_streak(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = ActivitySessionRepository::new((*state.db).clone(), state.reporting_tz);

    match repo.streak(auth.user_id(), None).await {
        Ok(streak) => Json(streak).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// GET `/engagement/rank?year&month` - Leaderboard top list plus the
/// caller's own position.
async fn get_rank(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    let month = match MonthRef::new(query.year, query.month) {
        Ok(month) => month,
        Err(e) => return error_response(e.into()),
    };

    let repo = EntryRankRepository::new((*state.db).clone(), state.reporting_tz);

    let top = match repo.top(month, state.leaderboard_size).await {
        Ok(top) => top,
        Err(e) => return error_response(e.into()),
    };
    let my_rank = match repo.user_rank(auth.user_id(), month).await {
        Ok(my_rank) => my_rank,
        Err(e) => return error_response(e.into()),
    };

    Json(RankResponse {
        year: month.year(),
        month: month.month(),
        top,
        my_rank,
    })
    .into_response()
}
