//! Cadence API Server
//!
//! Main entry point for the Cadence engagement backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cadence_api::{AppState, create_router};
use cadence_core::engagement::MonthRef;
use cadence_db::{EntryRankRepository, NotificationRepository, connect};
use cadence_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create application state (validates the reporting timezone up front)
    let state = AppState::new(Arc::new(db), &config.engagement)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    info!(
        timezone = %config.engagement.reporting_timezone,
        rank_loss_min_drop = config.engagement.rank_loss_min_drop,
        "Engagement subsystem configured"
    );

    // Background leaderboard pass: recompute + rank + notify on a schedule
    spawn_rank_pass_job(&state, config.engagement.recompute_interval_secs);

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Spawns the periodic leaderboard pass for the current reporting month.
///
/// A failed pass only logs; the aggregation is an idempotent upsert, so
/// the next tick redoes it.
fn spawn_rank_pass_job(state: &AppState, interval_secs: u64) {
    let ranks = EntryRankRepository::new((*state.db).clone(), state.reporting_tz);
    let inbox = NotificationRepository::new((*state.db).clone());
    let policy = state.rank_policy;
    let tz = state.reporting_tz;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let today = Utc::now().with_timezone(&tz).date_naive();
            let month = MonthRef::containing(today);

            match ranks.run_pass(month, &inbox, &policy).await {
                Ok(summary) => info!(
                    %month,
                    users = summary.users_ranked,
                    notified = summary.notifications_sent,
                    "scheduled leaderboard pass finished"
                ),
                Err(e) => error!(error = %e, %month, "scheduled leaderboard pass failed"),
            }
        }
    });
}
