//! Database seeder for Cadence development and testing.
//!
//! Seeds a handful of demo users with a month of login/ping activity and
//! runs one leaderboard pass, so a fresh environment has a populated
//! presence calendar, streaks, and a ranked leaderboard.
//!
//! Usage: cargo run --bin seeder

use chrono::{Duration, Utc};
use chrono_tz::Tz;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use cadence_core::engagement::{MonthRef, RankLossPolicy};
use cadence_db::entities::activity_sessions;
use cadence_db::repositories::{EntryRankRepository, NotificationRepository};

/// Demo user IDs (consistent for all seeds).
const DEMO_USER_IDS: [&str; 3] = [
    "00000000-0000-0000-0000-000000000001",
    "00000000-0000-0000-0000-000000000002",
    "00000000-0000-0000-0000-000000000003",
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let tz: Tz = std::env::var("CADENCE__ENGAGEMENT__REPORTING_TIMEZONE")
        .unwrap_or_else(|_| "UTC".to_string())
        .parse()
        .expect("Invalid reporting timezone");

    println!("Connecting to database...");
    let db = cadence_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding demo activity...");
    seed_demo_activity(&db).await;

    println!("Running leaderboard pass...");
    run_leaderboard_pass(&db, tz).await;

    println!("Seeding complete!");
}

/// Seeds a month of sessions for each demo user.
///
/// Users log in on a staggered cadence (every day / every other day /
/// twice a week) so streaks and the leaderboard come out distinguishable.
async fn seed_demo_activity(db: &DatabaseConnection) {
    let now = Utc::now();

    for (index, raw_id) in DEMO_USER_IDS.iter().enumerate() {
        let user_id = Uuid::parse_str(raw_id).expect("demo user id is a valid UUID");

        let existing = activity_sessions::Entity::find()
            .filter(activity_sessions::Column::UserId.eq(user_id))
            .count(db)
            .await
            .unwrap_or(0);
        if existing > 0 {
            println!("  User {user_id} already has sessions, skipping...");
            continue;
        }

        let step = index + 1;
        let pings_per_session = i64::try_from(3 - index).unwrap_or(1);

        let mut inserted = 0;
        for days_ago in (0..30).step_by(step) {
            let login_at = now - Duration::days(i64::try_from(days_ago).unwrap_or(0));
            let last_entry_at = login_at + Duration::minutes(20 * pings_per_session);

            let session = activity_sessions::ActiveModel {
                id: Set(Uuid::new_v4()),
                session_token: Set(format!("seed-{user_id}-{days_ago}")),
                user_id: Set(user_id),
                login_at: Set(login_at.into()),
                logout_at: Set(Some((last_entry_at + Duration::minutes(5)).into())),
                entry_count: Set(1 + pings_per_session),
                last_entry_at: Set(last_entry_at.into()),
            };

            if let Err(e) = session.insert(db).await {
                eprintln!("Failed to insert session for {user_id}: {e}");
            } else {
                inserted += 1;
            }
        }
        println!("  Inserted {inserted} sessions for user {user_id}");
    }
}

/// Runs one full leaderboard pass for the current month.
async fn run_leaderboard_pass(db: &DatabaseConnection, tz: Tz) {
    let ranks = EntryRankRepository::new(db.clone(), tz);
    let inbox = NotificationRepository::new(db.clone());
    let month = MonthRef::containing(Utc::now().with_timezone(&tz).date_naive());

    match ranks.run_pass(month, &inbox, &RankLossPolicy::default()).await {
        Ok(summary) => println!(
            "  Ranked {} users for {month}, {} notifications",
            summary.users_ranked, summary.notifications_sent
        ),
        Err(e) => eprintln!("Leaderboard pass failed: {e}"),
    }
}
