//! `SeaORM` entity definitions.

pub mod activity_sessions;
pub mod monthly_entry_ranks;
pub mod notifications;
