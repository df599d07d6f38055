//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod activity_session;
pub mod entry_rank;
pub mod notification;

pub use activity_session::{ActivitySessionError, ActivitySessionRepository};
pub use entry_rank::{EntryRankError, EntryRankRepository, RankPassSummary};
pub use notification::{
    CreateNotificationInput, NotificationError, NotificationFilter, NotificationRepository,
    NotificationSortBy,
};
