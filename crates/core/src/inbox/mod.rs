//! Notification inbox domain types.

pub mod payload;

pub use payload::{ACTION_RANK_LOSS, ENTITY_RANK, NotificationPayload};
