//! Typed notification payloads.
//!
//! Payload shape is fixed per kind; producers outside this crate attach
//! whatever they need through the `Custom` variant, which stays opaque.

use serde::{Deserialize, Serialize};

/// Logical source type of leaderboard notifications.
pub const ENTITY_RANK: &str = "RANK";

/// Action classification for rank-loss notifications.
pub const ACTION_RANK_LOSS: &str = "RANK_LOSS";

/// Structured notification payload, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPayload {
    /// A user's leaderboard position worsened.
    RankLoss {
        /// The last rank the user was notified about.
        previous_rank: u32,
        /// The newly computed rank.
        new_rank: u32,
        /// Leaderboard year.
        year: i32,
        /// Leaderboard month (1-12).
        month: u32,
    },
    /// Producer-defined extension data, opaque to this subsystem.
    Custom {
        /// Arbitrary structured data.
        data: serde_json::Value,
    },
}

impl NotificationPayload {
    /// The `type_of_action` classification implied by this payload, if any.
    #[must_use]
    pub const fn type_of_action(&self) -> Option<&'static str> {
        match self {
            Self::RankLoss { .. } => Some(ACTION_RANK_LOSS),
            Self::Custom { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rank_loss_wire_shape() {
        let payload = NotificationPayload::RankLoss {
            previous_rank: 1,
            new_rank: 3,
            year: 2026,
            month: 3,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "kind": "RANK_LOSS",
                "previous_rank": 1,
                "new_rank": 3,
                "year": 2026,
                "month": 3,
            })
        );
    }

    #[test]
    fn test_round_trip() {
        let payload = NotificationPayload::Custom {
            data: json!({"routine_id": 7, "note": "missed"}),
        };
        let back: NotificationPayload =
            serde_json::from_value(serde_json::to_value(&payload).unwrap()).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_type_of_action() {
        let loss = NotificationPayload::RankLoss {
            previous_rank: 2,
            new_rank: 4,
            year: 2026,
            month: 3,
        };
        assert_eq!(loss.type_of_action(), Some(ACTION_RANK_LOSS));
        let custom = NotificationPayload::Custom { data: json!(null) };
        assert_eq!(custom.type_of_action(), None);
    }
}
