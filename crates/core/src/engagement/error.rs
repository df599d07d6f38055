//! Engagement error types.

use thiserror::Error;

use cadence_shared::AppError;

/// Engagement-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngagementError {
    /// Month outside 1-12.
    #[error("Month out of range: {month} (expected 1-12)")]
    MonthOutOfRange {
        /// The rejected month value.
        month: u32,
    },

    /// Year outside the supported reporting range.
    #[error("Year out of range: {year}")]
    YearOutOfRange {
        /// The rejected year value.
        year: i32,
    },
}

impl From<EngagementError> for AppError {
    fn from(err: EngagementError) -> Self {
        Self::Validation(err.to_string())
    }
}
