//! Error types for the aggregation engine and its configuration

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    /// The record and the period plan disagree on the range. Callers that
    /// render charts clamp and log this instead of surfacing it.
    #[error("bucket index {index} outside 0..{period_count} for record at {date}")]
    BucketIndexOutOfRange {
        index: i64,
        period_count: usize,
        date: i64,
    },

    #[error("invalid value for {field}: {reason}")]
    Config { field: &'static str, reason: String },

    #[error("failed to serialize chart payload: {0}")]
    Json(#[from] serde_json::Error),
}
