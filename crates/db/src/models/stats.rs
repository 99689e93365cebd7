//! Raw aggregate rows read by the reporting queries.

use sqlx::FromRow;

/// Total/new/repeat detection counts over a time range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct DetectionCounts {
    pub total: i64,
    pub new: i64,
    pub repeat: i64,
}

/// Detection count for one `HH:00` bucket.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct HourlyCount {
    pub hour: String,
    pub count: i64,
}
