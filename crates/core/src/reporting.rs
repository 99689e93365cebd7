//! Report date handling and result types.
//!
//! Reports are computed per calendar day in UTC. Results are plain
//! serializable structs so they can be cached verbatim.

use chrono::{NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Accepted `date` format for report queries.
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Cache key prefixes, one per report query.
pub const QUERY_DAILY_SUMMARY: &str = "daily_summary";
pub const QUERY_HEATMAP: &str = "heatmap";
pub const QUERY_PERSON_STATS: &str = "person_stats";

/// Parse an optional `YYYY-MM-DD` string, defaulting to `today`.
///
/// Dates whose day range cannot be represented are rejected.
pub fn parse_report_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, CoreError> {
    let date = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => today,
        Some(s) => NaiveDate::parse_from_str(s, REPORT_DATE_FORMAT).map_err(|_| {
            CoreError::Validation(format!("Invalid date '{s}'. Expected format YYYY-MM-DD"))
        })?,
    };
    day_bounds(date)?;
    Ok(date)
}

/// Half-open UTC range `[start_of_day, start_of_day + 24h)`.
pub fn day_bounds(date: NaiveDate) -> Result<(Timestamp, Timestamp), CoreError> {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    let end = start
        .checked_add_signed(TimeDelta::hours(24))
        .ok_or_else(|| CoreError::Validation(format!("Date {date} is out of range")))?;
    Ok((start, end))
}

/// Cache key for a report: `{query}:{organization_id}:{date}`.
pub fn report_cache_key(query: &str, organization_id: DbId, date: NaiveDate) -> String {
    format!("{query}:{organization_id}:{}", date.format(REPORT_DATE_FORMAT))
}

/// Total/new/repeat detection counts for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub total: i64,
    pub new: i64,
    pub repeat: i64,
    pub organization_id: DbId,
}

/// Detection count for one hour-of-day bucket (`"HH:00"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapBucket {
    pub hour: String,
    pub count: i64,
}

/// Hourly detection density for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heatmap {
    pub date: String,
    pub organization_id: DbId,
    pub buckets: Vec<HeatmapBucket>,
}

/// New vs repeat detections for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonStats {
    pub date: String,
    pub new: i64,
    pub repeat: i64,
    pub organization_id: DbId,
}
