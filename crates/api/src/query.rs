//! Shared query parameter types for API handlers.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use manta_core::pagination::PageRequest;

/// Pagination parameters (`?page=&page_size=`), normalized by [`PageRequest`].
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PaginationParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

/// `?date=YYYY-MM-DD` for the daily reports. Defaults to today (UTC).
#[derive(Debug, Default, Deserialize)]
pub struct ReportDateParams {
    pub date: Option<String>,
}

/// Filters accepted by `GET /logs`.
#[derive(Debug, Default, Deserialize)]
pub struct LogSearchParams {
    /// Inclusive lower bound on the detection time.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the detection time.
    pub to: Option<DateTime<Utc>>,
    pub camera_id: Option<String>,
    pub person_hash: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}
