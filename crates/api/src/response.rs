//! Shared response envelope types for API handlers.
//!
//! Single resources use `{ "data": ... }`; listings add a `pagination` block.

use serde::Serialize;
use manta_core::pagination::Pagination;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "pagination": {...} }` envelope for paginated listings.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}
