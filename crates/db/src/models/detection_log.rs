//! Detection log model, insert input, and search filter.

use serde::Serialize;
use sqlx::FromRow;
use manta_core::types::{DbId, Timestamp};

/// A row from the `detection_logs` table. Immutable apart from soft deletion.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DetectionLog {
    pub id: DbId,
    pub external_id: Option<String>,
    #[serde(rename = "timestamp")]
    pub detected_at: Timestamp,
    pub person_hash: String,
    pub camera_id: String,
    pub organization_id: DbId,
    pub is_new_person: bool,
    pub created_at: Timestamp,
}

/// Input for the deduplicating insert.
#[derive(Debug, Clone)]
pub struct NewDetectionLog<'a> {
    pub external_id: Option<&'a str>,
    pub detected_at: Timestamp,
    pub person_hash: &'a str,
    pub camera_id: &'a str,
    pub organization_id: DbId,
}

/// The row written by a successful deduplicating insert.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct InsertedLog {
    pub id: DbId,
    pub is_new_person: bool,
}

/// Optional filters for log search. `from` is inclusive, `to` exclusive.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub camera_id: Option<String>,
    pub person_hash: Option<String>,
}
