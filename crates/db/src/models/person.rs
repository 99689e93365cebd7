//! Person aggregate model.

use serde::Serialize;
use sqlx::FromRow;
use manta_core::types::{DbId, Timestamp};

/// A row from the `persons` table.
///
/// Only the person ledger (`PersonRepo`) mutates these rows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Person {
    pub id: DbId,
    pub person_hash: String,
    pub organization_id: DbId,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
    pub visit_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Per-person visit statistics derived from the detection logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonVisitStats {
    pub person_hash: String,
    pub organization_id: DbId,
    pub total_visits: i64,
    /// Always 1: the first visit.
    pub new: i64,
    pub repeat: i64,
    pub face_image_count: i64,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
}
