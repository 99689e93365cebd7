//! Camera model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use manta_core::types::{DbId, Timestamp};

/// Status assigned to cameras created without one.
pub const CAMERA_STATUS_ACTIVE: &str = "active";

/// A row from the `cameras` table.
///
/// The id is the device's own identifier, the same string detection events
/// carry in `camera_id`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Camera {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub status: String,
    pub organization_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a camera. A UUID is generated when `id` is omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCamera {
    pub id: Option<String>,
    pub name: String,
    pub location: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCamera {
    pub name: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}
