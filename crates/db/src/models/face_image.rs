//! Face image model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use manta_core::types::{DbId, Timestamp};

/// A row from the `face_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FaceImage {
    pub id: DbId,
    pub person_hash: String,
    pub organization_id: DbId,
    pub camera_id: String,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    /// Object key in the blob store. Internal, never serialized.
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateFaceImage {
    pub person_hash: String,
    pub organization_id: DbId,
    pub camera_id: String,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub storage_key: String,
}
