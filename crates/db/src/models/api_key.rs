//! Organization API key model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use manta_core::types::{DbId, Timestamp};

/// A row from the `api_keys` table.
///
/// **Note:** `key_hash` is never serialized to responses. The `key_prefix`
/// field is used for human-readable identification.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApiKey {
    pub id: DbId,
    pub organization_id: DbId,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub key_prefix: String,
    pub expires_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
    pub last_used_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A live API key joined with its organization, as resolved during authentication.
#[derive(Debug, Clone, FromRow)]
pub struct ActiveApiKey {
    pub id: DbId,
    pub organization_id: DbId,
    pub is_default_organization: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApiKey {
    pub description: Option<String>,
    pub expires_at: Option<Timestamp>,
}

/// Response returned when a new API key is created.
/// Includes the plaintext key (shown exactly once).
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyCreatedResponse {
    pub id: DbId,
    pub organization_id: DbId,
    pub key_prefix: String,
    /// The full plaintext key. Shown **once** and never stored.
    pub plaintext_key: String,
    pub description: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl ApiKeyCreatedResponse {
    pub fn new(key: ApiKey, plaintext_key: String) -> Self {
        Self {
            id: key.id,
            organization_id: key.organization_id,
            key_prefix: key.key_prefix,
            plaintext_key,
            description: key.description,
            expires_at: key.expires_at,
            created_at: key.created_at,
        }
    }
}
