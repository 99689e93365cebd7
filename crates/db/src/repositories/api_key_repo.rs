//! Repository for the `api_keys` table.

use sqlx::PgPool;
use manta_core::types::DbId;

use crate::models::api_key::{ActiveApiKey, ApiKey, CreateApiKey};

const COLUMNS: &str = "id, organization_id, description, key_hash, key_prefix, expires_at, \
    revoked_at, last_used_at, created_at, updated_at";

/// Provides CRUD operations for organization API keys.
pub struct ApiKeyRepo;

impl ApiKeyRepo {
    /// Create a new API key. Returns the full row (with hash).
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        input: &CreateApiKey,
        key_hash: &str,
        key_prefix: &str,
    ) -> Result<ApiKey, sqlx::Error> {
        let query = format!(
            "INSERT INTO api_keys (organization_id, description, key_hash, key_prefix, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApiKey>(&query)
            .bind(organization_id)
            .bind(&input.description)
            .bind(key_hash)
            .bind(key_prefix)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// List an organization's keys, newest first. Revoked keys are included.
    pub async fn list(pool: &PgPool, organization_id: DbId) -> Result<Vec<ApiKey>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM api_keys WHERE organization_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ApiKey>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Resolve a key hash to a usable key.
    ///
    /// Returns `None` for unknown, revoked or expired keys, and for keys whose
    /// organization has been deleted.
    pub async fn find_active_by_hash(
        pool: &PgPool,
        key_hash: &str,
    ) -> Result<Option<ActiveApiKey>, sqlx::Error> {
        sqlx::query_as::<_, ActiveApiKey>(
            "SELECT ak.id, ak.organization_id, o.is_default AS is_default_organization \
             FROM api_keys ak \
             JOIN organizations o ON o.id = ak.organization_id AND o.deleted_at IS NULL \
             WHERE ak.key_hash = $1 \
               AND ak.revoked_at IS NULL \
               AND (ak.expires_at IS NULL OR ak.expires_at > NOW())",
        )
        .bind(key_hash)
        .fetch_optional(pool)
        .await
    }

    /// Number of usable keys an organization holds.
    pub async fn count_active(pool: &PgPool, organization_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM api_keys \
             WHERE organization_id = $1 AND revoked_at IS NULL \
               AND (expires_at IS NULL OR expires_at > NOW())",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await
    }

    /// Record a successful authentication.
    pub async fn touch(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Revoke a key. Returns `true` if a live key was revoked.
    pub async fn revoke(
        pool: &PgPool,
        id: DbId,
        organization_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE api_keys SET revoked_at = NOW() \
             WHERE id = $1 AND organization_id = $2 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(organization_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
