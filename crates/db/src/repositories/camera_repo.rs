//! Repository for the `cameras` table.

use sqlx::{PgConnection, PgPool};
use manta_core::pagination::PageRequest;
use manta_core::types::DbId;

use crate::models::camera::{Camera, CreateCamera, UpdateCamera, CAMERA_STATUS_ACTIVE};

const COLUMNS: &str = "id, name, location, status, organization_id, created_at, updated_at";

pub struct CameraRepo;

impl CameraRepo {
    /// Register a camera under `organization_id` with the given device id.
    pub async fn create(
        pool: &PgPool,
        id: &str,
        organization_id: DbId,
        input: &CreateCamera,
    ) -> Result<Camera, sqlx::Error> {
        let query = format!(
            "INSERT INTO cameras (id, name, location, status, organization_id) \
             VALUES ($1, $2, $3, COALESCE($4, '{CAMERA_STATUS_ACTIVE}'), $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Camera>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.location)
            .bind(&input.status)
            .bind(organization_id)
            .fetch_one(pool)
            .await
    }

    /// Find a live camera by id within an organization.
    pub async fn find(
        pool: &PgPool,
        id: &str,
        organization_id: DbId,
    ) -> Result<Option<Camera>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cameras \
             WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Camera>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// Organization owning a live camera. Used to route detection events.
    pub async fn organization_of(
        conn: &mut PgConnection,
        camera_id: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT organization_id FROM cameras WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(camera_id)
        .fetch_optional(conn)
        .await
    }

    /// List an organization's cameras by name.
    pub async fn list(
        pool: &PgPool,
        organization_id: DbId,
        page: &PageRequest,
    ) -> Result<Vec<Camera>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cameras \
             WHERE organization_id = $1 AND deleted_at IS NULL \
             ORDER BY name, id LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Camera>(&query)
            .bind(organization_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, organization_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM cameras WHERE organization_id = $1 AND deleted_at IS NULL",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await
    }

    /// Update a camera. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: &str,
        organization_id: DbId,
        input: &UpdateCamera,
    ) -> Result<Option<Camera>, sqlx::Error> {
        let query = format!(
            "UPDATE cameras SET
                name = COALESCE($3, name),
                location = COALESCE($4, location),
                status = COALESCE($5, status)
             WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Camera>(&query)
            .bind(id)
            .bind(organization_id)
            .bind(&input.name)
            .bind(&input.location)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    /// Number of live detection logs and face images referencing the camera.
    pub async fn reference_counts(pool: &PgPool, id: &str) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as(
            "SELECT \
                (SELECT COUNT(*) FROM detection_logs WHERE camera_id = $1 AND deleted_at IS NULL), \
                (SELECT COUNT(*) FROM face_images WHERE camera_id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Soft-delete a camera. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(
        pool: &PgPool,
        id: &str,
        organization_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cameras SET deleted_at = NOW() \
             WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(organization_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
