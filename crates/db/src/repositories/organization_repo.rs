//! Repository for the `organizations` table.

use sqlx::PgPool;
use manta_core::pagination::PageRequest;
use manta_core::types::DbId;

use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};

const COLUMNS: &str = "id, name, description, is_default, created_at, updated_at";

/// Live rows that still reference an organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct OrganizationDependents {
    pub cameras: i64,
    pub detection_logs: i64,
    pub face_images: i64,
}

impl OrganizationDependents {
    pub fn is_empty(&self) -> bool {
        self.cameras == 0 && self.detection_logs == 0 && self.face_images == 0
    }
}

pub struct OrganizationRepo;

impl OrganizationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateOrganization,
    ) -> Result<Organization, sqlx::Error> {
        let query = format!(
            "INSERT INTO organizations (name, description) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Organization>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find an organization by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Organization>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM organizations WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// ID of the live default organization, if any.
    pub async fn default_id(pool: &PgPool) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM organizations WHERE is_default AND deleted_at IS NULL",
        )
        .fetch_optional(pool)
        .await
    }

    /// Return the default organization's ID, restoring or creating it if needed.
    pub async fn ensure_default(pool: &PgPool) -> Result<DbId, sqlx::Error> {
        if let Some(id) = Self::default_id(pool).await? {
            return Ok(id);
        }

        let restored: Option<DbId> = sqlx::query_scalar(
            "UPDATE organizations SET deleted_at = NULL WHERE is_default RETURNING id",
        )
        .fetch_optional(pool)
        .await?;
        if let Some(id) = restored {
            tracing::warn!(organization_id = id, "Restored soft-deleted default organization");
            return Ok(id);
        }

        let id = sqlx::query_scalar(
            "INSERT INTO organizations (name, description, is_default) \
             VALUES ('Default Organization', NULL, TRUE) \
             RETURNING id",
        )
        .fetch_one(pool)
        .await?;
        tracing::info!(organization_id = id, "Created default organization");
        Ok(id)
    }

    /// List organizations, oldest first. Excludes soft-deleted rows.
    pub async fn list(
        pool: &PgPool,
        page: &PageRequest,
    ) -> Result<Vec<Organization>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM organizations WHERE deleted_at IS NULL \
             ORDER BY id LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Organization>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await
    }

    /// Update an organization. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no live row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateOrganization,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let query = format!(
            "UPDATE organizations SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Count live cameras, logs and face images owned by the organization.
    pub async fn dependents(
        pool: &PgPool,
        id: DbId,
    ) -> Result<OrganizationDependents, sqlx::Error> {
        sqlx::query_as::<_, OrganizationDependents>(
            "SELECT \
                (SELECT COUNT(*) FROM cameras \
                  WHERE organization_id = $1 AND deleted_at IS NULL) AS cameras, \
                (SELECT COUNT(*) FROM detection_logs \
                  WHERE organization_id = $1 AND deleted_at IS NULL) AS detection_logs, \
                (SELECT COUNT(*) FROM face_images \
                  WHERE organization_id = $1 AND deleted_at IS NULL) AS face_images",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Soft-delete an organization and remove its API keys in one transaction.
    ///
    /// The default organization is never deleted. Returns `true` if a row was
    /// marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE organizations SET deleted_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL AND NOT is_default",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM api_keys WHERE organization_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
