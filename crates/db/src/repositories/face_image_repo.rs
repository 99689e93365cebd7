//! Repository for the `face_images` table.

use sqlx::PgPool;
use manta_core::pagination::PageRequest;
use manta_core::types::DbId;

use crate::models::face_image::{CreateFaceImage, FaceImage};

const COLUMNS: &str = "id, person_hash, organization_id, camera_id, image_url, thumbnail_url, \
    storage_key, created_at, updated_at";

pub struct FaceImageRepo;

impl FaceImageRepo {
    pub async fn create(pool: &PgPool, input: &CreateFaceImage) -> Result<FaceImage, sqlx::Error> {
        let query = format!(
            "INSERT INTO face_images \
                (person_hash, organization_id, camera_id, image_url, thumbnail_url, storage_key) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FaceImage>(&query)
            .bind(&input.person_hash)
            .bind(input.organization_id)
            .bind(&input.camera_id)
            .bind(&input.image_url)
            .bind(&input.thumbnail_url)
            .bind(&input.storage_key)
            .fetch_one(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        id: DbId,
        organization_id: DbId,
    ) -> Result<Option<FaceImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM face_images \
             WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, FaceImage>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// List a person's face images, newest first.
    pub async fn list_for_person(
        pool: &PgPool,
        person_hash: &str,
        organization_id: DbId,
        page: &PageRequest,
    ) -> Result<Vec<FaceImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM face_images \
             WHERE person_hash = $1 AND organization_id = $2 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, FaceImage>(&query)
            .bind(person_hash)
            .bind(organization_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_person(
        pool: &PgPool,
        person_hash: &str,
        organization_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM face_images \
             WHERE person_hash = $1 AND organization_id = $2 AND deleted_at IS NULL",
        )
        .bind(person_hash)
        .bind(organization_id)
        .fetch_one(pool)
        .await
    }

    /// Soft-delete one face image, returning the row so its blob can be removed.
    pub async fn soft_delete(
        pool: &PgPool,
        id: DbId,
        organization_id: DbId,
    ) -> Result<Option<FaceImage>, sqlx::Error> {
        let query = format!(
            "UPDATE face_images SET deleted_at = NOW() \
             WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FaceImage>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }
}
