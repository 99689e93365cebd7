//! Repository for the `detection_logs` table.

use sqlx::{PgConnection, PgPool};
use manta_core::pagination::PageRequest;
use manta_core::types::{DbId, Timestamp};

use crate::models::detection_log::{DetectionLog, InsertedLog, LogFilter, NewDetectionLog};

const COLUMNS: &str = "id, external_id, detected_at, person_hash, camera_id, organization_id, \
    is_new_person, created_at";

/// Shared `WHERE` clause for log search; `$1` is the organization.
const SEARCH_FILTER: &str = "organization_id = $1 AND deleted_at IS NULL \
    AND ($2::TIMESTAMPTZ IS NULL OR detected_at >= $2) \
    AND ($3::TIMESTAMPTZ IS NULL OR detected_at < $3) \
    AND ($4::TEXT IS NULL OR camera_id = $4) \
    AND ($5::TEXT IS NULL OR person_hash = $5)";

pub struct DetectionLogRepo;

impl DetectionLogRepo {
    /// Insert a detection log unless its dedup key already exists.
    ///
    /// `is_new_person` is decided in the same statement: true iff no live log
    /// for the hash in the same organization has a strictly earlier
    /// `detected_at`. Returns `None` when
    /// the dedup key `(person_hash, camera_id, detected_at)` was already
    /// present, including on soft-deleted rows.
    pub async fn insert_dedup(
        conn: &mut PgConnection,
        log: &NewDetectionLog<'_>,
    ) -> Result<Option<InsertedLog>, sqlx::Error> {
        sqlx::query_as::<_, InsertedLog>(
            "INSERT INTO detection_logs \
                (external_id, detected_at, person_hash, camera_id, organization_id, is_new_person) \
             SELECT $1, $2, $3, $4, $5, NOT EXISTS ( \
                 SELECT 1 FROM detection_logs \
                 WHERE person_hash = $3 AND organization_id = $5 \
                   AND detected_at < $2 AND deleted_at IS NULL) \
             ON CONFLICT (person_hash, camera_id, detected_at) DO NOTHING \
             RETURNING id, is_new_person",
        )
        .bind(log.external_id)
        .bind(log.detected_at)
        .bind(log.person_hash)
        .bind(log.camera_id)
        .bind(log.organization_id)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DetectionLog>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM detection_logs WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, DetectionLog>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Search an organization's logs, newest first.
    pub async fn search(
        pool: &PgPool,
        organization_id: DbId,
        filter: &LogFilter,
        page: &PageRequest,
    ) -> Result<Vec<DetectionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM detection_logs WHERE {SEARCH_FILTER} \
             ORDER BY detected_at DESC, id DESC LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, DetectionLog>(&query)
            .bind(organization_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&filter.camera_id)
            .bind(&filter.person_hash)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Total rows matching a search, ignoring pagination.
    pub async fn count(
        pool: &PgPool,
        organization_id: DbId,
        filter: &LogFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM detection_logs WHERE {SEARCH_FILTER}");
        sqlx::query_scalar(&query)
            .bind(organization_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&filter.camera_id)
            .bind(&filter.person_hash)
            .fetch_one(pool)
            .await
    }

    /// Newest `detected_at` across all rows, used as the live sync watermark.
    pub async fn latest_detected_at(pool: &PgPool) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar("SELECT MAX(detected_at) FROM detection_logs")
            .fetch_one(pool)
            .await
    }
}
