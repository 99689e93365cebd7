//! Read-only aggregate queries backing the reports.
//!
//! Every query covers a half-open `[start, end)` range of `detected_at` and
//! ignores soft-deleted rows.

use sqlx::PgPool;
use manta_core::types::{DbId, Timestamp};

use crate::models::stats::{DetectionCounts, HourlyCount};

pub struct StatsRepo;

impl StatsRepo {
    /// Total detections split by `is_new_person`.
    pub async fn detection_counts(
        pool: &PgPool,
        organization_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<DetectionCounts, sqlx::Error> {
        sqlx::query_as::<_, DetectionCounts>(
            "SELECT \
                COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE is_new_person) AS \"new\", \
                COUNT(*) FILTER (WHERE NOT is_new_person) AS \"repeat\" \
             FROM detection_logs \
             WHERE organization_id = $1 AND deleted_at IS NULL \
               AND detected_at >= $2 AND detected_at < $3",
        )
        .bind(organization_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
    }

    /// Detections per UTC hour-of-day, non-empty buckets only, ordered by hour.
    pub async fn hourly_counts(
        pool: &PgPool,
        organization_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<HourlyCount>, sqlx::Error> {
        sqlx::query_as::<_, HourlyCount>(
            "SELECT TO_CHAR(detected_at AT TIME ZONE 'UTC', 'HH24:00') AS hour, COUNT(*) AS count \
             FROM detection_logs \
             WHERE organization_id = $1 AND deleted_at IS NULL \
               AND detected_at >= $2 AND detected_at < $3 \
             GROUP BY hour \
             ORDER BY hour",
        )
        .bind(organization_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }
}
