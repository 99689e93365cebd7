//! Cache-aside report computation.
//!
//! Each report is looked up under its cache key first. A miss, a corrupt
//! cached value, or an unreachable cache all fall through to the store; the
//! fresh result is written back best-effort. Only store failures and
//! unrepresentable dates surface to the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use manta_core::reporting::{
    day_bounds, report_cache_key, DailySummary, Heatmap, HeatmapBucket, PersonStats,
    QUERY_DAILY_SUMMARY, QUERY_HEATMAP, QUERY_PERSON_STATS, REPORT_DATE_FORMAT,
};
use manta_core::types::DbId;
use manta_db::repositories::StatsRepo;
use manta_db::DbPool;

use crate::cache::Cache;
use crate::error::ReportError;

#[derive(Clone)]
pub struct ReportingService {
    pool: DbPool,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl ReportingService {
    pub fn new(pool: DbPool, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { pool, cache, ttl }
    }

    /// Total, new and repeat detections for one UTC day.
    pub async fn daily_summary(
        &self,
        organization_id: DbId,
        date: NaiveDate,
    ) -> Result<DailySummary, ReportError> {
        let key = report_cache_key(QUERY_DAILY_SUMMARY, organization_id, date);
        self.cached(key, || async {
            let (start, end) = day_bounds(date)?;
            let counts = StatsRepo::detection_counts(&self.pool, organization_id, start, end).await?;
            Ok(DailySummary {
                date: format_date(date),
                total: counts.total,
                new: counts.new,
                repeat: counts.repeat,
                organization_id,
            })
        })
        .await
    }

    /// Detections per hour of the day. Hours without detections are omitted.
    pub async fn heatmap(
        &self,
        organization_id: DbId,
        date: NaiveDate,
    ) -> Result<Heatmap, ReportError> {
        let key = report_cache_key(QUERY_HEATMAP, organization_id, date);
        self.cached(key, || async {
            let (start, end) = day_bounds(date)?;
            let rows = StatsRepo::hourly_counts(&self.pool, organization_id, start, end).await?;
            Ok(Heatmap {
                date: format_date(date),
                organization_id,
                buckets: rows
                    .into_iter()
                    .map(|r| HeatmapBucket {
                        hour: r.hour,
                        count: r.count,
                    })
                    .collect(),
            })
        })
        .await
    }

    pub async fn person_stats(
        &self,
        organization_id: DbId,
        date: NaiveDate,
    ) -> Result<PersonStats, ReportError> {
        let key = report_cache_key(QUERY_PERSON_STATS, organization_id, date);
        self.cached(key, || async {
            let (start, end) = day_bounds(date)?;
            let counts = StatsRepo::detection_counts(&self.pool, organization_id, start, end).await?;
            Ok(PersonStats {
                date: format_date(date),
                new: counts.new,
                repeat: counts.repeat,
                organization_id,
            })
        })
        .await
    }

    /// Drop every cached report for one organization and day.
    pub async fn invalidate(&self, organization_id: DbId, date: NaiveDate) {
        for query in [QUERY_DAILY_SUMMARY, QUERY_HEATMAP, QUERY_PERSON_STATS] {
            let key = report_cache_key(query, organization_id, date);
            if let Err(e) = self.cache.delete(&key).await {
                tracing::warn!(error = %e, key = %key, "Failed to invalidate cached report");
            }
        }
    }

    async fn cached<T, F, Fut>(&self, key: String, compute: F) -> Result<T, ReportError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ReportError>>,
    {
        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    tracing::debug!(key = %key, "Report cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Discarding corrupt cached report");
                }
            },
            Ok(None) => tracing::debug!(key = %key, "Report cache miss"),
            Err(e) => tracing::warn!(error = %e, key = %key, "Report cache unavailable"),
        }

        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(&key, &raw, self.ttl).await {
                    tracing::warn!(error = %e, key = %key, "Failed to cache report");
                }
            }
            Err(e) => tracing::warn!(error = %e, key = %key, "Failed to serialize report"),
        }

        Ok(value)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(REPORT_DATE_FORMAT).to_string()
}
