//! One-shot drain of recent historical events.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::SyncError;
use crate::reconciler::{OutcomeCounts, Reconciler};
use crate::retry::RetryPolicy;
use crate::source::{EventSource, FeedRecord};

/// Summary of one backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub fetched: usize,
    pub recorded: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl BackfillReport {
    fn new(fetched: usize, counts: OutcomeCounts) -> Self {
        Self {
            fetched,
            recorded: counts.recorded,
            duplicates: counts.duplicates,
            rejected: counts.rejected,
            failed: counts.failed,
        }
    }
}

/// Fetch up to `limit` recent records and reconcile them in timestamp order.
///
/// Per-event errors are counted and logged without aborting the batch; only a
/// failure of the fetch itself is returned. Re-running is idempotent.
/// Cancellation stops the batch between events.
pub async fn run_backfill(
    reconciler: &Reconciler,
    source: &dyn EventSource,
    path: &str,
    limit: usize,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<BackfillReport, SyncError> {
    let records = source.recent(path, limit).await?;
    let fetched = records.len();
    tracing::info!(path, fetched, limit, "Backfill started");

    let mut counts = OutcomeCounts::default();
    for record in records {
        if cancel.is_cancelled() {
            tracing::info!(path, "Backfill cancelled");
            break;
        }
        match record {
            FeedRecord::Event(event) => {
                let result = reconciler.reconcile_with_retry(&event, retry, cancel).await;
                counts.record(&event, &result);
            }
            FeedRecord::Malformed { key, reason, .. } => {
                counts.rejected += 1;
                tracing::warn!(key = %key, reason = %reason, "Skipping malformed feed record");
            }
        }
    }

    let report = BackfillReport::new(fetched, counts);
    tracing::info!(
        path,
        fetched = report.fetched,
        recorded = report.recorded,
        duplicates = report.duplicates,
        rejected = report.rejected,
        failed = report.failed,
        "Backfill finished",
    );
    Ok(report)
}
