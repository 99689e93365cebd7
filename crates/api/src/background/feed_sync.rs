//! Feed ingestion driver: one backfill pass, then live sync from the
//! newest event stored before that pass.

use std::sync::Arc;

use manta_db::DbPool;
use manta_ingest::live::initial_watermark;
use manta_ingest::{run_backfill, run_live_sync, EventSource, Reconciler, SyncConfig};
use tokio_util::sync::CancellationToken;

/// Run until `cancel` fires or the subscription fails fatally.
pub async fn run(
    pool: DbPool,
    reconciler: Arc<Reconciler>,
    source: Arc<dyn EventSource>,
    config: SyncConfig,
    cancel: CancellationToken,
) {
    // Read before the backfill: it only stores the newest records, so the
    // stored maximum afterwards can sit above events missed while offline.
    let watermark = match initial_watermark(&pool).await {
        Ok(watermark) => watermark,
        Err(e) => {
            tracing::error!(error = %e, "Could not read sync watermark, feed sync not started");
            return;
        }
    };

    match run_backfill(
        &reconciler,
        source.as_ref(),
        &config.logs_path,
        config.backfill_limit,
        &config.retry,
        &cancel,
    )
    .await
    {
        Ok(report) => tracing::info!(
            fetched = report.fetched,
            recorded = report.recorded,
            duplicates = report.duplicates,
            rejected = report.rejected,
            failed = report.failed,
            "Startup backfill finished"
        ),
        Err(e) => tracing::warn!(error = %e, "Startup backfill failed, continuing with live sync"),
    }

    if cancel.is_cancelled() {
        return;
    }

    let path = config.logs_path.clone();
    match run_live_sync(reconciler, source, path, watermark, config, cancel).await {
        Ok(summary) => tracing::info!(
            received = summary.received,
            recorded = summary.recorded,
            duplicates = summary.duplicates,
            requeued = summary.requeued,
            failed = summary.failed,
            "Live sync stopped"
        ),
        Err(e) => tracing::error!(error = %e, "Live sync terminated"),
    }
}
