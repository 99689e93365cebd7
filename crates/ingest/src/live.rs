//! Long-running sync supervisor feeding the reconciler from a subscription.

use std::collections::VecDeque;
use std::sync::Arc;

use manta_core::event::RawEvent;
use manta_db::repositories::DetectionLogRepo;
use manta_db::DbPool;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::reconciler::{OutcomeCounts, Reconciler};
use crate::source::{subscribe, EventSource, PollSettings};

/// Upper bound on events waiting for another reconcile attempt.
pub const MAX_DEFERRED: usize = 1_000;

/// Totals for one live sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LiveSyncSummary {
    pub received: usize,
    pub recorded: usize,
    pub duplicates: usize,
    pub rejected: usize,
    /// Times an event was put back on the deferred queue.
    pub requeued: usize,
    pub failed: usize,
}

/// Watermark to resume from: the newest stored event time, or zero.
pub async fn initial_watermark(pool: &DbPool) -> Result<i64, sqlx::Error> {
    Ok(DetectionLogRepo::latest_detected_at(pool)
        .await?
        .map(|ts| ts.timestamp())
        .unwrap_or(0))
}

/// Reconcile every event from a subscription until `cancel` fires or the
/// subscription ends.
///
/// Reconcile errors are logged and the loop continues. The subscription
/// watermark moves past an event once it is handed over, so an event that
/// still fails with a retryable error after `config.retry` is kept on a
/// deferred queue (at most [`MAX_DEFERRED`]) and retried every
/// `poll_interval`. Events still deferred at shutdown, or pushed out of a
/// full queue, count as `failed` and are not replayed by a restart whose
/// watermark is already past them. An event already being reconciled
/// completes before shutdown. A fatal subscription error is returned once
/// the channel has closed.
pub async fn run_live_sync(
    reconciler: Arc<Reconciler>,
    source: Arc<dyn EventSource>,
    path: String,
    watermark: i64,
    config: SyncConfig,
    cancel: CancellationToken,
) -> Result<LiveSyncSummary, SyncError> {
    let settings = PollSettings {
        interval: config.poll_interval,
        fetch_timeout: config.fetch_timeout,
    };
    let mut subscription = subscribe(source, path.clone(), watermark, settings, cancel.clone());
    tracing::info!(path = %path, watermark, "Live sync started");

    let mut received = 0usize;
    let mut requeued = 0usize;
    let mut counts = OutcomeCounts::default();
    let mut deferred: VecDeque<RawEvent> = VecDeque::new();
    let mut redelivery = tokio::time::interval_at(
        Instant::now() + config.poll_interval,
        config.poll_interval,
    );
    redelivery.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = subscription.recv() => match event {
                Some(event) => {
                    received += 1;
                    event
                }
                None => break,
            },
            _ = redelivery.tick(), if !deferred.is_empty() => match deferred.pop_front() {
                Some(event) => event,
                None => continue,
            },
        };

        let result = reconciler
            .reconcile_with_retry(&event, &config.retry, &cancel)
            .await;
        match &result {
            Err(e) if e.is_retryable() && !cancel.is_cancelled() => {
                requeued += 1;
                tracing::warn!(
                    event_id = ?event.id,
                    error = %e,
                    deferred = deferred.len() + 1,
                    "Detection event deferred for another attempt",
                );
                deferred.push_back(event);
                if deferred.len() > MAX_DEFERRED {
                    if let Some(dropped) = deferred.pop_front() {
                        counts.failed += 1;
                        tracing::error!(event_id = ?dropped.id, "Deferred queue full, dropping detection event");
                    }
                }
            }
            _ => counts.record(&event, &result),
        }
    }

    if !deferred.is_empty() {
        counts.failed += deferred.len();
        tracing::error!(
            path = %path,
            undelivered = deferred.len(),
            "Live sync stopped with deferred events still unreconciled",
        );
    }

    let summary = LiveSyncSummary {
        received,
        recorded: counts.recorded,
        duplicates: counts.duplicates,
        rejected: counts.rejected,
        requeued,
        failed: counts.failed,
    };
    tracing::info!(
        path = %path,
        received = summary.received,
        recorded = summary.recorded,
        duplicates = summary.duplicates,
        requeued = summary.requeued,
        failed = summary.failed,
        "Live sync stopped",
    );

    subscription.finish().await?;
    Ok(summary)
}

/// Spawn [`run_live_sync`] as a background task.
pub fn start_live_sync(
    reconciler: Arc<Reconciler>,
    source: Arc<dyn EventSource>,
    path: String,
    watermark: i64,
    config: SyncConfig,
    cancel: CancellationToken,
) -> JoinHandle<Result<LiveSyncSummary, SyncError>> {
    tokio::spawn(run_live_sync(
        reconciler, source, path, watermark, config, cancel,
    ))
}
