//! Event source seam and the polling subscription built on top of it.
//!
//! An [`EventSource`] only knows how to fetch records; [`subscribe`] turns
//! that into a push-style channel by polling on a fixed interval from a
//! timestamp watermark.
//!
//! Watermark rules:
//! - polls ask for records with `timestamp >= watermark` (inclusive)
//! - records at exactly the watermark that were already emitted are skipped
//! - the watermark only moves after a successful fetch
//! - malformed records advance it only when their own timestamp was readable

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use manta_core::event::RawEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;

/// Buffered events between the poller and its consumer.
const SUBSCRIPTION_CHANNEL_CAPACITY: usize = 256;

/// One record as delivered by the feed, parsed at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRecord {
    Event(RawEvent),
    /// A record that failed to parse. Kept so the poller can still move its
    /// watermark past it.
    Malformed {
        key: String,
        timestamp: Option<i64>,
        reason: String,
    },
}

impl FeedRecord {
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Self::Event(event) => Some(event.timestamp),
            Self::Malformed { timestamp, .. } => *timestamp,
        }
    }

    /// Identity used to suppress re-emission at the watermark boundary.
    pub fn identity(&self) -> String {
        match self {
            Self::Event(event) => match &event.id {
                Some(id) => id.clone(),
                None => format!(
                    "{}|{}|{}",
                    event.person_hash, event.camera_id, event.timestamp
                ),
            },
            Self::Malformed { key, .. } => key.clone(),
        }
    }
}

/// A feed of detection events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// The newest `limit` records under `path`, oldest first.
    async fn recent(&self, path: &str, limit: usize) -> Result<Vec<FeedRecord>, SourceError>;

    /// Every record under `path` with `timestamp >= watermark`.
    async fn fetch_since(&self, path: &str, watermark: i64)
        -> Result<Vec<FeedRecord>, SourceError>;
}

/// Polling parameters for [`subscribe`].
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub fetch_timeout: Duration,
}

/// A live subscription: a channel of events plus the poller feeding it.
///
/// The channel closes when the poller stops, either on cancellation or on a
/// fatal source error. [`Subscription::finish`] reports which.
pub struct Subscription {
    events: mpsc::Receiver<RawEvent>,
    handle: JoinHandle<Result<(), SourceError>>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Next event, or `None` once the poller has stopped.
    pub async fn recv(&mut self) -> Option<RawEvent> {
        self.events.recv().await
    }

    /// Stop the poller and wait for it, returning its fatal error if any.
    pub async fn finish(self) -> Result<(), SourceError> {
        self.cancel.cancel();
        drop(self.events);
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Event source poller task failed");
                Ok(())
            }
        }
    }
}

/// Start polling `source` for records under `path` from `watermark`.
///
/// The poller stops when `cancel` fires, when the subscription is finished,
/// or on a fatal source error.
pub fn subscribe(
    source: Arc<dyn EventSource>,
    path: String,
    watermark: i64,
    settings: PollSettings,
    cancel: CancellationToken,
) -> Subscription {
    let (tx, events) = mpsc::channel(SUBSCRIPTION_CHANNEL_CAPACITY);
    let cancel = cancel.child_token();
    let handle = tokio::spawn(poll_loop(
        source,
        path,
        watermark,
        settings,
        tx,
        cancel.clone(),
    ));

    Subscription {
        events,
        handle,
        cancel,
    }
}

async fn poll_loop(
    source: Arc<dyn EventSource>,
    path: String,
    watermark: i64,
    settings: PollSettings,
    tx: mpsc::Sender<RawEvent>,
    cancel: CancellationToken,
) -> Result<(), SourceError> {
    let mut state = WatermarkState::new(watermark);
    let mut interval = tokio::time::interval(settings.interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(path = %path, watermark, "Event source poller started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            result = tokio::time::timeout(
                settings.fetch_timeout,
                source.fetch_since(&path, state.watermark),
            ) => result,
        };

        let records = match fetched {
            Ok(Ok(records)) => records,
            Ok(Err(e)) if e.is_fatal() => {
                tracing::error!(path = %path, error = %e, "Event source subscription failed");
                return Err(e);
            }
            Ok(Err(e)) => {
                tracing::warn!(path = %path, error = %e, "Event source poll failed");
                continue;
            }
            Err(_) => {
                tracing::warn!(
                    path = %path,
                    timeout_secs = settings.fetch_timeout.as_secs(),
                    "Event source poll timed out",
                );
                continue;
            }
        };

        for event in state.accept(records) {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                sent = tx.send(event) => {
                    if sent.is_err() {
                        tracing::debug!(path = %path, "Subscription receiver dropped");
                        return Ok(());
                    }
                }
            }
        }
    }

    tracing::info!(path = %path, watermark = state.watermark, "Event source poller stopped");
    Ok(())
}

/// Watermark plus the identities already emitted at exactly that timestamp.
#[derive(Debug)]
pub(crate) struct WatermarkState {
    pub(crate) watermark: i64,
    seen_at_watermark: HashSet<String>,
}

impl WatermarkState {
    pub(crate) fn new(watermark: i64) -> Self {
        Self {
            watermark,
            seen_at_watermark: HashSet::new(),
        }
    }

    /// Filter one successful fetch down to the events not yet emitted, in
    /// timestamp order, and advance the watermark.
    ///
    /// The watermark moves on emission, not on reconciliation. Redelivery of
    /// an event that fails downstream is the consumer's job.
    pub(crate) fn accept(&mut self, mut records: Vec<FeedRecord>) -> Vec<RawEvent> {
        records.sort_by_key(|r| r.timestamp().unwrap_or(i64::MIN));
        let mut emitted = Vec::new();

        for record in records {
            let Some(ts) = record.timestamp() else {
                if let FeedRecord::Malformed { key, reason, .. } = &record {
                    tracing::warn!(key = %key, reason = %reason, "Skipping feed record without timestamp");
                }
                continue;
            };
            if ts < self.watermark {
                continue;
            }

            let identity = record.identity();
            if ts == self.watermark && !self.seen_at_watermark.insert(identity) {
                continue;
            }
            if ts > self.watermark {
                self.watermark = ts;
                self.seen_at_watermark.clear();
                self.seen_at_watermark.insert(record.identity());
            }

            match record {
                FeedRecord::Event(event) => emitted.push(event),
                FeedRecord::Malformed { key, reason, .. } => {
                    tracing::warn!(key = %key, timestamp = ts, reason = %reason, "Skipping malformed feed record");
                }
            }
        }

        emitted
    }
}
