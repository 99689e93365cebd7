//! Turns one raw detection event into durable, deduplicated, classified state.
//!
//! Per event, in one transaction:
//! 1. validate the event
//! 2. resolve the organization from the camera, falling back to the default
//! 3. insert the detection log unless its dedup key exists, fixing
//!    `is_new_person` from earlier history in the same statement
//! 4. create the person or record one more visit
//!
//! Steps 3 and 4 commit together or not at all.

use std::time::Duration;

use manta_core::event::RawEvent;
use manta_core::types::{DbId, Timestamp};
use manta_db::models::detection_log::NewDetectionLog;
use manta_db::repositories::{CameraRepo, DetectionLogRepo, PersonRepo};
use manta_db::DbPool;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::SyncError;
use crate::retry::{with_retry, RetryPolicy};

/// Result of reconciling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Recorded {
        log_id: DbId,
        organization_id: DbId,
        is_new_person: bool,
        person_created: bool,
    },
    /// The event was already stored. Nothing was written.
    Duplicate,
}

pub struct Reconciler {
    pool: DbPool,
    default_organization_id: DbId,
    store_timeout: Duration,
}

impl Reconciler {
    pub fn new(pool: DbPool, default_organization_id: DbId, store_timeout: Duration) -> Self {
        Self {
            pool,
            default_organization_id,
            store_timeout,
        }
    }

    pub fn default_organization_id(&self) -> DbId {
        self.default_organization_id
    }

    /// Reconcile one event. Safe to call again with the same event.
    pub async fn reconcile(&self, event: &RawEvent) -> Result<ReconcileOutcome, SyncError> {
        event.validate()?;
        let detected_at = event.detected_at()?;

        tokio::time::timeout(self.store_timeout, self.reconcile_in_tx(event, detected_at))
            .await
            .map_err(|_| SyncError::Timeout(self.store_timeout))?
    }

    /// [`reconcile`](Self::reconcile) with bounded retries of retryable errors.
    pub async fn reconcile_with_retry(
        &self,
        event: &RawEvent,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome, SyncError> {
        with_retry(policy, cancel, || self.reconcile(event)).await
    }

    async fn reconcile_in_tx(
        &self,
        event: &RawEvent,
        detected_at: Timestamp,
    ) -> Result<ReconcileOutcome, SyncError> {
        let mut tx = self.pool.begin().await?;

        let camera_org = CameraRepo::organization_of(&mut *tx, &event.camera_id).await?;
        let organization_id = camera_org.unwrap_or(self.default_organization_id);

        let log = NewDetectionLog {
            external_id: event.id.as_deref(),
            detected_at,
            person_hash: &event.person_hash,
            camera_id: &event.camera_id,
            organization_id,
        };
        let Some(inserted) = DetectionLogRepo::insert_dedup(&mut *tx, &log).await? else {
            tracing::debug!(
                person_hash = %event.person_hash,
                camera_id = %event.camera_id,
                timestamp = event.timestamp,
                "Duplicate detection event skipped",
            );
            return Ok(ReconcileOutcome::Duplicate);
        };

        let (_, person_created) =
            PersonRepo::create_if_absent(&mut *tx, &event.person_hash, organization_id, detected_at)
                .await?;
        if !person_created {
            PersonRepo::record_visit(&mut *tx, &event.person_hash, organization_id, detected_at)
                .await?
                .ok_or_else(|| SyncError::NotFound {
                    entity: "Person",
                    id: event.person_hash.clone(),
                })?;
        }

        tx.commit().await?;

        if camera_org.is_none() {
            tracing::warn!(
                camera_id = %event.camera_id,
                organization_id,
                "Unknown camera, event recorded under the default organization",
            );
        }
        tracing::info!(
            log_id = inserted.id,
            organization_id,
            person_hash = %event.person_hash,
            is_new_person = inserted.is_new_person,
            person_created,
            "Detection event reconciled",
        );

        Ok(ReconcileOutcome::Recorded {
            log_id: inserted.id,
            organization_id,
            is_new_person: inserted.is_new_person,
            person_created,
        })
    }
}

/// Per-outcome counters shared by the sync drivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub recorded: usize,
    pub duplicates: usize,
    /// Events rejected as invalid. Never retried.
    pub rejected: usize,
    /// Events that still failed after retries.
    pub failed: usize,
}

impl OutcomeCounts {
    /// Count one reconcile result, logging failures.
    pub fn record(&mut self, event: &RawEvent, result: &Result<ReconcileOutcome, SyncError>) {
        match result {
            Ok(ReconcileOutcome::Recorded { .. }) => self.recorded += 1,
            Ok(ReconcileOutcome::Duplicate) => self.duplicates += 1,
            Err(e @ SyncError::Validation(_)) => {
                self.rejected += 1;
                tracing::warn!(event_id = ?event.id, error = %e, "Detection event rejected");
            }
            Err(e) => {
                self.failed += 1;
                tracing::error!(event_id = ?event.id, error = %e, "Failed to reconcile detection event");
            }
        }
    }
}
