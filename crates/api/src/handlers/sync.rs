//! On-demand event ingestion for administrators.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use manta_core::event::RawEvent;
use manta_ingest::{run_backfill, BackfillReport, ReconcileOutcome};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Upper bound on records pulled by one on-demand backfill.
pub const MAX_BACKFILL_LIMIT: usize = 10_000;

#[derive(Debug, Default, Deserialize)]
pub struct BackfillRequest {
    pub limit: Option<usize>,
}

/// POST /api/v1/sync/events
///
/// Reconcile one event. `201` when it was recorded, `200` for a duplicate.
pub async fn reconcile_event(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(event): Json<RawEvent>,
) -> AppResult<(StatusCode, Json<DataResponse<ReconcileOutcome>>)> {
    let outcome = state
        .reconciler
        .reconcile_with_retry(&event, &state.sync_config.retry, &CancellationToken::new())
        .await?;

    let status = match outcome {
        ReconcileOutcome::Recorded {
            organization_id, ..
        } => {
            if let Some(at) = DateTime::from_timestamp(event.timestamp, 0) {
                state
                    .reporting
                    .invalidate(organization_id, at.date_naive())
                    .await;
            }
            StatusCode::CREATED
        }
        ReconcileOutcome::Duplicate => StatusCode::OK,
    };

    tracing::debug!(api_key_id = admin.api_key_id, ?outcome, "Event submitted over HTTP");
    Ok((status, Json(DataResponse { data: outcome })))
}

/// POST /api/v1/sync/backfill
///
/// Pull recent records from the configured feed. The body is optional;
/// `limit` defaults to the configured backfill size.
pub async fn backfill(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    input: Option<Json<BackfillRequest>>,
) -> AppResult<Json<DataResponse<BackfillReport>>> {
    let source = state
        .event_source
        .clone()
        .ok_or_else(|| AppError::BadRequest("Event sync is not configured".into()))?;

    let input = input.map(|Json(i)| i).unwrap_or_default();
    let limit = input
        .limit
        .unwrap_or(state.sync_config.backfill_limit)
        .clamp(1, MAX_BACKFILL_LIMIT);

    tracing::info!(api_key_id = admin.api_key_id, limit, "On-demand backfill requested");

    let report = run_backfill(
        &state.reconciler,
        source.as_ref(),
        &state.sync_config.logs_path,
        limit,
        &state.sync_config.retry,
        &CancellationToken::new(),
    )
    .await?;

    Ok(Json(DataResponse { data: report }))
}
