//! Handlers for the cached daily reports.
//!
//! Every report is scoped to the caller's organization and one UTC day.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use manta_core::reporting::{parse_report_date, DailySummary, Heatmap, PersonStats};

use crate::error::AppResult;
use crate::middleware::auth::ApiKeyAuth;
use crate::query::ReportDateParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn report_date(params: &ReportDateParams) -> AppResult<NaiveDate> {
    Ok(parse_report_date(
        params.date.as_deref(),
        Utc::now().date_naive(),
    )?)
}

/// GET /api/v1/summary
pub async fn daily_summary(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Query(params): Query<ReportDateParams>,
) -> AppResult<Json<DataResponse<DailySummary>>> {
    let date = report_date(&params)?;
    let data = state
        .reporting
        .daily_summary(auth.organization_id, date)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/heatmap
pub async fn heatmap(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Query(params): Query<ReportDateParams>,
) -> AppResult<Json<DataResponse<Heatmap>>> {
    let date = report_date(&params)?;
    let data = state.reporting.heatmap(auth.organization_id, date).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/person-stats
pub async fn person_stats(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Query(params): Query<ReportDateParams>,
) -> AppResult<Json<DataResponse<PersonStats>>> {
    let date = report_date(&params)?;
    let data = state
        .reporting
        .person_stats(auth.organization_id, date)
        .await?;
    Ok(Json(DataResponse { data }))
}
