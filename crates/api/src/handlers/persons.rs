//! Handlers for the `/persons` resource.
//!
//! Persons are created by event reconciliation only; the API reads and
//! deletes them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use manta_core::error::CoreError;
use manta_db::models::person::{Person, PersonVisitStats};
use manta_db::repositories::PersonRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ApiKeyAuth;
use crate::query::PaginationParams;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

fn person_not_found(person_hash: &str) -> AppError {
    AppError::Core(CoreError::not_found("Person", person_hash))
}

/// GET /api/v1/persons
pub async fn list(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PaginatedResponse<Person>>> {
    let page = params.page_request();
    let total = PersonRepo::count(&state.pool, auth.organization_id).await?;
    let data = PersonRepo::list(&state.pool, auth.organization_id, &page).await?;
    Ok(Json(PaginatedResponse {
        data,
        pagination: page.paginate(total),
    }))
}

/// GET /api/v1/persons/{person_hash}
pub async fn get_by_hash(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(person_hash): Path<String>,
) -> AppResult<Json<DataResponse<Person>>> {
    let data = PersonRepo::find(&state.pool, &person_hash, auth.organization_id)
        .await?
        .ok_or_else(|| person_not_found(&person_hash))?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/persons/{person_hash}/stats
pub async fn stats(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(person_hash): Path<String>,
) -> AppResult<Json<DataResponse<PersonVisitStats>>> {
    let data = PersonRepo::visit_stats(&state.pool, &person_hash, auth.organization_id)
        .await?
        .ok_or_else(|| person_not_found(&person_hash))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/persons/{person_hash}
///
/// Soft-deletes the person with its detection logs and face image rows.
pub async fn delete(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(person_hash): Path<String>,
) -> AppResult<StatusCode> {
    if !PersonRepo::soft_delete_cascade(&state.pool, &person_hash, auth.organization_id).await? {
        return Err(person_not_found(&person_hash));
    }
    tracing::info!(
        person_hash = %person_hash,
        organization_id = auth.organization_id,
        "Person deleted",
    );
    Ok(StatusCode::NO_CONTENT)
}
