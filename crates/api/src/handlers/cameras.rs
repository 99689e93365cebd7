//! Handlers for the `/cameras` resource, scoped to the caller's organization.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use manta_core::error::CoreError;
use manta_db::models::camera::{Camera, CreateCamera, UpdateCamera};
use manta_db::repositories::CameraRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ApiKeyAuth;
use crate::query::PaginationParams;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

fn camera_not_found(id: &str) -> AppError {
    AppError::Core(CoreError::not_found("Camera", id))
}

fn reject_blank(field: &str, value: Option<&str>) -> AppResult<()> {
    match value {
        Some(v) if v.trim().is_empty() => Err(AppError::Core(CoreError::Validation(format!(
            "{field} must not be empty"
        )))),
        _ => Ok(()),
    }
}

/// GET /api/v1/cameras
pub async fn list(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PaginatedResponse<Camera>>> {
    let page = params.page_request();
    let total = CameraRepo::count(&state.pool, auth.organization_id).await?;
    let data = CameraRepo::list(&state.pool, auth.organization_id, &page).await?;
    Ok(Json(PaginatedResponse {
        data,
        pagination: page.paginate(total),
    }))
}

/// POST /api/v1/cameras
///
/// The camera id is the one devices put in their events. A UUID is assigned
/// when the body does not carry one.
pub async fn create(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateCamera>,
) -> AppResult<(StatusCode, Json<DataResponse<Camera>>)> {
    reject_blank("name", Some(&input.name))?;
    reject_blank("status", input.status.as_deref())?;

    let id = match input.id.as_deref().map(str::trim) {
        Some("") => {
            return Err(AppError::Core(CoreError::Validation(
                "id must not be empty".into(),
            )))
        }
        Some(id) => id.to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    };

    let camera = CameraRepo::create(&state.pool, &id, auth.organization_id, &input).await?;
    tracing::info!(camera_id = %camera.id, organization_id = auth.organization_id, "Camera created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: camera })))
}

/// GET /api/v1/cameras/{id}
pub async fn get_by_id(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Camera>>> {
    let data = CameraRepo::find(&state.pool, &id, auth.organization_id)
        .await?
        .ok_or_else(|| camera_not_found(&id))?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/cameras/{id}
pub async fn update(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateCamera>,
) -> AppResult<Json<DataResponse<Camera>>> {
    reject_blank("name", input.name.as_deref())?;
    reject_blank("status", input.status.as_deref())?;

    let data = CameraRepo::update(&state.pool, &id, auth.organization_id, &input)
        .await?
        .ok_or_else(|| camera_not_found(&id))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/cameras/{id}
///
/// Refuses while detection logs or face images still reference the camera.
pub async fn delete(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    CameraRepo::find(&state.pool, &id, auth.organization_id)
        .await?
        .ok_or_else(|| camera_not_found(&id))?;

    let (logs, faces) = CameraRepo::reference_counts(&state.pool, &id).await?;
    if logs > 0 || faces > 0 {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Camera is referenced by {logs} detection logs and {faces} face images"
        ))));
    }

    if !CameraRepo::soft_delete(&state.pool, &id, auth.organization_id).await? {
        return Err(camera_not_found(&id));
    }
    Ok(StatusCode::NO_CONTENT)
}
