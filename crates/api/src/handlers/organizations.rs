//! Handlers for the `/organizations` resource.
//!
//! Listing and creation need an admin key; single-organization routes accept
//! the organization's own keys as well.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use manta_core::api_keys::generate_api_key;
use manta_core::error::CoreError;
use manta_core::types::DbId;
use manta_db::models::api_key::{ApiKeyCreatedResponse, CreateApiKey};
use manta_db::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use manta_db::repositories::{ApiKeyRepo, OrganizationRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{ApiKeyAuth, RequireAdmin};
use crate::query::PaginationParams;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

/// A new organization together with its first API key.
#[derive(Debug, Serialize)]
pub struct OrganizationCreated {
    pub organization: Organization,
    pub api_key: ApiKeyCreatedResponse,
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "name must not be empty".into(),
        )));
    }
    Ok(())
}

async fn find_organization(state: &AppState, id: DbId) -> AppResult<Organization> {
    OrganizationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Organization", id)))
}

/// GET /api/v1/organizations
pub async fn list(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PaginatedResponse<Organization>>> {
    let page = params.page_request();
    let total = OrganizationRepo::count(&state.pool).await?;
    let data = OrganizationRepo::list(&state.pool, &page).await?;
    Ok(Json(PaginatedResponse {
        data,
        pagination: page.paginate(total),
    }))
}

/// POST /api/v1/organizations
///
/// The plaintext of the first API key is returned exactly once.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateOrganization>,
) -> AppResult<(StatusCode, Json<DataResponse<OrganizationCreated>>)> {
    validate_name(&input.name)?;
    let input = CreateOrganization {
        name: input.name.trim().to_string(),
        ..input
    };

    let organization = OrganizationRepo::create(&state.pool, &input).await?;

    let generated = generate_api_key();
    let key_input = CreateApiKey {
        description: Some("Initial key".into()),
        expires_at: None,
    };
    let key = ApiKeyRepo::create(
        &state.pool,
        organization.id,
        &key_input,
        &generated.hash,
        &generated.prefix,
    )
    .await?;

    tracing::info!(
        organization_id = organization.id,
        key_prefix = %generated.prefix,
        api_key_id = admin.api_key_id,
        "Organization created",
    );

    let data = OrganizationCreated {
        organization,
        api_key: ApiKeyCreatedResponse::new(key, generated.plaintext),
    };
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /api/v1/organizations/{id}
pub async fn get_by_id(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Organization>>> {
    auth.ensure_can_access(id)?;
    let data = find_organization(&state, id).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/organizations/{id}
pub async fn update(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOrganization>,
) -> AppResult<Json<DataResponse<Organization>>> {
    auth.ensure_can_access(id)?;
    if let Some(name) = &input.name {
        validate_name(name)?;
    }

    let data = OrganizationRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Organization", id)))?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/organizations/{id}
///
/// Refuses while the organization still owns cameras, logs or face images.
pub async fn delete(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    auth.ensure_can_access(id)?;
    let organization = find_organization(&state, id).await?;

    if organization.is_default {
        return Err(AppError::Core(CoreError::Conflict(
            "The default organization cannot be deleted".into(),
        )));
    }

    let dependents = OrganizationRepo::dependents(&state.pool, id).await?;
    if !dependents.is_empty() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Organization still has {} cameras, {} detection logs and {} face images",
            dependents.cameras, dependents.detection_logs, dependents.face_images
        ))));
    }

    if !OrganizationRepo::soft_delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::not_found("Organization", id)));
    }

    tracing::info!(organization_id = id, api_key_id = auth.api_key_id, "Organization deleted");
    Ok(StatusCode::NO_CONTENT)
}
