//! Handlers for API key management.
//!
//! Keys are managed per organization: a caller sees and issues keys of its
//! own organization only. The plaintext key is returned **only** on creation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use manta_core::api_keys::generate_api_key;
use manta_core::error::CoreError;
use manta_core::types::DbId;
use manta_db::models::api_key::{ApiKey, ApiKeyCreatedResponse, CreateApiKey};
use manta_db::repositories::ApiKeyRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ApiKeyAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/api-keys
///
/// Shows prefixes only, never the full key.
pub async fn list(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ApiKey>>>> {
    let data = ApiKeyRepo::list(&state.pool, auth.organization_id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/api-keys
pub async fn create(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    input: Option<Json<CreateApiKey>>,
) -> AppResult<(StatusCode, Json<DataResponse<ApiKeyCreatedResponse>>)> {
    let input = input.map(|Json(i)| i).unwrap_or_default();
    if input.expires_at.is_some_and(|at| at <= Utc::now()) {
        return Err(AppError::Core(CoreError::Validation(
            "expires_at must be in the future".into(),
        )));
    }

    let generated = generate_api_key();
    let key = ApiKeyRepo::create(
        &state.pool,
        auth.organization_id,
        &input,
        &generated.hash,
        &generated.prefix,
    )
    .await?;

    tracing::info!(
        api_key_id = key.id,
        key_prefix = %generated.prefix,
        organization_id = auth.organization_id,
        issued_by = auth.api_key_id,
        "API key created",
    );

    let data = ApiKeyCreatedResponse::new(key, generated.plaintext);
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// DELETE /api/v1/api-keys/{id}
///
/// Revokes the key. A caller may revoke the key it is using.
pub async fn revoke(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ApiKeyRepo::revoke(&state.pool, id, auth.organization_id).await? {
        return Err(AppError::Core(CoreError::not_found("ApiKey", id)));
    }
    tracing::info!(api_key_id = id, revoked_by = auth.api_key_id, "API key revoked");
    Ok(StatusCode::NO_CONTENT)
}
