//! API key authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use manta_core::api_keys::{api_key_from_query, hash_api_key, API_KEY_HEADER};
use manta_core::error::CoreError;
use manta_core::types::DbId;
use manta_db::repositories::ApiKeyRepo;

use crate::error::AppError;
use crate::state::AppState;

/// Caller identified by an active API key in the `X-API-Key` header or the
/// `api_key` query parameter.
///
/// ```ignore
/// async fn my_handler(auth: ApiKeyAuth) -> AppResult<Json<()>> {
///     tracing::info!(organization_id = auth.organization_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    pub api_key_id: DbId,
    /// Organization that scopes every query made with this key.
    pub organization_id: DbId,
    /// Keys of the default organization administer the whole platform.
    pub is_admin: bool,
}

impl ApiKeyAuth {
    /// Allow access to `organization_id` if it is the caller's own or the caller is an admin.
    pub fn ensure_can_access(&self, organization_id: DbId) -> Result<(), AppError> {
        if self.is_admin || self.organization_id == organization_id {
            return Ok(());
        }
        Err(AppError::Core(CoreError::Forbidden(
            "API key does not grant access to this organization".into(),
        )))
    }
}

impl FromRequestParts<AppState> for ApiKeyAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let key = header_key
            .or_else(|| parts.uri.query().and_then(api_key_from_query))
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing API key".into()))
            })?;

        let active = ApiKeyRepo::find_active_by_hash(&state.pool, &hash_api_key(key))
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Invalid or expired API key".into()))
            })?;

        if let Err(e) = ApiKeyRepo::touch(&state.pool, active.id).await {
            tracing::warn!(error = %e, api_key_id = active.id, "Failed to record API key use");
        }

        Ok(ApiKeyAuth {
            api_key_id: active.id,
            organization_id: active.organization_id,
            is_admin: active.is_default_organization,
        })
    }
}

/// Requires an admin key. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub ApiKeyAuth);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = ApiKeyAuth::from_request_parts(parts, state).await?;
        if !auth.is_admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin API key required".into(),
            )));
        }
        Ok(RequireAdmin(auth))
    }
}
