use axum::extract::{Query, State};
use axum::Json;
use manta_core::error::CoreError;
use manta_core::pagination::PageRequest;
use manta_db::models::detection_log::{DetectionLog, LogFilter};
use manta_db::repositories::DetectionLogRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ApiKeyAuth;
use crate::query::LogSearchParams;
use crate::response::PaginatedResponse;
use crate::state::AppState;

/// GET /api/v1/logs
///
/// Detection logs of the caller's organization, newest first.
pub async fn search(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Query(params): Query<LogSearchParams>,
) -> AppResult<Json<PaginatedResponse<DetectionLog>>> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if from >= to {
            return Err(AppError::Core(CoreError::Validation(
                "'from' must be earlier than 'to'".into(),
            )));
        }
    }

    let filter = LogFilter {
        from: params.from,
        to: params.to,
        camera_id: non_empty(params.camera_id),
        person_hash: non_empty(params.person_hash),
    };
    let page = PageRequest::new(params.page, params.page_size);

    let total = DetectionLogRepo::count(&state.pool, auth.organization_id, &filter).await?;
    let data = DetectionLogRepo::search(&state.pool, auth.organization_id, &filter, &page).await?;

    Ok(Json(PaginatedResponse {
        data,
        pagination: page.paginate(total),
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
